//! REST implementation of the backend contracts.
//!
//! # Responsibilities
//! - Map table operations to `GET/POST/PATCH {base}/rest/v1/{table}`
//! - Map RPCs to `POST {base}/rest/v1/rpc/{function}`
//! - Decode `{code, message}` error bodies into `RemoteError`
//!
//! Transport failures (refused connections, timeouts) become code-less
//! errors and are therefore retryable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::{json, Map, Value};
use url::Url;

use crate::backend::contracts::{first_row, AuditLog, DataStore, SecureFetch};
use crate::backend::types::{MatchCriteria, RemoteError, RemoteResult};
use crate::config::schema::BackendConfig;

/// HTTP client for a PostgREST-style endpoint.
#[derive(Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base: Url,
    api_key: String,
    audit_rpc: String,
}

impl RestBackend {
    /// Build a client from configuration.
    pub fn new(config: &BackendConfig) -> RemoteResult<Self> {
        let mut base = Url::parse(&config.base_url).map_err(|e| {
            RemoteError::transport(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        Ok(Self {
            http,
            base,
            api_key: config.api_key.clone(),
            audit_rpc: config.audit_rpc.clone(),
        })
    }

    fn endpoint(&self, prefix: &str, name: &str) -> RemoteResult<Url> {
        self.base
            .join(prefix)
            .and_then(|u| u.join(name))
            .map_err(|e| RemoteError::transport(format!("Invalid endpoint '{name}': {e}")))
    }

    fn table_url(&self, table: &str) -> RemoteResult<Url> {
        self.endpoint("rest/v1/", table)
    }

    fn rpc_url(&self, function: &str) -> RemoteResult<Url> {
        self.endpoint("rest/v1/rpc/", function)
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Value> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))?;

        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&body)
                .map_err(|e| RemoteError::transport(format!("Invalid response body: {e}")));
        }

        match serde_json::from_slice::<RemoteError>(&body) {
            Ok(err) if err.code.is_some() => Err(err),
            _ => Err(RemoteError::with_code(
                status.as_u16().to_string(),
                String::from_utf8_lossy(&body).into_owned(),
            )),
        }
    }
}

#[async_trait]
impl DataStore for RestBackend {
    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value> {
        let url = self.table_url(table)?;
        self.send(
            self.http
                .post(url)
                .header("Prefer", "return=representation")
                .json(&row),
        )
        .await
    }

    async fn update(&self, table: &str, patch: Value, criteria: &MatchCriteria) -> RemoteResult<Value> {
        let mut url = self.table_url(table)?;
        {
            let mut query = url.query_pairs_mut();
            for (column, value) in criteria.filters() {
                query.append_pair(column, &format!("eq.{value}"));
            }
        }
        self.send(
            self.http
                .patch(url)
                .header("Prefer", "return=representation")
                .json(&patch),
        )
        .await
    }

    async fn select(&self, table: &str, projection: &str) -> RemoteResult<Value> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", projection);
        self.send(self.http.get(url)).await
    }

    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value> {
        let url = self.rpc_url(function)?;
        self.send(self.http.post(url).json(&args)).await
    }
}

#[async_trait]
impl AuditLog for RestBackend {
    async fn log_access(&self, record_id: &str, access_type: &str) -> RemoteResult<()> {
        self.rpc(
            &self.audit_rpc,
            json!({ "record_id": record_id, "access_type": access_type }),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl SecureFetch for RestBackend {
    async fn fetch_secure(&self, rpc: &str, record_id: &str) -> RemoteResult<Option<Map<String, Value>>> {
        let value = self.rpc(rpc, json!({ "record_id": record_id })).await?;
        first_row(value)
    }
}
