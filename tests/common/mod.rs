//! Shared doubles for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use materials_access::backend::{
    AuditLog, DataStore, MatchCriteria, RemoteError, RemoteResult, SecureFetch,
};
use materials_access::resilience::{ResilientExecutor, RetryClassifier};
use materials_access::security::RateLimiter;
use materials_access::storage::{KeyValueStore, MemoryStore, StoreError, StoreResult};

/// In-memory stand-in for the hosted store.
///
/// Every call is appended to `events` so tests can assert on ordering.
/// Scripted failures are consumed one per data call, before the call
/// succeeds.
#[derive(Default)]
pub struct FakeBackend {
    events: Mutex<Vec<String>>,
    secure_rows: Mutex<HashMap<String, Value>>,
    failures: Mutex<VecDeque<RemoteError>>,
    audit_fails: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Row returned by the secure fetch for `record_id`.
    pub fn with_secure_row(self: Arc<Self>, record_id: &str, row: Value) -> Arc<Self> {
        self.secure_rows.lock().unwrap().insert(record_id.to_string(), row);
        self
    }

    pub fn fail_next(&self, error: RemoteError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn set_audit_fails(&self, fails: bool) {
        self.audit_fails.store(fails, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, event: String) -> RemoteResult<()> {
        self.events.lock().unwrap().push(event);
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for FakeBackend {
    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value> {
        self.record(format!("insert:{table}"))?;
        Ok(json!([row]))
    }

    async fn update(&self, table: &str, patch: Value, _criteria: &MatchCriteria) -> RemoteResult<Value> {
        self.record(format!("update:{table}"))?;
        Ok(json!([patch]))
    }

    async fn select(&self, table: &str, projection: &str) -> RemoteResult<Value> {
        self.record(format!("select:{table}:{projection}"))?;
        Ok(json!([{ "id": 1 }]))
    }

    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value> {
        self.record(format!("rpc:{function}"))?;
        Ok(args)
    }
}

#[async_trait]
impl AuditLog for FakeBackend {
    async fn log_access(&self, record_id: &str, access_type: &str) -> RemoteResult<()> {
        self.events.lock().unwrap().push(format!("audit:{record_id}:{access_type}"));
        if self.audit_fails.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("audit endpoint unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureFetch for FakeBackend {
    async fn fetch_secure(&self, rpc: &str, record_id: &str) -> RemoteResult<Option<Map<String, Value>>> {
        self.record(format!("fetch:{rpc}:{record_id}"))?;
        Ok(self
            .secure_rows
            .lock()
            .unwrap()
            .get(record_id)
            .and_then(|row| row.as_object().cloned()))
    }
}

/// A counter store that is never reachable.
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("disk detached".into()))
    }

    async fn set(&self, _key: &str, _value: String) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk detached".into()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk detached".into()))
    }
}

/// Executor over a fresh in-memory store.
pub fn memory_executor() -> Arc<ResilientExecutor> {
    let limiter = Arc::new(RateLimiter::new(Arc::new(MemoryStore::new())));
    Arc::new(ResilientExecutor::new(limiter, RetryClassifier::default()))
}

/// Start a programmable HTTP backend returning `(status, json body)` per
/// request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                        let request_line = request.lines().next().unwrap_or_default().to_string();

                        let (status, body) = f(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            403 => "403 Forbidden",
                            406 => "406 Not Acceptable",
                            409 => "409 Conflict",
                            503 => "503 Service Unavailable",
                            _ => "500 Internal Server Error",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
