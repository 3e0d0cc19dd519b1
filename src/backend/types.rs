//! Wire-level types shared by every backend contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An error returned by the remote data store.
///
/// `code` mirrors the store's own code (`PGRST116`, `23505`, ...) and is
/// absent for transport failures such as timeouts or refused connections.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}", describe(.code, .message))]
pub struct RemoteError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

fn describe(code: &Option<String>, message: &str) -> String {
    match code {
        Some(code) => format!("[{code}] {message}"),
        None => message.to_string(),
    }
}

impl RemoteError {
    /// Error carrying a store code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Code-less failure (network, timeout, decoding).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Result type for raw backend calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Equality filter for updates, rendered as `column=eq.value`.
///
/// Always holds at least one filter, so an update can never match every
/// row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCriteria(Vec<(String, String)>);

impl MatchCriteria {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![(column.into(), value.into())])
    }

    pub fn and_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((column.into(), value.into()));
        self
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.0
    }
}
