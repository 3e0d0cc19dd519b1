//! Narrow contracts consumed from the remote data store.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::backend::types::{MatchCriteria, RemoteError, RemoteResult};

/// Table-level persistence operations.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn insert(&self, table: &str, row: Value) -> RemoteResult<Value>;

    async fn update(&self, table: &str, patch: Value, criteria: &MatchCriteria) -> RemoteResult<Value>;

    async fn select(&self, table: &str, projection: &str) -> RemoteResult<Value>;

    /// Invoke a stored procedure.
    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value>;
}

/// Audit trail for sensitive views.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn log_access(&self, record_id: &str, access_type: &str) -> RemoteResult<()>;
}

/// Unmasked row lookup, authorized by the backend.
#[async_trait]
pub trait SecureFetch: Send + Sync {
    /// `Ok(None)` means the backend refused: zero rows.
    async fn fetch_secure(&self, rpc: &str, record_id: &str) -> RemoteResult<Option<Map<String, Value>>>;
}

/// Reduce an RPC result to at most one row.
pub fn first_row(value: Value) -> RemoteResult<Option<Map<String, Value>>> {
    match value {
        Value::Null => Ok(None),
        Value::Object(row) => Ok(Some(row)),
        Value::Array(rows) => match rows.into_iter().next() {
            None => Ok(None),
            Some(Value::Object(row)) => Ok(Some(row)),
            Some(other) => Err(RemoteError::transport(format!("unexpected row shape: {other}"))),
        },
        other => Err(RemoteError::transport(format!("unexpected rpc result: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_row() {
        assert!(first_row(json!([])).unwrap().is_none());
        assert!(first_row(Value::Null).unwrap().is_none());

        let row = first_row(json!([{"id": 1}, {"id": 2}])).unwrap().unwrap();
        assert_eq!(row["id"], 1);

        let row = first_row(json!({"id": 3})).unwrap().unwrap();
        assert_eq!(row["id"], 3);

        assert!(first_row(json!("text")).is_err());
        assert!(first_row(json!([5])).is_err());
    }
}
