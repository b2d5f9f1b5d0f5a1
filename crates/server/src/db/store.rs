use std::sync::Arc;

use async_trait::async_trait;
use medibridge_core::{AccessError, Identifier, NewDocument, ResourceId, ResourceKind};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Store handle shared by every request
pub type SharedStore = Arc<dyn DocumentStore>;

/// Failures reported by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The insert collided with the `(system, value)` uniqueness constraint
    #[error("identifier already exists")]
    DuplicateIdentifier,

    /// Connection, timeout or any other infrastructure failure
    #[error("{0}")]
    Unavailable(String),
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Unavailable(format!("Database pool error: {}", err))
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Display on a server-side error is just "db error"
        let detail = match err.as_db_error() {
            Some(db) => format!("{} {}: {}", db.severity(), db.code().code(), db.message()),
            None => match std::error::Error::source(&err) {
                Some(source) => format!("{}: {}", err, source),
                None => err.to_string(),
            },
        };
        StoreError::Unavailable(format!("Database error: {}", detail))
    }
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentifier => AccessError::DuplicateIdentifier,
            StoreError::Unavailable(msg) => AccessError::StoreUnavailable(msg),
        }
    }
}

/// Per-resource-kind document collections.
///
/// Implementations must be safe to share between concurrent requests and
/// must enforce `(system, value)` uniqueness per kind atomically in
/// [`DocumentStore::insert`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Point read by primary key
    async fn find_by_id(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<JsonValue>, StoreError>;

    /// Documents whose `identifier` array contains the pair, at most `limit` of them
    async fn find_by_identifier(
        &self,
        kind: ResourceKind,
        identifier: &Identifier,
        limit: usize,
    ) -> Result<Vec<JsonValue>, StoreError>;

    /// Insert a new document together with its identifier pairs
    async fn insert(&self, document: &NewDocument) -> Result<(), StoreError>;
}
