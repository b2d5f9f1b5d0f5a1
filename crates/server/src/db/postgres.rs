//! PostgreSQL document store.
//!
//! Each resource kind gets a JSONB document table and a side table holding
//! one row per identifier pair. The side table's primary key on
//! `(system, value)` is what rejects duplicate identifiers; inserts write the
//! document and its pairs in one transaction.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{
    Config, CreatePoolError, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use medibridge_core::{Identifier, NewDocument, ResourceId, ResourceKind};
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;

use super::store::{DocumentStore, StoreError};

/// Advisory lock key serialising schema provisioning across processes
const PROVISION_LOCK_KEY: i64 = 0x6d65_6469_6272_6964;

/// Connection settings for the document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub connect_timeout: Duration,
    /// Applied server-side as `statement_timeout`
    pub read_timeout: Duration,
    pub max_connections: usize,
}

/// Owns the connection pool and provisions the schema on first use
pub struct ConnectionManager {
    pool: Pool,
    ready: OnceCell<()>,
}

impl ConnectionManager {
    /// Build the pool. No connection is opened until the first operation.
    pub fn new(config: &StoreConfig) -> Result<Self, CreatePoolError> {
        Ok(Self {
            pool: create_pool(config)?,
            ready: OnceCell::new(),
        })
    }

    /// Pool handle, after the one-time liveness probe and provisioning.
    ///
    /// A failed initialisation is not cached; the next call tries again.
    async fn pool(&self) -> Result<&Pool, StoreError> {
        self.ready
            .get_or_try_init(|| async {
                let mut client = self.pool.get().await?;
                client.query_one("SELECT 1", &[]).await?;
                provision(&mut client).await?;
                tracing::info!("Document store connected and provisioned");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(&self.pool)
    }

    /// Collection handle for one resource kind
    pub async fn collection(&self, kind: ResourceKind) -> Result<Collection<'_>, StoreError> {
        Ok(Collection {
            pool: self.pool().await?,
            kind,
        })
    }
}

fn create_pool(config: &StoreConfig) -> Result<Pool, CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(config.database_url.clone());
    cfg.connect_timeout = Some(config.connect_timeout);
    cfg.options = Some(format!(
        "-c statement_timeout={}",
        config.read_timeout.as_millis()
    ));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool = PoolConfig::new(config.max_connections);
    pool.timeouts = Timeouts {
        wait: Some(config.connect_timeout),
        create: Some(config.connect_timeout),
        recycle: Some(config.connect_timeout),
    };
    cfg.pool = Some(pool);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}

fn schema_sql(kind: ResourceKind) -> String {
    let table = kind.collection();
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id UUID PRIMARY KEY,
            data JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE TABLE IF NOT EXISTS {table}_identifier (
            system TEXT NOT NULL,
            value TEXT NOT NULL,
            resource_id UUID NOT NULL REFERENCES {table} (id),
            CONSTRAINT {table}_identifier_unique PRIMARY KEY (system, value)
        );
        CREATE INDEX IF NOT EXISTS {table}_identifier_gin
            ON {table} USING GIN ((data -> 'identifier') jsonb_path_ops);"
    )
}

/// Create tables and indexes for every kind. Safe to run repeatedly and concurrently.
async fn provision(client: &mut deadpool_postgres::Client) -> Result<(), tokio_postgres::Error> {
    let tx = client.transaction().await?;
    tx.execute("SELECT pg_advisory_xact_lock($1)", &[&PROVISION_LOCK_KEY])
        .await?;
    for kind in ResourceKind::ALL {
        tx.batch_execute(&schema_sql(kind)).await?;
        tracing::debug!(collection = kind.collection(), "Collection provisioned");
    }
    tx.commit().await
}

/// Identifier pairs sorted by `(system, value)`.
///
/// Every insert takes the unique-index locks in this order, so two creates
/// sharing several pairs collide on the first one instead of deadlocking.
fn lock_order(identifiers: &[Identifier]) -> Vec<&Identifier> {
    let mut ordered: Vec<&Identifier> = identifiers.iter().collect();
    ordered.sort_by(|a, b| (&a.system, &a.value).cmp(&(&b.system, &b.value)));
    ordered
}

/// Handle on one kind's document table
pub struct Collection<'a> {
    pool: &'a Pool,
    kind: ResourceKind,
}

impl Collection<'_> {
    pub async fn find_by_id(&self, id: ResourceId) -> Result<Option<JsonValue>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT data FROM {} WHERE id = $1",
                self.kind.collection()
            ))
            .await?;

        let uuid = *id.as_uuid();
        let row = client.query_opt(&stmt, &[&uuid]).await?;
        Ok(row.map(|row| row.get(0)))
    }

    pub async fn find_by_identifier(
        &self,
        identifier: &Identifier,
        limit: usize,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                "SELECT data FROM {} WHERE data -> 'identifier' @> $1 LIMIT $2",
                self.kind.collection()
            ))
            .await?;

        let pattern = serde_json::json!([{
            "system": identifier.system,
            "value": identifier.value,
        }]);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = client.query(&stmt, &[&pattern, &limit]).await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    pub async fn insert(&self, document: &NewDocument) -> Result<(), StoreError> {
        let table = self.kind.collection();
        let uuid = *document.id.as_uuid();

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let insert_document = format!("INSERT INTO {table} (id, data) VALUES ($1, $2)");
        tx.execute(insert_document.as_str(), &[&uuid, &document.body])
            .await?;

        let stmt = tx
            .prepare_cached(&format!(
                "INSERT INTO {table}_identifier (system, value, resource_id) VALUES ($1, $2, $3)"
            ))
            .await?;
        for identifier in lock_order(&document.identifiers) {
            tx.execute(&stmt, &[&identifier.system, &identifier.value, &uuid])
                .await
                .map_err(|e| self.classify_insert_error(e))?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit().await?;
        Ok(())
    }

    fn classify_insert_error(&self, err: tokio_postgres::Error) -> StoreError {
        let constraint = format!("{}_identifier_unique", self.kind.collection());
        let is_duplicate = err.code() == Some(&SqlState::UNIQUE_VIOLATION)
            && err
                .as_db_error()
                .and_then(|db| db.constraint())
                .is_some_and(|name| name == constraint);

        if is_duplicate {
            StoreError::DuplicateIdentifier
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl DocumentStore for ConnectionManager {
    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool().await?.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<JsonValue>, StoreError> {
        self.collection(kind).await?.find_by_id(id).await
    }

    async fn find_by_identifier(
        &self,
        kind: ResourceKind,
        identifier: &Identifier,
        limit: usize,
    ) -> Result<Vec<JsonValue>, StoreError> {
        self.collection(kind)
            .await?
            .find_by_identifier(identifier, limit)
            .await
    }

    async fn insert(&self, document: &NewDocument) -> Result<(), StoreError> {
        self.collection(document.kind).await?.insert(document).await
    }
}
