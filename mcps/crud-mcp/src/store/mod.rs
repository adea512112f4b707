//! Backing store adapters
//!
//! A [`Store`] runs one planned [`Statement`] at a time against a relational
//! database. Every call opens its own connection and closes it before
//! returning, on success and on failure alike, so concurrent tool calls never
//! share a session.
//!
//! - [`mysql::MySqlStore`] - `?` placeholders, scoped to the database
//! - [`postgres::PostgresStore`] - `$n` placeholders, scoped to a schema
//! - [`sqlite::SqliteStore`] - single file, used for local runs and tests

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{StoreConfig, Timeouts};
use crate::dialect::Dialect;
use crate::entity::OutputColumn;
use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;
use crate::value::SqlValue;

pub use mysql::MySqlStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// A relational database reachable through one dialect
#[async_trait]
pub trait Store: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Database or schema name that `describe` is restricted to
    fn scope(&self) -> &str;

    /// Create whatever container the tables live in
    async fn prepare(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Run a write and return the affected row count
    async fn execute(&self, statement: &Statement) -> StoreResult<u64>;

    /// Run a query and decode each row into `columns`, positionally
    async fn fetch(
        &self,
        statement: &Statement,
        columns: &[OutputColumn],
    ) -> StoreResult<Vec<Vec<SqlValue>>>;

    /// Run statements in order on a single connection, stopping at the first failure
    async fn execute_batch(&self, statements: &[Statement]) -> StoreResult<()>;
}

/// Build the adapter described by `config`
pub fn open(config: &StoreConfig, timeouts: Timeouts) -> Arc<dyn Store> {
    match config {
        StoreConfig::MySql(cfg) => Arc::new(MySqlStore::new(cfg, timeouts)),
        StoreConfig::Postgres(cfg) => Arc::new(PostgresStore::new(cfg, timeouts)),
        StoreConfig::Sqlite(cfg) => Arc::new(SqliteStore::new(cfg, timeouts)),
    }
}

/// Bound a connection attempt by the connect timeout
pub(crate) async fn connect_within<C, F>(limit: Duration, connect: F) -> StoreResult<C>
where
    F: Future<Output = Result<C, sqlx::Error>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(result) => result.map_err(StoreError::Connect),
        Err(_) => Err(StoreError::ConnectTimeout(limit)),
    }
}

/// Bound a statement by the query timeout
pub(crate) async fn timed<T, F>(limit: Duration, run: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, run)
        .await
        .unwrap_or(Err(StoreError::QueryTimeout(limit)))
}

/// Close a connection, logging instead of failing if the close itself errors
pub(crate) async fn release<C: sqlx::Connection>(conn: C) {
    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close connection cleanly");
    }
}

/// Decode one cell by trying progressively wider Rust types
///
/// Drivers disagree on the exact integer width or text encoding a column
/// reports, so each adapter lists the candidates it accepts in order.
pub(crate) fn first_decoded<T>(
    attempts: impl IntoIterator<Item = Result<Option<T>, sqlx::Error>>,
) -> StoreResult<Option<T>> {
    let mut last = None;
    for attempt in attempts {
        match attempt {
            Ok(value) => return Ok(value),
            Err(e) => last = Some(e),
        }
    }
    Err(StoreError::Execute(
        last.unwrap_or(sqlx::Error::ColumnNotFound("no decoder".to_string())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_maps_elapsed_to_query_timeout() {
        let limit = Duration::from_millis(10);
        let result: StoreResult<()> = timed(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StoreError::QueryTimeout(d)) if d == limit));
    }

    #[tokio::test]
    async fn test_connect_within_maps_elapsed_to_connect_timeout() {
        let limit = Duration::from_millis(10);
        let result: StoreResult<()> = connect_within(limit, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ref e) if e.is_connection()));
    }

    #[test]
    fn test_first_decoded_takes_first_success() {
        let attempts = vec![
            Err(sqlx::Error::ColumnNotFound("a".into())),
            Ok(Some(7_i64)),
            Ok(None),
        ];
        assert_eq!(first_decoded(attempts).unwrap(), Some(7));

        let failing: Vec<Result<Option<i64>, sqlx::Error>> =
            vec![Err(sqlx::Error::ColumnNotFound("b".into()))];
        assert!(first_decoded(failing).is_err());
    }
}
