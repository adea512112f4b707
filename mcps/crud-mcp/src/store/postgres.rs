//! PostgreSQL adapter

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection, PgRow, PgSslMode};
use sqlx::{Arguments, ConnectOptions, Executor, Row};

use super::{connect_within, first_decoded, release, timed, Store};
use crate::config::{PostgresConfig, Timeouts};
use crate::dialect::{is_identifier, Dialect};
use crate::entity::OutputColumn;
use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;
use crate::value::{SqlValue, ValueKind};

/// Store backed by one schema of a PostgreSQL database
///
/// Connections set `search_path` to the schema, so unqualified table names
/// in statements and DDL resolve there.
pub struct PostgresStore {
    options: PgConnectOptions,
    schema: String,
    timeouts: Timeouts,
}

impl PostgresStore {
    pub fn new(config: &PostgresConfig, timeouts: Timeouts) -> Self {
        let ssl_mode = if config.require_tls {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl_mode)
            .options([("search_path", config.schema.as_str())])
            .disable_statement_logging();

        Self {
            options,
            schema: config.schema.clone(),
            timeouts,
        }
    }

    async fn connect(&self) -> StoreResult<PgConnection> {
        connect_within(self.timeouts.connect, self.options.connect()).await
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn scope(&self) -> &str {
        &self.schema
    }

    async fn prepare(&self) -> StoreResult<()> {
        if !is_identifier(&self.schema) {
            return Err(StoreError::InvalidIdentifier(self.schema.clone()));
        }
        if self.schema == "public" {
            return Ok(());
        }

        let sql = format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", self.schema);
        let mut conn = self.connect().await?;
        let result = timed(self.timeouts.query, async {
            conn.execute(sql.as_str())
                .await
                .map(|_| ())
                .map_err(StoreError::Execute)
        })
        .await;
        release(conn).await;
        result
    }

    async fn execute(&self, statement: &Statement) -> StoreResult<u64> {
        let mut conn = self.connect().await?;
        let result = timed(self.timeouts.query, run_execute(&mut conn, statement)).await;
        release(conn).await;
        result
    }

    async fn fetch(
        &self,
        statement: &Statement,
        columns: &[OutputColumn],
    ) -> StoreResult<Vec<Vec<SqlValue>>> {
        let mut conn = self.connect().await?;
        let result = timed(self.timeouts.query, run_fetch(&mut conn, statement, columns)).await;
        release(conn).await;
        result
    }

    async fn execute_batch(&self, statements: &[Statement]) -> StoreResult<()> {
        let mut conn = self.connect().await?;
        let result = async {
            for statement in statements {
                timed(self.timeouts.query, run_execute(&mut conn, statement)).await?;
            }
            Ok(())
        }
        .await;
        release(conn).await;
        result
    }
}

async fn run_execute(conn: &mut PgConnection, statement: &Statement) -> StoreResult<u64> {
    let args = arguments(&statement.params)?;
    let done = sqlx::query_with(&statement.sql, args)
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Execute)?;
    Ok(done.rows_affected())
}

async fn run_fetch(
    conn: &mut PgConnection,
    statement: &Statement,
    columns: &[OutputColumn],
) -> StoreResult<Vec<Vec<SqlValue>>> {
    let args = arguments(&statement.params)?;
    let rows = sqlx::query_with(&statement.sql, args)
        .fetch_all(&mut *conn)
        .await
        .map_err(StoreError::Execute)?;

    rows.iter().map(|row| decode_row(row, columns)).collect()
}

fn arguments(params: &[SqlValue]) -> StoreResult<PgArguments> {
    let mut args = PgArguments::default();
    for value in params {
        let added = match value {
            SqlValue::Null => args.add(Option::<String>::None),
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Decimal(v) => args.add(v.clone()),
            SqlValue::Text(v) => args.add(v.clone()),
            SqlValue::Timestamp(v) => args.add(*v),
        };
        added.map_err(|e| StoreError::Bind(e.to_string()))?;
    }
    Ok(args)
}

fn decode_row(row: &PgRow, columns: &[OutputColumn]) -> StoreResult<Vec<SqlValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| decode_cell(row, i, column.kind))
        .collect()
}

fn decode_cell(row: &PgRow, i: usize, kind: ValueKind) -> StoreResult<SqlValue> {
    let value = match kind {
        // SERIAL is int4
        ValueKind::Integer => first_decoded([
            row.try_get::<Option<i64>, _>(i),
            row.try_get::<Option<i32>, _>(i).map(|v| v.map(i64::from)),
            row.try_get::<Option<i16>, _>(i).map(|v| v.map(i64::from)),
        ])?
        .map(SqlValue::Int),
        ValueKind::Text => first_decoded([row.try_get::<Option<String>, _>(i)])?.map(SqlValue::Text),
        ValueKind::Decimal => {
            first_decoded([row.try_get::<Option<BigDecimal>, _>(i)])?.map(SqlValue::Decimal)
        }
        ValueKind::Timestamp => first_decoded([
            row.try_get::<Option<DateTime<Utc>>, _>(i),
            row.try_get::<Option<NaiveDateTime>, _>(i)
                .map(|v| v.map(|t| t.and_utc())),
        ])?
        .map(SqlValue::Timestamp),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(schema: &str) -> PostgresConfig {
        PostgresConfig {
            host: "db.internal".into(),
            port: 5432,
            user: "crud".into(),
            password: "secret".into(),
            database: "postgres".into(),
            schema: schema.into(),
            require_tls: false,
        }
    }

    #[test]
    fn test_scope_is_schema() {
        let store = PostgresStore::new(&config("inventory"), Timeouts::default());
        assert_eq!(store.scope(), "inventory");
        assert_eq!(store.dialect(), Dialect::Postgres);
    }

    #[tokio::test]
    async fn test_public_schema_needs_no_preparation() {
        // Returns before any connection is attempted
        let store = PostgresStore::new(&config("public"), Timeouts::default());
        assert!(store.prepare().await.is_ok());
    }

    #[tokio::test]
    async fn test_prepare_rejects_unsafe_schema_name() {
        let store = PostgresStore::new(&config("x\"; DROP SCHEMA public; --"), Timeouts::default());
        assert!(matches!(
            store.prepare().await,
            Err(StoreError::InvalidIdentifier(_))
        ));
    }
}
