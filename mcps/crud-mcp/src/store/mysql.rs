//! MySQL adapter

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::{Arguments, ConnectOptions, Executor, Row};

use super::{connect_within, first_decoded, release, timed, Store};
use crate::config::{MySqlConfig, Timeouts};
use crate::dialect::{is_identifier, Dialect};
use crate::entity::OutputColumn;
use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;
use crate::value::{SqlValue, ValueKind};

/// Store backed by one MySQL database
pub struct MySqlStore {
    /// Server-level options; the database is selected per connection
    options: MySqlConnectOptions,
    database: String,
    timeouts: Timeouts,
}

impl MySqlStore {
    pub fn new(config: &MySqlConfig, timeouts: Timeouts) -> Self {
        let ssl_mode = if config.require_tls {
            MySqlSslMode::Required
        } else {
            MySqlSslMode::Preferred
        };

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode)
            .disable_statement_logging();

        Self {
            options,
            database: config.database.clone(),
            timeouts,
        }
    }

    async fn connect(&self) -> StoreResult<MySqlConnection> {
        let options = self.options.clone().database(&self.database);
        connect_within(self.timeouts.connect, options.connect()).await
    }

    /// Connection with no default database, for creating it
    async fn connect_server(&self) -> StoreResult<MySqlConnection> {
        connect_within(self.timeouts.connect, self.options.connect()).await
    }
}

#[async_trait]
impl Store for MySqlStore {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn scope(&self) -> &str {
        &self.database
    }

    async fn prepare(&self) -> StoreResult<()> {
        if !is_identifier(&self.database) {
            return Err(StoreError::InvalidIdentifier(self.database.clone()));
        }

        let sql = format!("CREATE DATABASE IF NOT EXISTS `{}`", self.database);
        let mut conn = self.connect_server().await?;
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

async fn run_execute(conn: &mut MySqlConnection, statement: &Statement) -> StoreResult<u64> {
    let args = arguments(&statement.params)?;
    let done = sqlx::query_with(&statement.sql, args)
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Execute)?;
    Ok(done.rows_affected())
}

async fn run_fetch(
    conn: &mut MySqlConnection,
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

fn arguments(params: &[SqlValue]) -> StoreResult<MySqlArguments> {
    let mut args = MySqlArguments::default();
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

fn decode_row(row: &MySqlRow, columns: &[OutputColumn]) -> StoreResult<Vec<SqlValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| decode_cell(row, i, column.kind))
        .collect()
}

fn decode_cell(row: &MySqlRow, i: usize, kind: ValueKind) -> StoreResult<SqlValue> {
    let value = match kind {
        ValueKind::Integer => first_decoded([
            row.try_get::<Option<i64>, _>(i),
            row.try_get::<Option<u64>, _>(i)
                .map(|v| v.map(|n| i64::try_from(n).unwrap_or(i64::MAX))),
        ])?
        .map(SqlValue::Int),
        // information_schema reports some text columns as binary strings
        ValueKind::Text => first_decoded([
            row.try_get::<Option<String>, _>(i),
            row.try_get::<Option<Vec<u8>>, _>(i)
                .map(|v| v.map(|b| String::from_utf8_lossy(&b).into_owned())),
        ])?
        .map(SqlValue::Text),
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
