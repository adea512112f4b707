//! SQLite adapter
//!
//! SQLite has no decimal or timestamp storage classes, so prices travel as
//! REAL and timestamps as `YYYY-MM-DD HH:MM:SS` text. Decoding reads the
//! stored value directly instead of trusting the declared column type.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow,
};
use sqlx::{Arguments, ConnectOptions, Row};

use super::{connect_within, first_decoded, release, timed, Store};
use crate::config::{SqliteConfig, Timeouts};
use crate::dialect::Dialect;
use crate::entity::OutputColumn;
use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;
use crate::value::{decimal_to_f64, parse_decimal, SqlValue, ValueKind};

/// Schema name SQLite gives the primary database file
const MAIN_SCHEMA: &str = "main";

/// Store backed by a single SQLite file
pub struct SqliteStore {
    options: SqliteConnectOptions,
    timeouts: Timeouts,
}

impl SqliteStore {
    pub fn new(config: &SqliteConfig, timeouts: Timeouts) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(timeouts.query)
            .disable_statement_logging();

        Self { options, timeouts }
    }

    async fn connect(&self) -> StoreResult<SqliteConnection> {
        connect_within(self.timeouts.connect, self.options.connect()).await
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn scope(&self) -> &str {
        MAIN_SCHEMA
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

async fn run_execute(conn: &mut SqliteConnection, statement: &Statement) -> StoreResult<u64> {
    let args = arguments(&statement.params)?;
    let done = sqlx::query_with(&statement.sql, args)
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Execute)?;
    Ok(done.rows_affected())
}

async fn run_fetch(
    conn: &mut SqliteConnection,
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

fn arguments<'q>(params: &[SqlValue]) -> StoreResult<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for value in params {
        let added = match value {
            SqlValue::Null => args.add(Option::<String>::None),
            SqlValue::Int(v) => args.add(*v),
            SqlValue::Decimal(v) => match decimal_to_f64(v) {
                Some(f) => args.add(f),
                None => return Err(StoreError::Bind(format!("{} does not fit in a REAL", v))),
            },
            SqlValue::Text(v) => args.add(v.clone()),
            SqlValue::Timestamp(v) => args.add(v.format("%Y-%m-%d %H:%M:%S").to_string()),
        };
        added.map_err(|e| StoreError::Bind(e.to_string()))?;
    }
    Ok(args)
}

fn decode_row(row: &SqliteRow, columns: &[OutputColumn]) -> StoreResult<Vec<SqlValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| decode_cell(row, i, column.kind))
        .collect()
}

fn decode_cell(row: &SqliteRow, i: usize, kind: ValueKind) -> StoreResult<SqlValue> {
    let value = match kind {
        ValueKind::Integer => {
            first_decoded([row.try_get_unchecked::<Option<i64>, _>(i)])?.map(SqlValue::Int)
        }
        ValueKind::Text => {
            first_decoded([row.try_get_unchecked::<Option<String>, _>(i)])?.map(SqlValue::Text)
        }
        ValueKind::Decimal => first_decoded([row.try_get_unchecked::<Option<f64>, _>(i)])?
            .and_then(|v| parse_decimal(&v.to_string()))
            .map(SqlValue::Decimal),
        ValueKind::Timestamp => first_decoded([row.try_get_unchecked::<Option<String>, _>(i)])?
            .and_then(|text| parse_timestamp(&text))
            .map(SqlValue::Timestamp),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

/// `CURRENT_TIMESTAMP` text is UTC without an offset
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T08:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[tokio::test]
    async fn test_fetch_decodes_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(
            &SqliteConfig {
                path: dir.path().join("decode.db"),
            },
            Timeouts::default(),
        );

        let columns = [
            OutputColumn::new("n", ValueKind::Integer),
            OutputColumn::new("price", ValueKind::Decimal),
            OutputColumn::new("ts", ValueKind::Timestamp),
            OutputColumn::nullable("note", ValueKind::Text),
        ];
        let rows = store
            .fetch(
                &Statement::new(
                    "SELECT 7, 14.99, '2025-03-01 08:30:00', NULL",
                    Vec::new(),
                ),
                &columns,
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], SqlValue::Int(7));
        assert_eq!(rows[0][1], SqlValue::Decimal(parse_decimal("14.99").unwrap()));
        assert!(matches!(rows[0][2], SqlValue::Timestamp(_)));
        assert!(rows[0][3].is_null());
    }

    #[tokio::test]
    async fn test_execution_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(
            &SqliteConfig {
                path: dir.path().join("broken.db"),
            },
            Timeouts::default(),
        );

        let err = store
            .execute(&Statement::new("DELETE FROM missing_table", Vec::new()))
            .await
            .unwrap_err();
        assert!(!err.is_connection());
        assert!(err.to_string().starts_with("Execution failed:"));
    }
}
