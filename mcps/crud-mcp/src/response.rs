//! The record every CRUD tool call returns

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrudError, StoreError};

/// Prefix of every failure message
pub const ERROR_MARKER: &str = "❌";

/// Prefix of every write confirmation
pub const SUCCESS_MARKER: &str = "✅";

/// One output row, keyed by column name
pub type Record = serde_json::Map<String, Value>;

/// Rows for queries, a message for writes and failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrudResult {
    Rows(Vec<Record>),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrudResponse {
    /// The statement that ran, or null when the request was rejected first
    pub sql: Option<String>,
    pub result: CrudResult,
    /// Rows changed by an update or delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
}

impl CrudResponse {
    /// Request refused before a statement was built
    pub fn rejected(err: &CrudError) -> Self {
        Self {
            sql: None,
            result: CrudResult::Message(format!("{} {}", ERROR_MARKER, err)),
            rows_affected: None,
        }
    }

    /// Statement built but the store failed
    pub fn failed(sql: impl Into<String>, err: &StoreError) -> Self {
        Self {
            sql: Some(sql.into()),
            result: CrudResult::Message(format!("{} {}", ERROR_MARKER, err)),
            rows_affected: None,
        }
    }

    /// Write committed
    pub fn done(sql: impl Into<String>, message: &str, rows_affected: Option<u64>) -> Self {
        Self {
            sql: Some(sql.into()),
            result: CrudResult::Message(format!("{} {}", SUCCESS_MARKER, message)),
            rows_affected,
        }
    }

    /// Query returned rows
    pub fn rows(sql: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            sql: Some(sql.into()),
            result: CrudResult::Rows(rows),
            rows_affected: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(&self.result, CrudResult::Message(m) if m.starts_with(ERROR_MARKER))
    }

    /// The result message, if this is not a row set
    pub fn message(&self) -> Option<&str> {
        match &self.result {
            CrudResult::Message(m) => Some(m),
            CrudResult::Rows(_) => None,
        }
    }

    /// The row set, if this is one
    pub fn records(&self) -> Option<&[Record]> {
        match &self.result {
            CrudResult::Rows(rows) => Some(rows),
            CrudResult::Message(_) => None,
        }
    }
}
