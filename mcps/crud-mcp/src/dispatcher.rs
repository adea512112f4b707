//! The generic CRUD dispatcher
//!
//! One [`Dispatcher`] serves one entity on one store. A call goes
//! parse → plan → run → render, and every outcome, including store failures,
//! comes back as a [`CrudResponse`]. Requests that fail validation never
//! open a connection.

use serde_json::Value;
use std::sync::Arc;

use crate::entity::{EntitySpec, OutputColumn};
use crate::operation::Operation;
use crate::params::ParamBag;
use crate::response::{CrudResponse, Record};
use crate::statement::{plan, Expect, Plan};
use crate::store::Store;
use crate::value::{SqlValue, ValueKind};

pub struct Dispatcher {
    entity: &'static EntitySpec,
    store: Arc<dyn Store>,
}

impl Dispatcher {
    pub fn new(entity: &'static EntitySpec, store: Arc<dyn Store>) -> Self {
        Self { entity, store }
    }

    pub fn entity(&self) -> &'static EntitySpec {
        self.entity
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Run one CRUD request
    pub async fn dispatch(&self, operation: &str, params: &ParamBag) -> CrudResponse {
        let table = self.entity.table;

        let plan = match self.plan(operation, params) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::debug!(table, operation, error = %e, "Request rejected");
                return CrudResponse::rejected(&e);
            }
        };

        let Plan {
            operation,
            statement,
            expect,
        } = plan;

        // Parameter values are never logged
        tracing::debug!(
            table,
            %operation,
            sql = %statement.sql,
            params = statement.params.len(),
            "Running statement"
        );

        match expect {
            Expect::Affected(message) => match self.store.execute(&statement).await {
                Ok(affected) => {
                    let rows_affected = match operation {
                        Operation::Update | Operation::Delete => Some(affected),
                        _ => None,
                    };
                    CrudResponse::done(statement.sql, &message, rows_affected)
                }
                Err(e) => {
                    tracing::warn!(table, %operation, error = %e, "Statement failed");
                    CrudResponse::failed(statement.sql, &e)
                }
            },
            Expect::Rows(columns) => match self.store.fetch(&statement, columns).await {
                Ok(rows) => {
                    let records = rows.into_iter().map(|row| render(columns, row)).collect();
                    CrudResponse::rows(statement.sql, records)
                }
                Err(e) => {
                    tracing::warn!(table, %operation, error = %e, "Query failed");
                    CrudResponse::failed(statement.sql, &e)
                }
            },
        }
    }

    fn plan(&self, operation: &str, params: &ParamBag) -> Result<Plan, crate::error::CrudError> {
        let operation: Operation = operation.parse()?;
        plan(
            self.entity,
            operation,
            params,
            self.store.dialect(),
            self.store.scope(),
        )
    }
}

/// Zip a decoded row with its column names
fn render(columns: &[OutputColumn], row: Vec<SqlValue>) -> Record {
    columns
        .iter()
        .zip(row)
        .map(|(column, value)| {
            let json = match value {
                SqlValue::Null if column.nullable && column.kind == ValueKind::Text => {
                    Value::String(String::new())
                }
                other => other.to_json(),
            };
            (column.name.to_string(), json)
        })
        .collect()
}
