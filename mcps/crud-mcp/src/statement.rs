//! Request validation and statement planning
//!
//! [`plan`] turns an operation plus a parameter bag into exactly one
//! parameterized statement, or rejects the request. Nothing here touches a
//! store. Caller values only ever travel in [`Statement::params`]; table and
//! column names come from the static [`EntitySpec`].

use crate::dialect::Dialect;
use crate::entity::{EntitySpec, Field, OutputColumn};
use crate::error::CrudError;
use crate::operation::Operation;
use crate::params::{take, ParamBag};
use crate::value::{SqlValue, ValueKind};

/// SQL text plus its bound parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// What the dispatcher does with a statement once it has run
#[derive(Debug, Clone, PartialEq)]
pub enum Expect {
    /// Write: report this confirmation message
    Affected(String),
    /// Query: decode rows into this shape
    Rows(&'static [OutputColumn]),
}

/// A validated request, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub operation: Operation,
    pub statement: Statement,
    pub expect: Expect,
}

/// Optional row cap for `read`
pub const LIMIT: Field = Field::optional("limit", "", ValueKind::Integer);

/// Table targeted by `describe`
pub const TABLE_NAME: Field = Field::required("table_name", "", ValueKind::Text);

/// Row shape of every `describe` result
pub const DESCRIBE_COLUMNS: &[OutputColumn] = &[
    OutputColumn::new("column", ValueKind::Text),
    OutputColumn::new("type", ValueKind::Text),
    OutputColumn::new("nullable", ValueKind::Text),
    OutputColumn::nullable("max_length", ValueKind::Integer),
];

/// Validate `params` for `operation` and build its statement
///
/// `scope` is the database or schema name `describe` filters on.
pub fn plan(
    entity: &EntitySpec,
    operation: Operation,
    params: &ParamBag,
    dialect: Dialect,
    scope: &str,
) -> Result<Plan, CrudError> {
    let (statement, expect) = match operation {
        Operation::Create => plan_create(entity, params, dialect)?,
        Operation::Read => plan_read(entity, params, dialect)?,
        Operation::Update => plan_update(entity, params, dialect)?,
        Operation::Delete => plan_delete(entity, params, dialect)?,
        Operation::Describe => plan_describe(params, dialect, scope)?,
    };

    Ok(Plan {
        operation,
        statement,
        expect,
    })
}

fn plan_create(
    entity: &EntitySpec,
    params: &ParamBag,
    dialect: Dialect,
) -> Result<(Statement, Expect), CrudError> {
    let mut values = Vec::with_capacity(entity.create.len());
    let mut missing = false;

    for field in entity.create {
        match take(params, field)? {
            Some(value) => values.push(value),
            None if field.required => missing = true,
            None => values.push(SqlValue::Null),
        }
    }

    if missing {
        return Err(CrudError::validation(format!(
            "{} required for create.",
            quoted_list(&entity.required_create_params())
        )));
    }

    let columns: Vec<&str> = entity.create.iter().map(|f| f.column).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        entity.table,
        columns.join(", "),
        dialect.placeholders(1, columns.len())
    );

    let shown = entity
        .create
        .iter()
        .zip(&values)
        .find(|(field, _)| field.param == entity.display)
        .map(|(_, value)| display(value))
        .unwrap_or_default();

    Ok((
        Statement::new(sql, values),
        Expect::Affected(format!("{} '{}' added.", entity.label, shown)),
    ))
}

fn plan_read(
    entity: &EntitySpec,
    params: &ParamBag,
    dialect: Dialect,
) -> Result<(Statement, Expect), CrudError> {
    let columns: Vec<&str> = entity.columns.iter().map(|c| c.name).collect();
    let mut sql = format!(
        "SELECT {} FROM {} ORDER BY {} ASC",
        columns.join(", "),
        entity.table,
        entity.key.column
    );
    let mut values = Vec::new();

    if let Some(limit) = take(params, &LIMIT)? {
        sql.push_str(&format!(" LIMIT {}", dialect.placeholder(1)));
        values.push(limit);
    }

    Ok((Statement::new(sql, values), Expect::Rows(entity.columns)))
}

fn plan_update(
    entity: &EntitySpec,
    params: &ParamBag,
    dialect: Dialect,
) -> Result<(Statement, Expect), CrudError> {
    let id = take(params, &entity.key)?;
    let value = take(params, &entity.update)?;

    let (Some(id), Some(value)) = (id, value) else {
        return Err(CrudError::validation(format!(
            "{} required for update.",
            quoted_list(&[entity.key.param, entity.update.param])
        )));
    };

    let sql = format!(
        "UPDATE {} SET {} = {} WHERE {} = {}",
        entity.table,
        entity.update.column,
        dialect.placeholder(1),
        entity.key.column,
        dialect.placeholder(2)
    );
    let message = format!("{} id={} updated.", entity.label, display(&id));

    Ok((Statement::new(sql, vec![value, id]), Expect::Affected(message)))
}

fn plan_delete(
    entity: &EntitySpec,
    params: &ParamBag,
    dialect: Dialect,
) -> Result<(Statement, Expect), CrudError> {
    // The id wins whenever it is present
    if let Some(id) = take(params, &entity.key)? {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            entity.table,
            entity.key.column,
            dialect.placeholder(1)
        );
        let message = format!("{} id={} deleted.", entity.label, display(&id));
        return Ok((Statement::new(sql, vec![id]), Expect::Affected(message)));
    }

    match entity.alternate_key {
        Some(alternate) => {
            let Some(key) = take(params, &alternate)? else {
                return Err(CrudError::validation(format!(
                    "Provide '{}' or '{}' for delete.",
                    entity.key.param, alternate.param
                )));
            };
            let sql = format!(
                "DELETE FROM {} WHERE {} = {}",
                entity.table,
                alternate.column,
                dialect.placeholder(1)
            );
            let message = format!("{} '{}' deleted.", entity.label, display(&key));
            Ok((Statement::new(sql, vec![key]), Expect::Affected(message)))
        }
        None => Err(CrudError::validation(format!(
            "'{}' required for delete.",
            entity.key.param
        ))),
    }
}

fn plan_describe(
    params: &ParamBag,
    dialect: Dialect,
    scope: &str,
) -> Result<(Statement, Expect), CrudError> {
    let Some(table) = take(params, &TABLE_NAME)? else {
        return Err(CrudError::validation(format!(
            "'{}' required for describe.",
            TABLE_NAME.param
        )));
    };

    let statement = Statement::new(
        dialect.describe_sql(),
        vec![SqlValue::Text(scope.to_string()), table],
    );
    Ok((statement, Expect::Rows(DESCRIBE_COLUMNS)))
}

fn display(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}

/// `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`
fn quoted_list(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
