//! SQL dialect differences between the supported stores

/// SQL flavor spoken by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the `n`th bound parameter, 1-based
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }

    /// Comma-separated placeholders `first..first + count`
    pub fn placeholders(&self, first: usize, count: usize) -> String {
        (first..first + count)
            .map(|n| self.placeholder(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column metadata query
    ///
    /// Binds the scope (database or schema) as the first parameter and the
    /// table name as the second. Rows come back as
    /// `(column, type, nullable, max_length)` in column order.
    pub fn describe_sql(&self) -> &'static str {
        match self {
            Dialect::MySql => {
                "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, CHARACTER_MAXIMUM_LENGTH \
                 FROM INFORMATION_SCHEMA.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
                 ORDER BY ORDINAL_POSITION"
            }
            Dialect::Postgres => {
                "SELECT column_name::text, data_type::text, is_nullable::text, \
                 character_maximum_length::int4 \
                 FROM information_schema.columns \
                 WHERE table_catalog = current_database() \
                 AND table_schema = $1 AND table_name = $2 \
                 ORDER BY ordinal_position"
            }
            Dialect::Sqlite => {
                "SELECT name, type, CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END, NULL \
                 FROM pragma_table_info(?2, ?1) \
                 ORDER BY cid"
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

/// Whether `name` is safe to splice into DDL as an unquoted-style identifier.
///
/// Database names cannot be bound parameters, so the one place a
/// configured name reaches SQL text goes through this check first.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
