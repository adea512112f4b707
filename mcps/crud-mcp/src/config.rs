//! Configuration for the CRUD MCP server
//!
//! Everything is read from the environment once at startup (after `.env`
//! has been loaded) into a [`CrudConfig`] that is passed by reference to
//! the store constructors. Request handling never looks at the environment.
//!
//! Each table picks its store with `CRUD_CUSTOMERS_STORE` /
//! `CRUD_PRODUCTS_STORE` (`mysql`, `postgres` or `sqlite`). Defaults:
//! 1. `SQLITE_PATH` set: both tables live in one local SQLite file
//! 2. otherwise: customers in MySQL (`MYSQL_*`), products in PostgreSQL (`PG_*`)
//!
//! Only the variables of the stores actually selected are required.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::dialect::is_identifier;

/// Configuration errors, fatal at startup
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required env var {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// MySQL connection settings
#[derive(Clone)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Target database; created at seeding time when absent
    pub database: String,
    pub require_tls: bool,
}

/// PostgreSQL connection settings
#[derive(Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Schema that `describe` is scoped to
    pub schema: String,
    pub require_tls: bool,
}

/// Local SQLite file settings
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub path: PathBuf,
}

/// Which store backs a table, and how to reach it
#[derive(Debug, Clone)]
pub enum StoreConfig {
    MySql(MySqlConfig),
    Postgres(PostgresConfig),
    Sqlite(SqliteConfig),
}

/// Store backend named in `CRUD_*_STORE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MySql,
    Postgres,
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            "sqlite" => Ok(StoreKind::Sqlite),
            other => Err(format!("expected mysql, postgres or sqlite, got '{}'", other)),
        }
    }
}

/// Client-side limits applied to every store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub query: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            query: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct CrudConfig {
    /// Store holding the `Customers` table
    pub customers: StoreConfig,
    /// Store holding the `products` table
    pub products: StoreConfig,
    pub timeouts: Timeouts,
}

impl CrudConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let timeouts = Timeouts {
            connect: Duration::from_secs(
                env.parse_or("CRUD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            ),
            query: Duration::from_secs(
                env.parse_or("CRUD_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?,
            ),
        };

        let (customers, products) = match env.optional("SQLITE_PATH") {
            Some(_) => (StoreKind::Sqlite, StoreKind::Sqlite),
            None => (StoreKind::MySql, StoreKind::Postgres),
        };
        let customers = env.parse_or("CRUD_CUSTOMERS_STORE", customers)?;
        let products = env.parse_or("CRUD_PRODUCTS_STORE", products)?;

        Ok(Self {
            customers: StoreConfig::from_env(&env, customers)?,
            products: StoreConfig::from_env(&env, products)?,
            timeouts,
        })
    }

    /// Both tables in one SQLite file
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        let sqlite = StoreConfig::Sqlite(SqliteConfig { path: path.into() });
        Self {
            customers: sqlite.clone(),
            products: sqlite,
            timeouts: Timeouts::default(),
        }
    }
}

impl StoreConfig {
    fn from_env<F>(env: &Env<F>, kind: StoreKind) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(match kind {
            StoreKind::MySql => StoreConfig::MySql(MySqlConfig::from_env(env)?),
            StoreKind::Postgres => StoreConfig::Postgres(PostgresConfig::from_env(env)?),
            StoreKind::Sqlite => StoreConfig::Sqlite(SqliteConfig {
                path: PathBuf::from(env.required("SQLITE_PATH")?),
            }),
        })
    }
}

impl MySqlConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let database = env.required("MYSQL_DB")?;
        if !is_identifier(&database) {
            return Err(ConfigError::Invalid {
                key: "MYSQL_DB",
                reason: "only letters, digits, '_' and '$' are allowed".to_string(),
            });
        }

        Ok(Self {
            host: env.required("MYSQL_HOST")?,
            port: env.parse_or("MYSQL_PORT", 3306)?,
            user: env.required("MYSQL_USER")?,
            password: env.required("MYSQL_PASSWORD")?,
            database,
            require_tls: env.flag_or("MYSQL_TLS", true)?,
        })
    }
}

impl PostgresConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: env.required("PG_HOST")?,
            port: env.parse_or("PG_PORT", 5432)?,
            user: env.required("PG_USER")?,
            password: env.required("PG_PASSWORD")?,
            // Development default only
            database: env.optional("PG_DB").unwrap_or_else(|| "postgres".to_string()),
            schema: env.optional("PG_SCHEMA").unwrap_or_else(|| "public".to_string()),
            require_tls: env.flag_or("PG_TLS", true)?,
        })
    }
}

impl fmt::Debug for MySqlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("require_tls", &self.require_tls)
            .finish()
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("require_tls", &self.require_tls)
            .finish()
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn flag_or(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" | "require" | "required" => Ok(true),
            "0" | "false" | "no" | "off" | "disable" | "disabled" => Ok(false),
            other => Err(ConfigError::Invalid {
                key,
                reason: format!("expected a boolean, got '{}'", other),
            }),
        }
    }
}
