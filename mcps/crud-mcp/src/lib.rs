//! CRUD MCP Library
//!
//! Generic create/read/update/delete/describe tools over relational tables.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use crud_mcp::{CrudConfig, CrudMcpServer, EmbeddableMcp};
//!
//! let server = CrudMcpServer::from_config(&CrudConfig::sqlite("demo.db"));
//! server.seed().await?;
//! let result = server
//!     .call_tool("product_crud", serde_json::json!({ "operation": "read", "limit": 5 }))
//!     .await?;
//! ```
//!
//! - Each table is described once by an [`EntitySpec`]; one [`Dispatcher`]
//!   handles every operation for it
//! - Caller values are always bound parameters, never SQL text
//! - Every call uses its own connection and returns `{sql, result}`, even on
//!   failure
//!
//! # Tool names
//!
//! Tools are named after the table they manage, not the store behind it,
//! since either table can live in any store. Clients written against the
//! older `sqlserver_crud` / `postgresql_crud` names must switch to
//! `customer_crud` / `product_crud`; parameters and results are unchanged.

pub mod config;
pub mod dialect;
pub mod dispatcher;
pub mod entities;
pub mod entity;
pub mod error;
pub mod operation;
pub mod params;
pub mod response;
pub mod seed;
pub mod server;
pub mod statement;
pub mod store;
#[cfg(test)]
mod tests;
pub mod value;

// Re-export main server type
pub use server::CrudMcpServer;

pub use config::{ConfigError, CrudConfig, StoreConfig, Timeouts};
pub use dispatcher::Dispatcher;
pub use entity::EntitySpec;
pub use error::{CrudError, StoreError};
pub use operation::Operation;
pub use params::{CustomerCrudParams, ParamBag, ProductCrudParams};
pub use response::{CrudResponse, CrudResult, Record};

// Re-export EmbeddableMcp trait for in-process usage
pub use mcp_common::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
