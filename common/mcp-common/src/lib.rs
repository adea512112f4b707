//! MCP Common - Shared plumbing for MCP servers
//!
//! - **Initialization**: [`init_tracing`] sets up stderr logging
//! - **Transports**: [`serve_stdio`] and [`serve_http`] run any rmcp
//!   `ServerHandler` until shutdown
//! - **Results**: [`json_success`] wraps serializable data as tool output
//! - **Embeddable**: [`EmbeddableMcp`] for calling tools in-process
//!
//! # Example
//!
//! ```rust,ignore
//! mcp_common::init_tracing("my_mcp")?;
//! let server = MyServer::new();
//! mcp_common::serve_stdio(server).await?;
//! ```

pub mod embeddable;
pub mod init;
pub mod result;
pub mod serve;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use init::init_tracing;
pub use result::json_success;
pub use serve::{serve_http, serve_stdio};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
