//! In-process tool execution
//!
//! [`EmbeddableMcp`] lets a host (or a test) list and call a server's tools
//! directly, without a transport in between. Servers built on rmcp's
//! `#[tool_router]` implement it by delegating to their router for the tool
//! list and matching on the tool name for calls.
//!
//! ```rust,ignore
//! let server = CrudMcpServer::from_config(&config);
//! let result = server
//!     .call_tool("customer_crud", serde_json::json!({ "operation": "read" }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Errors from calling a tool in-process
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// No tool with this name is registered
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the tool's parameter type
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    /// The tool itself returned an MCP error
    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

/// Result type for embeddable MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server whose tools can be called in-process
///
/// Implementations must be `Send + Sync`; hosts call tools concurrently
/// from multiple tasks.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Server name, matching the name used in MCP client configuration
    fn server_name(&self) -> &str;

    /// All tools with their names, descriptions and input schemas
    fn list_tools(&self) -> Vec<Tool>;

    /// Call the tool `name` with a JSON object of arguments
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    /// Optional human-readable description
    fn server_description(&self) -> Option<&str> {
        None
    }
}
