//! Result helpers for MCP tool responses

use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
use serde::Serialize;

/// Wrap serializable data as a successful tool result
///
/// The payload is pretty-printed JSON in a single text content item.
/// Serialization failures surface as an MCP internal error.
///
/// ```rust,ignore
/// async fn my_tool(&self) -> Result<CallToolResult, McpError> {
///     json_success(&MyData { value: 42 })
/// }
/// ```
pub fn json_success<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
