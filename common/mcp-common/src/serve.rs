//! Transport runners
//!
//! Both runners take any rmcp `ServerHandler` and block until the client
//! disconnects (stdio) or the process receives Ctrl-C (HTTP).

use rmcp::{
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    },
    ServerHandler, ServiceExt,
};
use std::net::SocketAddr;

/// Serve `server` over stdin/stdout until the peer closes the stream.
pub async fn serve_stdio<S>(server: S) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running on stdio, waiting for requests...");

    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}

/// Serve `server` over streamable HTTP at `addr`, mounted under `path`.
///
/// Every MCP session gets its own clone of `server`, so per-session state
/// must live behind shared handles inside the server type.
pub async fn serve_http<S>(server: S, addr: SocketAddr, path: &str) -> anyhow::Result<()>
where
    S: ServerHandler + Clone + Send + Sync + 'static,
{
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );

    let router = match normalize_mount_path(path) {
        Some(mount) => axum::Router::new().nest_service(&mount, service),
        None => axum::Router::new().fallback_service(service),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, path, "Server running on streamable HTTP");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down");
    Ok(())
}

/// `None` means the service is mounted at the root.
fn normalize_mount_path(path: &str) -> Option<String> {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mount_path() {
        assert_eq!(normalize_mount_path("/mcp"), Some("/mcp".to_string()));
        assert_eq!(normalize_mount_path("mcp/"), Some("/mcp".to_string()));
        assert_eq!(
            normalize_mount_path("/streamable-http"),
            Some("/streamable-http".to_string())
        );
        assert_eq!(normalize_mount_path("/"), None);
        assert_eq!(normalize_mount_path(""), None);
    }
}
