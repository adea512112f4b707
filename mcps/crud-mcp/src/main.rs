//! CRUD MCP Server
//!
//! Exposes `customer_crud` (MySQL by default) and `product_crud`
//! (PostgreSQL by default) over stdio or streamable HTTP. Both tables are
//! dropped, recreated and seeded at startup unless `--skip-seed` is given.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

use crud_mcp::{CrudConfig, CrudMcpServer};

#[derive(Parser)]
#[command(name = "crud-mcp")]
#[command(about = "MCP server with CRUD tools over MySQL, PostgreSQL and SQLite tables")]
struct Cli {
    /// Transport to serve MCP over
    #[arg(long, env = "CRUD_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Listen address for the HTTP transport
    #[arg(long, env = "CRUD_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Mount path for the HTTP transport
    #[arg(long, env = "CRUD_HTTP_PATH", default_value = "/mcp")]
    path: String,

    /// Keep existing tables instead of recreating and seeding them
    #[arg(long, env = "CRUD_SKIP_SEED")]
    skip_seed: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    mcp_common::init_tracing("crud_mcp")?;

    let config = CrudConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "Starting CRUD MCP server");

    let server = CrudMcpServer::from_config(&config);

    if cli.skip_seed {
        tracing::info!("Skipping table reset");
    } else {
        server.seed().await?;
    }

    match cli.transport {
        Transport::Stdio => mcp_common::serve_stdio(server).await?,
        Transport::Http => mcp_common::serve_http(server, cli.bind, &cli.path).await?,
    }

    tracing::info!("CRUD MCP server stopped");

    Ok(())
}
