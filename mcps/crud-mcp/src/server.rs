//! MCP Server exposing one CRUD tool per entity
//!
//! Each tool flattens its typed parameters into a bag and hands it to the
//! entity's dispatcher. The dispatcher's response record is always the tool
//! result; failures are reported inside it, not as MCP errors.

use mcp_common::{
    async_trait, json_success, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::CrudConfig;
use crate::dispatcher::Dispatcher;
use crate::entities::{CUSTOMER, PRODUCT};
use crate::params::{to_bag, CustomerCrudParams, ProductCrudParams};
use crate::seed;
use crate::store;

/// The CRUD MCP Server
#[derive(Clone)]
pub struct CrudMcpServer {
    customers: Arc<Dispatcher>,
    products: Arc<Dispatcher>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CrudMcpServer {
    pub fn new(customers: Dispatcher, products: Dispatcher) -> Self {
        Self {
            customers: Arc::new(customers),
            products: Arc::new(products),
            tool_router: Self::tool_router(),
        }
    }

    /// Wire both entities to the stores named in `config`
    pub fn from_config(config: &CrudConfig) -> Self {
        Self::new(
            Dispatcher::new(&CUSTOMER, store::open(&config.customers, config.timeouts)),
            Dispatcher::new(&PRODUCT, store::open(&config.products, config.timeouts)),
        )
    }

    /// Drop, recreate and seed both tables
    pub async fn seed(&self) -> anyhow::Result<()> {
        for dispatcher in [&self.customers, &self.products] {
            seed::ensure_schema(dispatcher.store(), dispatcher.entity()).await?;
        }
        Ok(())
    }

    #[tool(
        description = "Create, read, update, delete or describe customers in the Customers table. \
                       create needs name and email; read takes an optional limit; \
                       update needs customer_id and new_email; delete needs customer_id; \
                       describe needs table_name. Returns {sql, result}."
    )]
    async fn customer_crud(
        &self,
        Parameters(params): Parameters<CustomerCrudParams>,
    ) -> Result<CallToolResult, McpError> {
        run(&self.customers, &params.operation, &params).await
    }

    #[tool(
        description = "Create, read, update, delete or describe products in the products table. \
                       create needs name and price (description optional); read takes an optional limit; \
                       update needs product_id and new_price; delete needs product_id or name; \
                       describe needs table_name. Returns {sql, result}."
    )]
    async fn product_crud(
        &self,
        Parameters(params): Parameters<ProductCrudParams>,
    ) -> Result<CallToolResult, McpError> {
        run(&self.products, &params.operation, &params).await
    }
}

async fn run<P: Serialize>(
    dispatcher: &Dispatcher,
    operation: &str,
    params: &P,
) -> Result<CallToolResult, McpError> {
    let bag = to_bag(params).map_err(|e| McpError::invalid_params(e.to_string(), None))?;
    let response = dispatcher.dispatch(operation, &bag).await;
    json_success(&response)
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for CrudMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "CRUD MCP server. customer_crud manages the {} table on {}; \
                 product_crud manages the {} table on {}. \
                 Every call returns the SQL that ran and its result; \
                 results starting with ❌ are errors.",
                CUSTOMER.table,
                self.customers.store().dialect().name(),
                PRODUCT.table,
                self.products.store().dialect().name(),
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for CrudMcpServer {
    fn server_name(&self) -> &str {
        "crud"
    }

    fn server_description(&self) -> Option<&str> {
        Some("CRUD tools over the Customers and products demonstration tables.")
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "customer_crud" => {
                let params: CustomerCrudParams = serde_json::from_value(params)?;
                self.customer_crud(Parameters(params)).await.map_err(Into::into)
            }
            "product_crud" => {
                let params: ProductCrudParams = serde_json::from_value(params)?;
                self.product_crud(Parameters(params)).await.map_err(Into::into)
            }
            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
