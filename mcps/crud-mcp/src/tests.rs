//! End-to-end tests for crud-mcp against a seeded SQLite file

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::super::config::{CrudConfig, SqliteConfig, StoreConfig, Timeouts};
    use super::super::response::CrudResponse;
    use super::super::server::CrudMcpServer;
    use super::super::statement::Statement;
    use super::super::store::open;
    use mcp_common::EmbeddableMcp;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Seeded server over a fresh SQLite file
    async fn create_test_server() -> (tempfile::TempDir, CrudMcpServer) {
        let dir = tempfile::tempdir().unwrap();
        let server = CrudMcpServer::from_config(&CrudConfig::sqlite(dir.path().join("crud.db")));
        server.seed().await.unwrap();
        (dir, server)
    }

    async fn call(server: &CrudMcpServer, tool: &str, params: Value) -> CrudResponse {
        let result = server.call_tool(tool, params).await.unwrap();
        assert!(!result.is_error.unwrap_or(false));
        let text = result.content[0].as_text().unwrap().text.clone();
        serde_json::from_str(&text).unwrap()
    }

    async fn rows(server: &CrudMcpServer, tool: &str) -> Vec<Value> {
        let response = call(server, tool, json!({ "operation": "read" })).await;
        response
            .records()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    #[tokio::test]
    async fn test_seeded_rows_in_key_order() {
        let (_dir, server) = create_test_server().await;

        let customers = rows(&server, "customer_crud").await;
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0]["Name"], "Alice");
        assert_eq!(customers[1]["Name"], "Bob");
        assert!(customers[0]["Id"].as_i64().unwrap() < customers[1]["Id"].as_i64().unwrap());

        // ISO 8601 UTC
        let created = customers[0]["CreatedAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
        assert!(created.ends_with('Z'));

        let products = rows(&server, "product_crud").await;
        assert_eq!(products[0]["name"], "Widget");
        assert_eq!(products[0]["price"], json!(9.99));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let (_dir, server) = create_test_server().await;

        let response = call(&server, "customer_crud", json!({ "operation": "upsert" })).await;
        assert_eq!(response.sql, None);
        assert_eq!(response.message(), Some("❌ Unknown operation 'upsert'."));

        // Matching is case-sensitive
        let response = call(&server, "customer_crud", json!({ "operation": "READ" })).await;
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn test_validation_failure_inserts_nothing() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "create", "name": "Carol" }),
        )
        .await;
        assert_eq!(response.sql, None);
        assert_eq!(
            response.message(),
            Some("❌ 'name' and 'email' required for create.")
        );
        assert_eq!(rows(&server, "customer_crud").await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "create", "name": "Carol", "email": "carol@example.com" }),
        )
        .await;
        assert_eq!(
            response.sql.as_deref(),
            Some("INSERT INTO Customers (Name, Email) VALUES (?, ?)")
        );
        assert_eq!(response.message(), Some("✅ Customer 'Carol' added."));
        assert_eq!(response.rows_affected, None);

        let customers = rows(&server, "customer_crud").await;
        assert_eq!(customers.len(), 3);
        assert_eq!(customers[2]["Name"], "Carol");
        assert!(customers[2]["Id"].as_i64().unwrap() > customers[1]["Id"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_missing_description_reads_as_empty_string() {
        let (_dir, server) = create_test_server().await;

        call(
            &server,
            "product_crud",
            json!({ "operation": "create", "name": "Sprocket", "price": 3.5 }),
        )
        .await;

        let products = rows(&server, "product_crud").await;
        let sprocket = products.iter().find(|p| p["name"] == "Sprocket").unwrap();
        assert_eq!(sprocket["description"], "");
        assert_eq!(sprocket["price"], json!(3.5));
    }

    #[tokio::test]
    async fn test_update_changes_only_the_target() {
        let (_dir, server) = create_test_server().await;
        let before = rows(&server, "customer_crud").await;
        let bob_id = before[1]["Id"].as_i64().unwrap();

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "update", "customer_id": bob_id, "new_email": "bob@new.example" }),
        )
        .await;
        assert_eq!(
            response.message().map(String::from),
            Some(format!("✅ Customer id={} updated.", bob_id))
        );
        assert_eq!(response.rows_affected, Some(1));

        let after = rows(&server, "customer_crud").await;
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1]["Email"], "bob@new.example");
        assert_eq!(after[1]["Name"], before[1]["Name"]);
        assert_eq!(after[1]["CreatedAt"], before[1]["CreatedAt"]);
    }

    #[tokio::test]
    async fn test_update_missing_row_still_succeeds() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "product_crud",
            json!({ "operation": "update", "product_id": 999, "new_price": 1.0 }),
        )
        .await;
        assert!(!response.is_error());
        assert_eq!(response.rows_affected, Some(0));
    }

    #[tokio::test]
    async fn test_delete_product_by_name() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "product_crud",
            json!({ "operation": "delete", "name": "Widget" }),
        )
        .await;
        assert_eq!(
            response.sql.as_deref(),
            Some("DELETE FROM products WHERE name = ?")
        );
        assert_eq!(response.message(), Some("✅ Product 'Widget' deleted."));

        let products = rows(&server, "product_crud").await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["name"], "Gadget");
    }

    #[tokio::test]
    async fn test_delete_prefers_id_over_name() {
        let (_dir, server) = create_test_server().await;
        let products = rows(&server, "product_crud").await;
        let gadget_id = products[1]["id"].as_i64().unwrap();

        // Name points at Widget, id at Gadget; the id wins
        call(
            &server,
            "product_crud",
            json!({ "operation": "delete", "product_id": gadget_id, "name": "Widget" }),
        )
        .await;

        let remaining = rows(&server, "product_crud").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["name"], "Widget");
    }

    #[tokio::test]
    async fn test_describe_lists_columns_in_order() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "product_crud",
            json!({ "operation": "describe", "table_name": "products" }),
        )
        .await;
        let columns = response.records().unwrap();
        let names: Vec<&str> = columns
            .iter()
            .map(|c| c["column"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["id", "name", "price", "description"]);
        assert_eq!(columns[1]["nullable"], "NO");
        assert_eq!(columns[3]["nullable"], "YES");

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "describe", "table_name": "no_such_table" }),
        )
        .await;
        assert_eq!(response.records().map(|r| r.len()), Some(0));
    }

    #[tokio::test]
    async fn test_limit_caps_rows() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "read", "limit": 1 }),
        )
        .await;
        let records = response.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Name"], "Alice");

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "read", "limit": -1 }),
        )
        .await;
        assert_eq!(
            response.message(),
            Some("❌ 'limit' must be a positive integer.")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_id_is_rejected() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "customer_crud",
            json!({ "operation": "delete", "customer_id": u64::MAX }),
        )
        .await;
        assert_eq!(response.sql, None);
        assert_eq!(
            response.message(),
            Some("❌ 'customer_id' must be a positive integer.")
        );
        assert_eq!(rows(&server, "customer_crud").await.len(), 2);
    }

    #[tokio::test]
    async fn test_price_beyond_real_range_is_not_stored() {
        let (_dir, server) = create_test_server().await;

        let response = call(
            &server,
            "product_crud",
            json!({ "operation": "create", "name": "Huge", "price": "1e400" }),
        )
        .await;
        assert_eq!(
            response.sql.as_deref(),
            Some("INSERT INTO products (name, price, description) VALUES (?, ?, ?)")
        );
        assert!(response
            .message()
            .unwrap()
            .starts_with("❌ Execution failed: could not bind parameter:"));

        let products = rows(&server, "product_crud").await;
        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p["price"].is_number()));
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_table() {
        let (_dir, server) = create_test_server().await;
        let before = rows(&server, "product_crud").await;

        call(
            &server,
            "product_crud",
            json!({ "operation": "create", "name": "Temp", "price": "2.25", "description": "short-lived" }),
        )
        .await;
        let during = rows(&server, "product_crud").await;
        let temp_id = during[2]["id"].as_i64().unwrap();

        let response = call(
            &server,
            "product_crud",
            json!({ "operation": "delete", "product_id": temp_id }),
        )
        .await;
        assert_eq!(response.rows_affected, Some(1));
        assert_eq!(rows(&server, "product_crud").await, before);
    }

    #[tokio::test]
    async fn test_hostile_values_are_stored_verbatim() {
        let (_dir, server) = create_test_server().await;
        let hostile = "Robert'); DROP TABLE Customers;--";

        call(
            &server,
            "customer_crud",
            json!({ "operation": "create", "name": hostile, "email": "x@example.com" }),
        )
        .await;

        let customers = rows(&server, "customer_crud").await;
        assert_eq!(customers.len(), 3);
        assert_eq!(customers[2]["Name"], hostile);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let (_dir, server) = create_test_server().await;
        let server = Arc::new(server);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let server = server.clone();
                tokio::spawn(async move {
                    call(
                        &server,
                        "customer_crud",
                        json!({
                            "operation": "create",
                            "name": format!("User {}", i),
                            "email": format!("user{}@example.com", i)
                        }),
                    )
                    .await
                })
            })
            .collect();

        for handle in handles {
            assert!(!handle.await.unwrap().is_error());
        }

        let customers = rows(&server, "customer_crud").await;
        assert_eq!(customers.len(), 10);
        let mut ids: Vec<i64> = customers.iter().map(|c| c["Id"].as_i64().unwrap()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_store_error_is_returned_as_data() {
        let (dir, server) = create_test_server().await;

        // Drop the table out from under the server
        let store = open(
            &StoreConfig::Sqlite(SqliteConfig {
                path: dir.path().join("crud.db"),
            }),
            Timeouts::default(),
        );
        store
            .execute(&Statement::new("DROP TABLE products", Vec::new()))
            .await
            .unwrap();

        let response = call(&server, "product_crud", json!({ "operation": "read" })).await;
        assert!(response.is_error());
        assert!(response.sql.is_some());
        assert!(response
            .message()
            .unwrap()
            .starts_with("❌ Execution failed:"));
    }
}
