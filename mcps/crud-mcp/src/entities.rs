//! The two demonstration tables

use serde_json::json;

use crate::dialect::Dialect;
use crate::entity::{EntitySpec, Field, OutputColumn};
use crate::params::ParamBag;
use crate::value::ValueKind;

// ============================================================================
// Customer
// ============================================================================

pub static CUSTOMER: EntitySpec = EntitySpec {
    label: "Customer",
    table: "Customers",
    key: Field::required("customer_id", "Id", ValueKind::Integer),
    display: "name",
    columns: &[
        OutputColumn::new("Id", ValueKind::Integer),
        OutputColumn::new("Name", ValueKind::Text),
        OutputColumn::new("Email", ValueKind::Text),
        OutputColumn::new("CreatedAt", ValueKind::Timestamp),
    ],
    create: &[
        Field::required("name", "Name", ValueKind::Text),
        Field::required("email", "Email", ValueKind::Text),
    ],
    update: Field::required("new_email", "Email", ValueKind::Text),
    alternate_key: None,
    ddl: customer_ddl,
    seed: customer_seed,
};

fn customer_ddl(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::MySql => &[
            "DROP TABLE IF EXISTS Customers",
            "CREATE TABLE Customers (
                Id        INT AUTO_INCREMENT PRIMARY KEY,
                Name      VARCHAR(100) NOT NULL,
                Email     VARCHAR(100) NOT NULL,
                CreatedAt TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        ],
        Dialect::Postgres => &[
            "DROP TABLE IF EXISTS Customers",
            "CREATE TABLE Customers (
                Id        SERIAL PRIMARY KEY,
                Name      VARCHAR(100) NOT NULL,
                Email     VARCHAR(100) NOT NULL,
                CreatedAt TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        ],
        Dialect::Sqlite => &[
            "DROP TABLE IF EXISTS Customers",
            "CREATE TABLE Customers (
                Id        INTEGER PRIMARY KEY AUTOINCREMENT,
                Name      TEXT NOT NULL,
                Email     TEXT NOT NULL,
                CreatedAt TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        ],
    }
}

fn customer_seed() -> Vec<ParamBag> {
    [
        json!({ "name": "Alice", "email": "alice@example.com" }),
        json!({ "name": "Bob", "email": "bob@example.com" }),
    ]
    .into_iter()
    .filter_map(|row| row.as_object().cloned())
    .collect()
}

// ============================================================================
// Product
// ============================================================================

pub static PRODUCT: EntitySpec = EntitySpec {
    label: "Product",
    table: "products",
    key: Field::required("product_id", "id", ValueKind::Integer),
    display: "name",
    columns: &[
        OutputColumn::new("id", ValueKind::Integer),
        OutputColumn::new("name", ValueKind::Text),
        OutputColumn::new("price", ValueKind::Decimal),
        OutputColumn::nullable("description", ValueKind::Text),
    ],
    create: &[
        Field::required("name", "name", ValueKind::Text),
        Field::required("price", "price", ValueKind::Decimal),
        Field::optional("description", "description", ValueKind::Text),
    ],
    update: Field::required("new_price", "price", ValueKind::Decimal),
    alternate_key: Some(Field::required("name", "name", ValueKind::Text)),
    ddl: product_ddl,
    seed: product_seed,
};

fn product_ddl(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::MySql => &[
            "DROP TABLE IF EXISTS products",
            "CREATE TABLE products (
                id          INT AUTO_INCREMENT PRIMARY KEY,
                name        VARCHAR(255) NOT NULL,
                price       DECIMAL(10,4) NOT NULL,
                description TEXT
            )",
        ],
        Dialect::Postgres => &[
            "DROP TABLE IF EXISTS products",
            "CREATE TABLE products (
                id          SERIAL PRIMARY KEY,
                name        TEXT NOT NULL,
                price       NUMERIC(10,4) NOT NULL,
                description TEXT
            )",
        ],
        Dialect::Sqlite => &[
            "DROP TABLE IF EXISTS products",
            "CREATE TABLE products (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                price       NUMERIC(10,4) NOT NULL,
                description TEXT
            )",
        ],
    }
}

fn product_seed() -> Vec<ParamBag> {
    [
        json!({ "name": "Widget", "price": 9.99, "description": "A standard widget." }),
        json!({ "name": "Gadget", "price": 14.99, "description": "A useful gadget." }),
    ]
    .into_iter()
    .filter_map(|row| row.as_object().cloned())
    .collect()
}
