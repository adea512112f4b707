//! Startup schema reset
//!
//! Drops and recreates an entity's table, then inserts its seed rows. Seed
//! inserts go through the same planner as tool calls.

use anyhow::Context;

use crate::entity::EntitySpec;
use crate::operation::Operation;
use crate::statement::{plan, Statement};
use crate::store::Store;

/// Statements that reset `entity` to its seed state on `store`
pub fn reset_statements(store: &dyn Store, entity: &EntitySpec) -> anyhow::Result<Vec<Statement>> {
    let dialect = store.dialect();
    let mut statements: Vec<Statement> = (entity.ddl)(dialect)
        .iter()
        .map(|sql| Statement::new(*sql, Vec::new()))
        .collect();

    for row in (entity.seed)() {
        let insert = plan(entity, Operation::Create, &row, dialect, store.scope())
            .with_context(|| format!("invalid seed row for {}", entity.table))?;
        statements.push(insert.statement);
    }

    Ok(statements)
}

/// Recreate `entity`'s table on `store` and insert its seed rows
pub async fn ensure_schema(store: &dyn Store, entity: &EntitySpec) -> anyhow::Result<()> {
    store
        .prepare()
        .await
        .with_context(|| format!("failed to prepare {} store", store.dialect().name()))?;

    let statements = reset_statements(store, entity)?;
    store
        .execute_batch(&statements)
        .await
        .with_context(|| format!("failed to reset table {}", entity.table))?;

    tracing::info!(
        table = entity.table,
        dialect = store.dialect().name(),
        rows = statements.len() - (entity.ddl)(store.dialect()).len(),
        "Table recreated and seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SqliteConfig, Timeouts};
    use crate::entities::{CUSTOMER, PRODUCT};
    use crate::statement::Expect;
    use crate::store::SqliteStore;

    fn store(dir: &tempfile::TempDir) -> SqliteStore {
        SqliteStore::new(
            &SqliteConfig {
                path: dir.path().join("seed.db"),
            },
            Timeouts::default(),
        )
    }

    #[test]
    fn test_reset_statements_drop_create_then_insert() {
        let dir = tempfile::tempdir().unwrap();
        let statements = reset_statements(&store(&dir), &PRODUCT).unwrap();

        assert_eq!(statements.len(), 4);
        assert!(statements[0].sql.starts_with("DROP TABLE IF EXISTS products"));
        assert!(statements[1].sql.contains("CREATE TABLE products"));
        assert!(statements[2].sql.starts_with("INSERT INTO products"));
        assert_eq!(statements[2].params.len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_schema_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        ensure_schema(&store, &CUSTOMER).await.unwrap();
        ensure_schema(&store, &CUSTOMER).await.unwrap();

        let read = plan(
            &CUSTOMER,
            Operation::Read,
            &Default::default(),
            store.dialect(),
            store.scope(),
        )
        .unwrap();
        let Expect::Rows(columns) = read.expect else {
            panic!("read should fetch rows");
        };
        let rows = store.fetch(&read.statement, columns).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
