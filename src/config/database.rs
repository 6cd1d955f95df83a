//! Database connection and table creation using `SeaORM`.
//!
//! The connection is constructed once at process start and passed by
//! reference to every component that needs it; there is no process-wide
//! singleton handle. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without manual SQL.

use crate::entities::{AlertState, Budget, InventoryItem, LogEntry, Tab, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the ledger database at the given URL.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all ledger tables from the entity definitions.
///
/// Safe to call on a fresh database only; existing tables are not migrated.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let budget_table = schema.create_table_from_entity(Budget);
    let transaction_table = schema.create_table_from_entity(Transaction);
    let inventory_table = schema.create_table_from_entity(InventoryItem);
    let tab_table = schema.create_table_from_entity(Tab);
    let log_table = schema.create_table_from_entity(LogEntry);
    let alert_state_table = schema.create_table_from_entity(AlertState);

    db.execute(builder.build(&budget_table)).await?;
    db.execute(builder.build(&transaction_table)).await?;
    db.execute(builder.build(&inventory_table)).await?;
    db.execute(builder.build(&tab_table)).await?;
    db.execute(builder.build(&log_table)).await?;
    db.execute(builder.build(&alert_state_table)).await?;

    Ok(())
}
