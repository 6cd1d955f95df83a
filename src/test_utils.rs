//! Shared test utilities for `Tallybook`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        alerts::NotificationSink,
        gateway::{MutationGateway, MutationPayload, Operation},
    },
    entities::{budget, inventory_item, transaction},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Creates an in-memory `SQLite` database with all tables initialized and the
/// default tab seeded. This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    crate::core::ledger::seed_default_tab(&db).await?;
    Ok(db)
}

/// Sets up a test database plus a mutation gateway over it.
/// Returns (db, gateway) for the common mutation-path test scenario.
pub async fn setup_with_gateway() -> Result<(DatabaseConnection, MutationGateway)> {
    let db = setup_test_db().await?;
    let gateway = MutationGateway::new(db.clone());
    Ok((db, gateway))
}

/// Builds an unsaved budget value with id and version left for the store.
pub fn test_budget(category: &str, limit_amount: f64) -> budget::Model {
    budget::Model {
        id: 0,
        category: category.to_string(),
        limit_amount,
        version: 0,
    }
}

/// Builds an unsaved personal-kind transaction value.
///
/// # Defaults
/// * `title`: "Test transaction"
/// * `kind`: "personal"
/// * `tab_name`: "General"
/// * `date`: now
pub fn test_transaction(category: &str, amount: f64) -> transaction::Model {
    transaction::Model {
        id: 0,
        date: chrono::Utc::now(),
        amount,
        category: category.to_string(),
        title: "Test transaction".to_string(),
        kind: transaction::KIND_PERSONAL.to_string(),
        tab_name: "General".to_string(),
        version: 0,
    }
}

/// Builds an unsaved inventory item value.
///
/// # Defaults
/// * `description`: "Test item"
/// * `category`: "Stock"
/// * `tab_id`: 1 (the seeded "General" tab)
pub fn test_inventory_item(name: &str, quantity: i32, unit_cost: f64) -> inventory_item::Model {
    inventory_item::Model {
        id: 0,
        name: name.to_string(),
        description: "Test item".to_string(),
        quantity,
        unit_cost,
        category: "Stock".to_string(),
        tab_id: 1,
        notes: None,
        version: 0,
    }
}

/// Inserts an inventory item through the gateway, returning its id.
pub async fn insert_test_item(
    gateway: &MutationGateway,
    name: &str,
    quantity: i32,
    unit_cost: f64,
) -> Result<i64> {
    gateway
        .apply(
            Operation::Insert,
            MutationPayload::InventoryItem(test_inventory_item(name, quantity, unit_cost)),
        )
        .await
}

/// Notification sink that collects alerts for assertions.
#[derive(Default)]
pub struct CollectingNotifier {
    alerts: Mutex<Vec<(String, String)>>,
}

impl CollectingNotifier {
    /// All (title, message) pairs delivered so far, in order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.alerts.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl NotificationSink for CollectingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut guard) = self.alerts.lock() {
            guard.push((title.to_string(), message.to_string()));
        }
    }
}
