//! Ledger store queries - typed read access to every ledger table.
//!
//! Each function materializes a fresh result from the current store state per
//! call; nothing here caches. Writes to the audited tables go through the
//! mutation gateway, never through this module. Tabs sit outside the audit
//! trail, so their create/delete operations live here.

use crate::{
    entities::{
        Budget, InventoryItem, Tab, Transaction, budget, inventory_item, tab, transaction,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};

/// Retrieves all budgets.
pub async fn get_all_budgets(db: &DatabaseConnection) -> Result<Vec<budget::Model>> {
    Budget::find().all(db).await.map_err(Into::into)
}

/// Finds a budget by its unique ID.
pub async fn get_budget_by_id(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Option<budget::Model>> {
    Budget::find_by_id(budget_id).one(db).await.map_err(Into::into)
}

/// Retrieves all budgets for a category.
///
/// Category is a soft key: more than one budget may share a category, and a
/// category with no budget at all is valid (unbudgeted spend).
pub async fn get_budgets_by_category(
    db: &DatabaseConnection,
    category: &str,
) -> Result<Vec<budget::Model>> {
    Budget::find()
        .filter(budget::Column::Category.eq(category))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions.
pub async fn get_all_transactions(db: &DatabaseConnection) -> Result<Vec<transaction::Model>> {
    Transaction::find().all(db).await.map_err(Into::into)
}

/// Finds a transaction by its unique ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions of a given kind ("personal" or "inventory").
pub async fn get_transactions_by_kind(
    db: &DatabaseConnection,
    kind: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::Kind.eq(kind))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions in a category.
pub async fn get_transactions_by_category(
    db: &DatabaseConnection,
    category: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::Category.eq(category))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions recorded under a tab.
pub async fn get_transactions_by_tab(
    db: &DatabaseConnection,
    tab_name: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::TabName.eq(tab_name))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all inventory items.
pub async fn get_all_inventory(db: &DatabaseConnection) -> Result<Vec<inventory_item::Model>> {
    InventoryItem::find().all(db).await.map_err(Into::into)
}

/// Finds an inventory item by its unique ID.
pub async fn get_inventory_item_by_id(
    db: &DatabaseConnection,
    item_id: i64,
) -> Result<Option<inventory_item::Model>> {
    InventoryItem::find_by_id(item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Searches inventory items by substring over name and description.
pub async fn search_inventory(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<inventory_item::Model>> {
    let pattern = format!("%{query}%");
    InventoryItem::find()
        .filter(
            Condition::any()
                .add(inventory_item::Column::Name.like(&pattern))
                .add(inventory_item::Column::Description.like(&pattern)),
        )
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all inventory items in a category.
pub async fn get_inventory_by_category(
    db: &DatabaseConnection,
    category: &str,
) -> Result<Vec<inventory_item::Model>> {
    InventoryItem::find()
        .filter(inventory_item::Column::Category.eq(category))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all tabs, ordered alphabetically by name.
pub async fn get_all_tabs(db: &DatabaseConnection) -> Result<Vec<tab::Model>> {
    Tab::find()
        .order_by_asc(tab::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a tab by its unique ID.
pub async fn get_tab_by_id(db: &DatabaseConnection, tab_id: i64) -> Result<Option<tab::Model>> {
    Tab::find_by_id(tab_id).one(db).await.map_err(Into::into)
}

/// Creates a new tab with the given name, rejecting blank names.
pub async fn create_tab(db: &DatabaseConnection, name: &str) -> Result<tab::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Tab name cannot be empty"));
    }

    let model = tab::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Deletes a tab by ID, returning `NotFound` if it does not exist.
pub async fn delete_tab(db: &DatabaseConnection, tab_id: i64) -> Result<()> {
    let result = Tab::delete_by_id(tab_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: "Tab",
            id: tab_id,
        });
    }
    Ok(())
}

/// Seeds the default "General" tab if no tabs exist yet.
///
/// Called once at startup; calling it again is a no-op as long as at least
/// one tab remains.
pub async fn seed_default_tab(db: &DatabaseConnection) -> Result<()> {
    let existing = Tab::find().one(db).await?;
    if existing.is_none() {
        let model = tab::ActiveModel {
            name: Set(tab::DEFAULT_TAB_NAME.to_string()),
            ..Default::default()
        };
        model.insert(db).await?;
        tracing::info!("Seeded default tab {:?}", tab::DEFAULT_TAB_NAME);
    }
    Ok(())
}
