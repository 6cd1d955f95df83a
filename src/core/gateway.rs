//! Mutation gateway - the single audited mutation path for ledger entities.
//!
//! Every write to budgets, transactions, and inventory goes through
//! [`MutationGateway::apply`]: domain validation first, then the entity write
//! and the audit record inside one database transaction. Either both commit
//! or neither is applied, so the audit trail can never drift from the store.
//! Committed mutations are announced on a broadcast channel that the reactive
//! view layer listens on; the publish happens after commit, outside the
//! transaction, so it never holds the table lock.
//!
//! Updates use optimistic locking on the entity's `version` column: a caller
//! holding a stale row gets [`Error::Conflict`] instead of silently
//! overwriting a concurrent change.

use crate::{
    core::audit,
    entities::{
        Budget, InventoryItem, Transaction, budget, inventory_item,
        log_entry::{OP_DELETE, OP_INSERT, OP_UPDATE},
        transaction,
    },
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tokio::sync::broadcast;

/// Capacity of the committed-change broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The operation half of a mutation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Insert a new row; the store assigns the id
    Insert,
    /// Update an existing row, checked against its version
    Update,
    /// Delete an existing row
    Delete,
}

impl Operation {
    /// The operation type string recorded in the audit log.
    #[must_use]
    pub const fn audit_op(self) -> &'static str {
        match self {
            Operation::Insert => OP_INSERT,
            Operation::Update => OP_UPDATE,
            Operation::Delete => OP_DELETE,
        }
    }
}

/// The audited entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A spending limit for a category
    Budget,
    /// A ledger transaction
    Transaction,
    /// A stocked inventory item
    InventoryItem,
}

impl EntityKind {
    /// The entity name recorded in the audit log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Budget => "Budget",
            EntityKind::Transaction => "Transaction",
            EntityKind::InventoryItem => "InventoryItem",
        }
    }
}

/// A fully-formed entity value submitted for mutation
#[derive(Debug, Clone)]
pub enum MutationPayload {
    /// Budget row
    Budget(budget::Model),
    /// Transaction row
    Transaction(transaction::Model),
    /// Inventory item row
    InventoryItem(inventory_item::Model),
}

impl MutationPayload {
    /// The entity kind this payload mutates.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            MutationPayload::Budget(_) => EntityKind::Budget,
            MutationPayload::Transaction(_) => EntityKind::Transaction,
            MutationPayload::InventoryItem(_) => EntityKind::InventoryItem,
        }
    }
}

/// Notification of one committed mutation, published after commit.
///
/// Carries only the row id, not the mutated value: subscribers recompute
/// from current store state, so a value snapshot here would already be
/// stale under concurrent mutations and never get read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Which entity kind was mutated
    pub kind: EntityKind,
    /// What was done to it
    pub op: Operation,
    /// The id of the mutated row
    pub entity_id: i64,
}

/// The single audited mutation path over a shared ledger database.
///
/// Cheap to clone; the connection and event channel are shared handles.
#[derive(Clone)]
pub struct MutationGateway {
    db: DatabaseConnection,
    events: broadcast::Sender<ChangeEvent>,
}

impl MutationGateway {
    /// Creates a gateway over the given connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { db, events }
    }

    /// The underlying database connection, for read-side collaborators.
    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Subscribes to committed-change notifications.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Applies one audited mutation atomically.
    ///
    /// Validates domain constraints before touching the store, then performs
    /// the entity write and audit record in a single database transaction.
    /// On success the committed change is broadcast to view subscribers and
    /// the affected row id is returned.
    ///
    /// # Errors
    /// * [`Error::Validation`] - rejected before any write
    /// * [`Error::NotFound`] - update/delete targets a missing row
    /// * [`Error::Conflict`] - the row changed since the caller fetched it
    /// * [`Error::Storage`] - persistence failure, no partial state left
    pub async fn apply(&self, op: Operation, payload: MutationPayload) -> Result<i64> {
        validate(op, &payload)?;

        let kind = payload.kind();
        let txn = self.db.begin().await?;
        let (entity_id, details) = match payload {
            MutationPayload::Budget(model) => write_budget(&txn, op, model).await?,
            MutationPayload::Transaction(model) => write_transaction(&txn, op, model).await?,
            MutationPayload::InventoryItem(model) => write_inventory_item(&txn, op, model).await?,
        };
        audit::record(&txn, kind.as_str(), entity_id, op.audit_op(), Some(details)).await?;
        txn.commit().await?;

        self.publish(ChangeEvent {
            kind,
            op,
            entity_id,
        });
        Ok(entity_id)
    }

    /// Records an inventory movement: adjusts the item's stock level and
    /// books the matching inventory-kind transaction, as one atomic unit.
    ///
    /// `quantity_sold` is subtracted from the item's quantity; a negative
    /// value restocks. The transaction amount is `unit_cost * quantity_sold`.
    /// Both halves are audited (an UPDATE for the item, an INSERT for the
    /// transaction) inside the same database transaction.
    ///
    /// # Errors
    /// Rejects with [`Error::Validation`] before any write if the movement
    /// would drive the stock level negative, and with [`Error::NotFound`] if
    /// the item does not exist. Returns the id of the booked transaction.
    pub async fn record_inventory_sale(&self, item_id: i64, quantity_sold: i32) -> Result<i64> {
        if quantity_sold == 0 {
            return Err(Error::validation("Quantity change cannot be zero"));
        }

        let txn = self.db.begin().await?;

        let item = InventoryItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound {
                entity: "InventoryItem",
                id: item_id,
            })?;

        // checked_sub also catches an extreme restock overflowing i32
        let new_quantity = item.quantity.checked_sub(quantity_sold);
        let new_quantity = match new_quantity {
            Some(quantity) if quantity >= 0 => quantity,
            _ => {
                return Err(Error::validation(format!(
                    "Inventory quantity cannot be negative: {} on hand, {} requested",
                    item.quantity, quantity_sold
                )));
            }
        };

        let tab_name = crate::entities::Tab::find_by_id(item.tab_id)
            .one(&txn)
            .await?
            .map_or_else(
                || crate::entities::tab::DEFAULT_TAB_NAME.to_string(),
                |tab| tab.name,
            );

        let updated = InventoryItem::update_many()
            .col_expr(inventory_item::Column::Quantity, Expr::value(new_quantity))
            .col_expr(inventory_item::Column::Version, Expr::value(item.version + 1))
            .filter(inventory_item::Column::Id.eq(item.id))
            .filter(inventory_item::Column::Version.eq(item.version))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(Error::Conflict {
                entity: "InventoryItem",
                id: item.id,
            });
        }
        audit::record(
            &txn,
            EntityKind::InventoryItem.as_str(),
            item.id,
            OP_UPDATE,
            Some(format!(
                "Item name: {}, quantity: {new_quantity}",
                item.name
            )),
        )
        .await?;

        let amount = item.unit_cost * f64::from(quantity_sold);
        let title = format!("Sale: {} x{quantity_sold}", item.name);
        let booked = transaction::ActiveModel {
            date: Set(chrono::Utc::now()),
            amount: Set(amount),
            category: Set(item.category.clone()),
            title: Set(title.clone()),
            kind: Set(transaction::KIND_INVENTORY.to_string()),
            tab_name: Set(tab_name),
            version: Set(0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        audit::record(
            &txn,
            EntityKind::Transaction.as_str(),
            booked.id,
            OP_INSERT,
            Some(format!("Title: {title}, Amount: {amount}")),
        )
        .await?;

        txn.commit().await?;

        self.publish(ChangeEvent {
            kind: EntityKind::InventoryItem,
            op: Operation::Update,
            entity_id: item.id,
        });
        self.publish(ChangeEvent {
            kind: EntityKind::Transaction,
            op: Operation::Insert,
            entity_id: booked.id,
        });
        Ok(booked.id)
    }

    fn publish(&self, event: ChangeEvent) {
        // A send error only means no subscriber is currently listening
        let _ = self.events.send(event);
    }
}

/// Checks domain constraints before any write is attempted.
///
/// Deletes are exempt from field checks; they only need a valid target id,
/// and the caller passes the row as it was fetched.
fn validate(op: Operation, payload: &MutationPayload) -> Result<()> {
    if op == Operation::Delete {
        return Ok(());
    }
    match payload {
        MutationPayload::Budget(model) => {
            if model.category.trim().is_empty() {
                return Err(Error::validation("Budget category cannot be empty"));
            }
            if !model.limit_amount.is_finite() || model.limit_amount < 0.0 {
                return Err(Error::validation(format!(
                    "Budget limit must be a non-negative number, got {}",
                    model.limit_amount
                )));
            }
        }
        MutationPayload::Transaction(model) => {
            if model.title.trim().is_empty() {
                return Err(Error::validation("Transaction title cannot be empty"));
            }
            if model.category.trim().is_empty() {
                return Err(Error::validation("Transaction category cannot be empty"));
            }
            if !model.amount.is_finite() {
                return Err(Error::validation(format!(
                    "Transaction amount must be a finite number, got {}",
                    model.amount
                )));
            }
            if model.kind != transaction::KIND_PERSONAL && model.kind != transaction::KIND_INVENTORY
            {
                return Err(Error::validation(format!(
                    "Transaction kind must be {:?} or {:?}, got {:?}",
                    transaction::KIND_PERSONAL,
                    transaction::KIND_INVENTORY,
                    model.kind
                )));
            }
            if model.tab_name.trim().is_empty() {
                return Err(Error::validation("Transaction tab name cannot be empty"));
            }
        }
        MutationPayload::InventoryItem(model) => {
            if model.name.trim().is_empty() {
                return Err(Error::validation("Inventory item name cannot be empty"));
            }
            if model.quantity < 0 {
                return Err(Error::validation(format!(
                    "Inventory quantity cannot be negative, got {}",
                    model.quantity
                )));
            }
            if !model.unit_cost.is_finite() || model.unit_cost < 0.0 {
                return Err(Error::validation(format!(
                    "Inventory unit cost must be a non-negative number, got {}",
                    model.unit_cost
                )));
            }
            if model.category.trim().is_empty() {
                return Err(Error::validation("Inventory category cannot be empty"));
            }
        }
    }
    Ok(())
}

async fn write_budget(
    txn: &DatabaseTransaction,
    op: Operation,
    model: budget::Model,
) -> Result<(i64, String)> {
    let details = format!("Category: {}, Limit: {}", model.category, model.limit_amount);
    match op {
        Operation::Insert => {
            let inserted = budget::ActiveModel {
                category: Set(model.category),
                limit_amount: Set(model.limit_amount),
                version: Set(0),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            Ok((inserted.id, details))
        }
        Operation::Update => {
            let result = Budget::update_many()
                .col_expr(budget::Column::Category, Expr::value(model.category.clone()))
                .col_expr(budget::Column::LimitAmount, Expr::value(model.limit_amount))
                .col_expr(budget::Column::Version, Expr::value(model.version + 1))
                .filter(budget::Column::Id.eq(model.id))
                .filter(budget::Column::Version.eq(model.version))
                .exec(txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(stale_row_error("Budget", model.id, txn).await?);
            }
            Ok((model.id, details))
        }
        Operation::Delete => {
            let result = Budget::delete_by_id(model.id).exec(txn).await?;
            if result.rows_affected == 0 {
                return Err(Error::NotFound {
                    entity: "Budget",
                    id: model.id,
                });
            }
            Ok((model.id, details))
        }
    }
}

async fn write_transaction(
    txn: &DatabaseTransaction,
    op: Operation,
    model: transaction::Model,
) -> Result<(i64, String)> {
    let details = format!("Title: {}, Amount: {}", model.title, model.amount);
    match op {
        Operation::Insert => {
            let inserted = transaction::ActiveModel {
                date: Set(model.date),
                amount: Set(model.amount),
                category: Set(model.category),
                title: Set(model.title),
                kind: Set(model.kind),
                tab_name: Set(model.tab_name),
                version: Set(0),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            Ok((inserted.id, details))
        }
        Operation::Update => {
            let result = Transaction::update_many()
                .col_expr(transaction::Column::Date, Expr::value(model.date))
                .col_expr(transaction::Column::Amount, Expr::value(model.amount))
                .col_expr(transaction::Column::Category, Expr::value(model.category.clone()))
                .col_expr(transaction::Column::Title, Expr::value(model.title.clone()))
                .col_expr(transaction::Column::Kind, Expr::value(model.kind.clone()))
                .col_expr(transaction::Column::TabName, Expr::value(model.tab_name.clone()))
                .col_expr(transaction::Column::Version, Expr::value(model.version + 1))
                .filter(transaction::Column::Id.eq(model.id))
                .filter(transaction::Column::Version.eq(model.version))
                .exec(txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(stale_row_error("Transaction", model.id, txn).await?);
            }
            Ok((model.id, details))
        }
        Operation::Delete => {
            let result = Transaction::delete_by_id(model.id).exec(txn).await?;
            if result.rows_affected == 0 {
                return Err(Error::NotFound {
                    entity: "Transaction",
                    id: model.id,
                });
            }
            Ok((model.id, details))
        }
    }
}

async fn write_inventory_item(
    txn: &DatabaseTransaction,
    op: Operation,
    model: inventory_item::Model,
) -> Result<(i64, String)> {
    let details = format!("Item name: {}, quantity: {}", model.name, model.quantity);
    match op {
        Operation::Insert => {
            let inserted = inventory_item::ActiveModel {
                name: Set(model.name),
                description: Set(model.description),
                quantity: Set(model.quantity),
                unit_cost: Set(model.unit_cost),
                category: Set(model.category),
                tab_id: Set(model.tab_id),
                notes: Set(model.notes),
                version: Set(0),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            Ok((inserted.id, details))
        }
        Operation::Update => {
            let result = InventoryItem::update_many()
                .col_expr(inventory_item::Column::Name, Expr::value(model.name.clone()))
                .col_expr(
                    inventory_item::Column::Description,
                    Expr::value(model.description.clone()),
                )
                .col_expr(inventory_item::Column::Quantity, Expr::value(model.quantity))
                .col_expr(inventory_item::Column::UnitCost, Expr::value(model.unit_cost))
                .col_expr(
                    inventory_item::Column::Category,
                    Expr::value(model.category.clone()),
                )
                .col_expr(inventory_item::Column::TabId, Expr::value(model.tab_id))
                .col_expr(inventory_item::Column::Notes, Expr::value(model.notes.clone()))
                .col_expr(inventory_item::Column::Version, Expr::value(model.version + 1))
                .filter(inventory_item::Column::Id.eq(model.id))
                .filter(inventory_item::Column::Version.eq(model.version))
                .exec(txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(stale_row_error("InventoryItem", model.id, txn).await?);
            }
            Ok((model.id, details))
        }
        Operation::Delete => {
            let result = InventoryItem::delete_by_id(model.id).exec(txn).await?;
            if result.rows_affected == 0 {
                return Err(Error::NotFound {
                    entity: "InventoryItem",
                    id: model.id,
                });
            }
            Ok((model.id, details))
        }
    }
}

/// Distinguishes a vanished row from a version conflict after a zero-row
/// optimistic update. The surrounding transaction rolls back either way.
async fn stale_row_error(
    entity: &'static str,
    id: i64,
    txn: &DatabaseTransaction,
) -> Result<Error> {
    let exists = match entity {
        "Budget" => Budget::find_by_id(id).one(txn).await?.is_some(),
        "Transaction" => Transaction::find_by_id(id).one(txn).await?.is_some(),
        _ => InventoryItem::find_by_id(id).one(txn).await?.is_some(),
    };
    if exists {
        Ok(Error::Conflict { entity, id })
    } else {
        Ok(Error::NotFound { entity, id })
    }
}
