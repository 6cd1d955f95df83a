//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod alert_state;
pub mod budget;
pub mod inventory_item;
pub mod log_entry;
pub mod tab;
pub mod transaction;

// Re-export specific types to avoid conflicts
pub use alert_state::{Column as AlertStateColumn, Entity as AlertState, Model as AlertStateModel};
pub use budget::{Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use inventory_item::{
    Column as InventoryItemColumn, Entity as InventoryItem, Model as InventoryItemModel,
};
pub use log_entry::{Column as LogEntryColumn, Entity as LogEntry, Model as LogEntryModel};
pub use tab::{Column as TabColumn, Entity as Tab, Model as TabModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
