//! Transaction entity - Represents all financial activity in the ledger.
//!
//! Each transaction carries a date, amount, category, title, a `kind`
//! distinguishing personal spend from inventory movements, and the name of the
//! tab it was recorded under.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction kind for personal (out-of-pocket) spend
pub const KIND_PERSONAL: &str = "personal";
/// Transaction kind for inventory movements (sales, restocks)
pub const KIND_INVENTORY: &str = "inventory";

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the transaction took place
    pub date: DateTimeUtc,
    /// Transaction amount
    pub amount: f64,
    /// Spending category, matched against budget categories by string equality
    pub category: String,
    /// Human-readable title of the transaction
    pub title: String,
    /// Ledger semantics: [`KIND_PERSONAL`] or [`KIND_INVENTORY`]
    pub kind: String,
    /// Name of the tab this transaction was recorded under
    pub tab_name: String,
    /// Optimistic-lock counter, bumped on every update
    pub version: i32,
}

/// Transactions reference budgets and tabs by name only, no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
