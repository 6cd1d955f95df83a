//! Tab entity - A logical grouping label for ledger rows.
//!
//! A "General" tab is seeded at first run if no tabs exist. Tabs are not part
//! of the audited mutation path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the tab seeded at first run
pub const DEFAULT_TAB_NAME: &str = "General";

/// Tab database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tabs")]
pub struct Model {
    /// Unique identifier for the tab
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name of the tab
    pub name: String,
}

/// Defines relationships between tabs and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One tab groups many inventory items
    #[sea_orm(has_many = "super::inventory_item::Entity")]
    InventoryItems,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
