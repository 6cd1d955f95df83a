//! Inventory item entity - Represents stocked goods tracked by the ledger.
//!
//! Each item has a name, description, on-hand quantity, unit cost, category,
//! and the tab it belongs to. Quantity must never go negative; the mutation
//! gateway rejects any change that would produce a negative stock level.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the item (e.g., "Bottled Water")
    pub name: String,
    /// Free-form description of the item
    pub description: String,
    /// Units currently on hand, always >= 0
    pub quantity: i32,
    /// Cost per unit
    pub unit_cost: f64,
    /// Category label, matched against budget categories by string equality
    pub category: String,
    /// ID of the tab this item is grouped under
    pub tab_id: i64,
    /// Optional free-form notes
    pub notes: Option<String>,
    /// Optimistic-lock counter, bumped on every update
    pub version: i32,
}

/// Defines relationships between inventory items and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one tab
    #[sea_orm(
        belongs_to = "super::tab::Entity",
        from = "Column::TabId",
        to = "super::tab::Column::Id"
    )]
    Tab,
}

impl Related<super::tab::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tab.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
