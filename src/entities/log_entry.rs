//! Log entry entity - One immutable audit record per successful mutation.
//!
//! Rows are append-only: the audit logger inserts them and nothing ever
//! updates or deletes them. The autoincrement id gives a total order, and
//! timestamps are non-decreasing with id under the single-writer discipline
//! SQLite provides.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operation type recorded for an insert mutation
pub const OP_INSERT: &str = "INSERT";
/// Operation type recorded for an update mutation
pub const OP_UPDATE: &str = "UPDATE";
/// Operation type recorded for a delete mutation
pub const OP_DELETE: &str = "DELETE";

/// Audit log database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logs")]
pub struct Model {
    /// Unique identifier, monotonically increasing, never reused
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the mutation committed
    pub timestamp: DateTimeUtc,
    /// Kind of entity mutated: "Budget", "Transaction", or "InventoryItem"
    pub entity_name: String,
    /// ID of the mutated row
    pub entity_id: i64,
    /// [`OP_INSERT`], [`OP_UPDATE`], or [`OP_DELETE`]
    pub operation_type: String,
    /// Optional human-readable summary of the mutation
    pub details: Option<String>,
}

/// Log entries reference mutated rows by name and id only, no foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
