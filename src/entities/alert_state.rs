//! Alert state entity - Persisted threshold classification per budget.
//!
//! The threshold engine compares each run's classification against the row
//! stored here and notifies only on a crossing, so a crossing fires exactly
//! once rather than on every scheduled evaluation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Alert state database model - last known threshold state per budget
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_states")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the budget this state belongs to
    pub budget_id: i64,
    /// Category of the budget at the time of evaluation
    pub category: String,
    /// Last observed classification: "NORMAL", "WARNING", or "EXCEEDED"
    pub last_state: String,
    /// When the engine last evaluated this budget
    pub last_evaluated_at: DateTimeUtc,
}

/// Defines relationships between alert states and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each state row tracks one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
