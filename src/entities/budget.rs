//! Budget entity - Represents a spending limit for a category.
//!
//! Each budget pairs a category string with a decimal limit. The category is a
//! soft key: transactions match budgets by string equality at read time and
//! spend without a matching budget is valid (unbudgeted spend).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Spending category this budget applies to (e.g., "Food", "Transport")
    pub category: String,
    /// Spending limit for the category, must be non-negative
    pub limit_amount: f64,
    /// Optimistic-lock counter, bumped on every update
    pub version: i32,
}

/// Budgets reference no other tables; transactions match by category string
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
