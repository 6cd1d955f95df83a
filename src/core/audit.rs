//! Audit logger - appends one immutable log entry per successful mutation.
//!
//! `record` is generic over [`ConnectionTrait`] so the mutation gateway can
//! run it inside the same database transaction as the entity write; either
//! both commit or neither does. No update or delete surface exists here -
//! log rows are append-only for their whole lifetime.

use crate::{
    entities::{LogEntry, log_entry},
    errors::Result,
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};

/// Appends one audit record for a successful mutation.
///
/// Must be called on the same transactional connection as the entity write so
/// a failure of either half rolls back the other.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    entity_name: &str,
    entity_id: i64,
    operation_type: &str,
    details: Option<String>,
) -> Result<log_entry::Model> {
    let entry = log_entry::ActiveModel {
        timestamp: Set(chrono::Utc::now()),
        entity_name: Set(entity_name.to_string()),
        entity_id: Set(entity_id),
        operation_type: Set(operation_type.to_string()),
        details: Set(details),
        ..Default::default()
    };
    entry.insert(conn).await.map_err(Into::into)
}

/// Retrieves the complete audit log, newest first.
///
/// Ordered by timestamp descending with id descending as tiebreak, which is a
/// total order because ids are assigned monotonically.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<log_entry::Model>> {
    LogEntry::find()
        .order_by_desc(log_entry::Column::Timestamp)
        .order_by_desc(log_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all audit records for one entity kind, newest first.
pub async fn list_for_entity(
    db: &DatabaseConnection,
    entity_name: &str,
) -> Result<Vec<log_entry::Model>> {
    LogEntry::find()
        .filter(log_entry::Column::EntityName.eq(entity_name))
        .order_by_desc(log_entry::Column::Timestamp)
        .order_by_desc(log_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
