//! Reactive view layer - versioned pub/sub over derived ledger values.
//!
//! A [`ViewBroker`] hands out subscriptions keyed by a [`ViewSpec`]. Each
//! subscription runs its own task: it listens for committed-change events
//! from the mutation gateway, and whenever an event touches the view's input
//! set it recomputes the value from the current store state (never
//! incrementally) and pushes it tagged with a monotonically increasing
//! version. [`ViewSubscription::recv`] discards any delivery whose version is
//! not strictly greater than the last accepted one, which protects
//! subscribers against out-of-order delivery under concurrent mutations.
//!
//! Delivery is at-least-once and recomputation is idempotent given the same
//! store snapshot: a lagged event receiver simply coalesces into one fresh
//! recompute. A failed recompute is transient - the push is skipped, the last
//! delivered value stands, and the next triggering mutation retries.

use crate::{
    core::gateway::{ChangeEvent, EntityKind, MutationGateway},
    entities::{Budget, Transaction, budget, inventory_item, transaction},
    errors::Result,
};
use sea_orm::{DatabaseConnection, QueryOrder, QuerySelect, prelude::*};
use tokio::sync::{broadcast, mpsc};

/// Buffered deliveries per subscription before backpressure
const DELIVERY_CHANNEL_CAPACITY: usize = 32;

/// Identifies a derived value over the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum ViewSpec {
    /// Budget limit minus personal-kind spend for one category
    CategoryBalance {
        /// The category to balance
        category: String,
    },
    /// Total stock value, optionally restricted by tab and/or category
    InventoryValuation {
        /// Restrict to one tab, if set
        tab_id: Option<i64>,
        /// Restrict to one category, if set
        category: Option<String>,
    },
    /// Most recent transactions, optionally filtered
    RecentActivity {
        /// Restrict to one category, if set
        category: Option<String>,
        /// Restrict to one kind ("personal"/"inventory"), if set
        kind: Option<String>,
        /// Maximum number of transactions delivered
        limit: u64,
    },
}

impl ViewSpec {
    /// Whether a committed change can affect this view's value.
    #[must_use]
    pub const fn is_affected_by(&self, event: &ChangeEvent) -> bool {
        match self {
            ViewSpec::CategoryBalance { .. } => matches!(
                event.kind,
                EntityKind::Budget | EntityKind::Transaction
            ),
            ViewSpec::InventoryValuation { .. } => {
                matches!(event.kind, EntityKind::InventoryItem)
            }
            ViewSpec::RecentActivity { .. } => matches!(event.kind, EntityKind::Transaction),
        }
    }
}

/// One recomputed view value
#[derive(Debug, Clone, PartialEq)]
pub enum ViewValue {
    /// Remaining balance for a category (limit minus spend)
    Balance(f64),
    /// Total inventory value
    Valuation(f64),
    /// Recent transactions, newest first
    Transactions(Vec<transaction::Model>),
}

/// A versioned delivery to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct ViewUpdate {
    /// Strictly increasing per subscription; stale versions are discarded
    pub version: u64,
    /// The freshly recomputed value
    pub value: ViewValue,
}

/// Hands out live subscriptions over the gateway's committed changes.
#[derive(Clone)]
pub struct ViewBroker {
    gateway: MutationGateway,
}

impl ViewBroker {
    /// Creates a broker over the given mutation gateway.
    #[must_use]
    pub const fn new(gateway: MutationGateway) -> Self {
        Self { gateway }
    }

    /// Subscribes to a view.
    ///
    /// An initial snapshot is computed and delivered right away; afterwards
    /// every committed mutation touching the view's input set triggers a
    /// recompute and push. The subscription task ends when the subscriber is
    /// dropped or the gateway goes away.
    #[must_use]
    pub fn subscribe(&self, spec: ViewSpec) -> ViewSubscription {
        let db = self.gateway.db().clone();
        let events = self.gateway.subscribe_changes();
        let (tx, rx) = mpsc::channel(DELIVERY_CHANNEL_CAPACITY);

        tokio::spawn(run_subscription(db, spec, events, tx));

        ViewSubscription {
            updates: rx,
            last_accepted: 0,
        }
    }
}

/// The receiving half of one view subscription.
pub struct ViewSubscription {
    updates: mpsc::Receiver<ViewUpdate>,
    last_accepted: u64,
}

impl ViewSubscription {
    /// Receives the next fresh view value.
    ///
    /// Deliveries whose version is not strictly greater than the last
    /// accepted one are discarded silently. Returns `None` once the
    /// subscription task has ended.
    pub async fn recv(&mut self) -> Option<ViewUpdate> {
        loop {
            let update = self.updates.recv().await?;
            if update.version > self.last_accepted {
                self.last_accepted = update.version;
                return Some(update);
            }
        }
    }

    #[cfg(test)]
    fn from_channel(updates: mpsc::Receiver<ViewUpdate>) -> Self {
        Self {
            updates,
            last_accepted: 0,
        }
    }
}

/// Per-subscription task: recompute on every relevant committed change.
async fn run_subscription(
    db: DatabaseConnection,
    spec: ViewSpec,
    mut events: broadcast::Receiver<ChangeEvent>,
    tx: mpsc::Sender<ViewUpdate>,
) {
    let mut version: u64 = 0;

    // Initial snapshot so subscribers start from a concrete value
    if !recompute_and_push(&db, &spec, &mut version, &tx).await {
        return;
    }

    loop {
        match events.recv().await {
            Ok(event) => {
                if !spec.is_affected_by(&event) {
                    continue;
                }
            }
            // Missed events coalesce into one recompute from current state
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::debug!(missed, "view subscription lagged, recomputing");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }

        if !recompute_and_push(&db, &spec, &mut version, &tx).await {
            return;
        }
    }
}

/// Recomputes and delivers one update; false means the subscriber is gone.
async fn recompute_and_push(
    db: &DatabaseConnection,
    spec: &ViewSpec,
    version: &mut u64,
    tx: &mpsc::Sender<ViewUpdate>,
) -> bool {
    match compute(db, spec).await {
        Ok(value) => {
            *version += 1;
            tx.send(ViewUpdate {
                version: *version,
                value,
            })
            .await
            .is_ok()
        }
        Err(err) => {
            // Transient: keep the last delivered value, retry on next trigger
            tracing::warn!(error = %err, ?spec, "view recomputation failed, skipping push");
            true
        }
    }
}

/// Computes a view's current value directly from store state.
pub async fn compute(db: &DatabaseConnection, spec: &ViewSpec) -> Result<ViewValue> {
    match spec {
        ViewSpec::CategoryBalance { category } => {
            Ok(ViewValue::Balance(category_balance(db, category).await?))
        }
        ViewSpec::InventoryValuation { tab_id, category } => Ok(ViewValue::Valuation(
            inventory_valuation(db, *tab_id, category.as_deref()).await?,
        )),
        ViewSpec::RecentActivity {
            category,
            kind,
            limit,
        } => Ok(ViewValue::Transactions(
            recent_activity(db, category.as_deref(), kind.as_deref(), *limit).await?,
        )),
    }
}

/// Budget limit for a category minus its personal-kind spend.
///
/// The limit is the sum over all budgets sharing the category (category is a
/// soft key). A category with no budget yields a negative balance equal to
/// its spend.
pub async fn category_balance(db: &DatabaseConnection, category: &str) -> Result<f64> {
    let limit: f64 = Budget::find()
        .filter(budget::Column::Category.eq(category))
        .all(db)
        .await?
        .iter()
        .map(|b| b.limit_amount)
        .sum();

    let spent: f64 = Transaction::find()
        .filter(transaction::Column::Kind.eq(transaction::KIND_PERSONAL))
        .filter(transaction::Column::Category.eq(category))
        .all(db)
        .await?
        .iter()
        .map(|t| t.amount)
        .sum();

    Ok(limit - spent)
}

/// Total inventory value: sum of quantity times unit cost.
pub async fn inventory_valuation(
    db: &DatabaseConnection,
    tab_id: Option<i64>,
    category: Option<&str>,
) -> Result<f64> {
    let mut query = crate::entities::InventoryItem::find();
    if let Some(tab_id) = tab_id {
        query = query.filter(inventory_item::Column::TabId.eq(tab_id));
    }
    if let Some(category) = category {
        query = query.filter(inventory_item::Column::Category.eq(category));
    }

    Ok(query
        .all(db)
        .await?
        .iter()
        .map(|item| f64::from(item.quantity) * item.unit_cost)
        .sum())
}

/// Top-N transactions, date descending with insertion id as tiebreak.
pub async fn recent_activity(
    db: &DatabaseConnection,
    category: Option<&str>,
    kind: Option<&str>,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find();
    if let Some(category) = category {
        query = query.filter(transaction::Column::Category.eq(category));
    }
    if let Some(kind) = kind {
        query = query.filter(transaction::Column::Kind.eq(kind));
    }

    query
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::gateway::{MutationPayload, Operation};
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;
    use std::time::Duration;
    use tokio::time::timeout;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    async fn next_update(sub: &mut ViewSubscription) -> ViewUpdate {
        timeout(RECV_TIMEOUT, sub.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_category_balance_view_converges() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let broker = ViewBroker::new(gateway.clone());

        let mut sub = broker.subscribe(ViewSpec::CategoryBalance {
            category: "Food".to_string(),
        });

        // Initial snapshot of an empty ledger
        let initial = next_update(&mut sub).await;
        assert_eq!(initial.value, ViewValue::Balance(0.0));

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 1000.0)),
            )
            .await?;
        let after_budget = next_update(&mut sub).await;
        assert!(after_budget.version > initial.version);
        assert_eq!(after_budget.value, ViewValue::Balance(1000.0));

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 250.0)),
            )
            .await?;
        let after_spend = next_update(&mut sub).await;
        assert_eq!(after_spend.value, ViewValue::Balance(750.0));

        // Quiescent: delivered value equals a fresh direct recomputation
        let direct = compute(&db, &ViewSpec::CategoryBalance {
            category: "Food".to_string(),
        })
        .await?;
        assert_eq!(after_spend.value, direct);

        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_kind_spend_excluded_from_balance() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 1000.0)),
            )
            .await?;
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 100.0)),
            )
            .await?;
        let mut inventory_txn = test_transaction("Food", 400.0);
        inventory_txn.kind = crate::entities::transaction::KIND_INVENTORY.to_string();
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(inventory_txn),
            )
            .await?;

        // Only the personal-kind 100 counts against the budget
        assert_eq!(category_balance(&db, "Food").await?, 900.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_unbudgeted_category_is_valid() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Hobbies", 40.0)),
            )
            .await?;

        assert_eq!(category_balance(&db, "Hobbies").await?, -40.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_inventory_valuation_with_filters() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;

        insert_test_item(&gateway, "Bottled Water", 10, 1.5).await?;
        let mut gadget = test_inventory_item("Gadget", 2, 20.0);
        gadget.category = "Electronics".to_string();
        gateway
            .apply(Operation::Insert, MutationPayload::InventoryItem(gadget))
            .await?;

        assert_eq!(inventory_valuation(&db, None, None).await?, 55.0);
        assert_eq!(
            inventory_valuation(&db, None, Some("Electronics")).await?,
            40.0
        );
        assert_eq!(inventory_valuation(&db, Some(999), None).await?, 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_recent_activity_order_and_limit() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;

        // Same date on purpose so the id tiebreak decides the order
        let date = chrono::Utc::now();
        for amount in [10.0, 20.0, 30.0] {
            let mut txn = test_transaction("Food", amount);
            txn.date = date;
            gateway
                .apply(Operation::Insert, MutationPayload::Transaction(txn))
                .await?;
        }

        let recent = recent_activity(&db, None, None, 2).await?;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, 30.0);
        assert_eq!(recent[1].amount, 20.0);
        assert!(recent[0].id > recent[1].id);

        Ok(())
    }

    #[tokio::test]
    async fn test_stale_versions_discarded() {
        let (tx, rx) = mpsc::channel(8);
        let mut sub = ViewSubscription::from_channel(rx);

        tx.send(ViewUpdate {
            version: 2,
            value: ViewValue::Balance(2.0),
        })
        .await
        .unwrap();
        // Out-of-order redelivery of an older recompute
        tx.send(ViewUpdate {
            version: 1,
            value: ViewValue::Balance(1.0),
        })
        .await
        .unwrap();
        tx.send(ViewUpdate {
            version: 3,
            value: ViewValue::Balance(3.0),
        })
        .await
        .unwrap();
        drop(tx);

        assert_eq!(sub.recv().await.unwrap().version, 2);
        // Version 1 is skipped entirely
        assert_eq!(sub.recv().await.unwrap().version, 3);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_recompute_failure_skips_push() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let broker = ViewBroker::new(gateway.clone());

        let mut sub = broker.subscribe(ViewSpec::CategoryBalance {
            category: "Food".to_string(),
        });
        let _initial = next_update(&mut sub).await;

        // Break the read path, then commit a mutation that triggers the view
        db.execute_unprepared("DROP TABLE transactions").await?;
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 100.0)),
            )
            .await?;

        // The failed recompute is skipped, no delivery arrives
        let outcome = timeout(Duration::from_millis(300), sub.recv()).await;
        assert!(outcome.is_err());

        Ok(())
    }
}
