//! Threshold alert engine - periodic budget threshold evaluation.
//!
//! Each scheduled run computes per-category personal spend from a read
//! snapshot, classifies every budget as Normal, Warning, or Exceeded, and
//! compares the result against the state persisted from the previous run. An
//! alert goes to the notification sink only on an escalating crossing
//! (Normal to Warning, Normal to Exceeded, Warning to Exceeded) - never on a
//! repeated observation of the same state, so a crossing fires exactly once.
//! De-escalations are persisted silently, re-arming the alert for the next
//! crossing.
//!
//! Evaluation is sampling, not continuous: a crossing that reverses before
//! the next run is missed by design. A failed run is logged and retried at
//! the next tick from the persisted state, so no crossing is permanently
//! lost.

use crate::{
    entities::{AlertState, Budget, alert_state, budget, transaction},
    errors::Result,
};
use sea_orm::{
    DatabaseConnection, IntoActiveModel, QueryOrder, Set, TransactionTrait, prelude::*,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::watch;

/// Fraction of the limit at which a budget enters Warning
pub const WARNING_RATIO: f64 = 0.8;

/// Destination for threshold alerts. Fire-and-forget, no delivery guarantee.
pub trait NotificationSink: Send + Sync {
    /// Delivers one alert.
    fn notify(&self, title: &str, message: &str);
}

/// Production sink: alerts surface as structured log events.
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!(title, message, "budget alert");
    }
}

/// Classification of a budget's spend against its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThresholdState {
    /// Spend below the warning threshold
    Normal,
    /// Spend at or past the warning threshold but within the limit
    Warning,
    /// Spend past the limit
    Exceeded,
}

impl ThresholdState {
    /// The string persisted in the `alert_states` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ThresholdState::Normal => "NORMAL",
            ThresholdState::Warning => "WARNING",
            ThresholdState::Exceeded => "EXCEEDED",
        }
    }

    /// Parses a persisted state string; unknown values fall back to Normal,
    /// which can only re-arm an alert, never suppress one incorrectly.
    #[must_use]
    pub fn from_persisted(raw: &str) -> Self {
        match raw {
            "WARNING" => ThresholdState::Warning,
            "EXCEEDED" => ThresholdState::Exceeded,
            _ => ThresholdState::Normal,
        }
    }
}

/// Classifies spend against a limit.
#[must_use]
pub fn classify(spent: f64, limit: f64) -> ThresholdState {
    if spent > limit {
        ThresholdState::Exceeded
    } else if spent >= limit * WARNING_RATIO {
        ThresholdState::Warning
    } else {
        ThresholdState::Normal
    }
}

/// Runs one full evaluation pass over all budgets.
///
/// Returns the number of alerts emitted. Each budget is one
/// evaluate-compare-emit-persist unit inside its own database transaction.
pub async fn run_once(db: &DatabaseConnection, sink: &dyn NotificationSink) -> Result<usize> {
    let budgets = Budget::find()
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await?;
    let spending = category_spending(db).await?;

    let mut emitted = 0;
    for budget in &budgets {
        let spent = spending.get(&budget.category).copied().unwrap_or(0.0);
        if evaluate_budget(db, sink, budget, spent).await? {
            emitted += 1;
        }
    }
    Ok(emitted)
}

/// Sums personal-kind transaction amounts per category from a read snapshot.
async fn category_spending(db: &DatabaseConnection) -> Result<HashMap<String, f64>> {
    let transactions = crate::entities::Transaction::find()
        .filter(transaction::Column::Kind.eq(transaction::KIND_PERSONAL))
        .all(db)
        .await?;

    let mut spending: HashMap<String, f64> = HashMap::new();
    for txn in transactions {
        *spending.entry(txn.category).or_insert(0.0) += txn.amount;
    }
    Ok(spending)
}

/// One evaluate-compare-emit-persist unit. Returns whether an alert fired.
async fn evaluate_budget(
    db: &DatabaseConnection,
    sink: &dyn NotificationSink,
    budget: &budget::Model,
    spent: f64,
) -> Result<bool> {
    let state = classify(spent, budget.limit_amount);

    let txn = db.begin().await?;

    let persisted = AlertState::find()
        .filter(alert_state::Column::BudgetId.eq(budget.id))
        .filter(alert_state::Column::Category.eq(budget.category.as_str()))
        .one(&txn)
        .await?;
    let previous = persisted
        .as_ref()
        .map_or(ThresholdState::Normal, |row| {
            ThresholdState::from_persisted(&row.last_state)
        });

    // Alert only on an escalating crossing
    let fired = state > previous;
    if fired {
        let message = match state {
            ThresholdState::Warning => format!(
                "You are approaching your budget limit for {}",
                budget.category
            ),
            _ => format!(
                "You have exceeded your budget limit for {}",
                budget.category
            ),
        };
        sink.notify("Budget Alert", &message);
    }

    let now = chrono::Utc::now();
    match persisted {
        Some(row) => {
            let mut active = row.into_active_model();
            active.last_state = Set(state.as_str().to_string());
            active.last_evaluated_at = Set(now);
            active.update(&txn).await?;
        }
        None => {
            alert_state::ActiveModel {
                budget_id: Set(budget.id),
                category: Set(budget.category.clone()),
                last_state: Set(state.as_str().to_string()),
                last_evaluated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    Ok(fired)
}

/// Drives the engine on a fixed period until shutdown.
///
/// Run failures are logged and swallowed; the next tick retries from the
/// persisted state. A shutdown signal aborts the scan between per-budget
/// units, leaving already-committed transitions intact.
pub async fn run_scheduler(
    db: DatabaseConnection,
    sink: Arc<dyn NotificationSink>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match run_guarded(&db, sink.as_ref(), &shutdown).await {
                    Ok(emitted) => {
                        tracing::debug!(emitted, "threshold evaluation completed");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "threshold evaluation failed, will retry next tick");
                    }
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("threshold engine shutting down");
                return;
            }
        }
    }
}

/// Like [`run_once`] but aborts cleanly between budgets on shutdown.
async fn run_guarded(
    db: &DatabaseConnection,
    sink: &dyn NotificationSink,
    shutdown: &watch::Receiver<bool>,
) -> Result<usize> {
    let budgets = Budget::find()
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await?;
    let spending = category_spending(db).await?;

    let mut emitted = 0;
    for budget in &budgets {
        if *shutdown.borrow() {
            tracing::info!("threshold scan cancelled, remaining budgets skipped");
            break;
        }
        let spent = spending.get(&budget.category).copied().unwrap_or(0.0);
        if evaluate_budget(db, sink, budget, spent).await? {
            emitted += 1;
        }
    }
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::gateway::{MutationPayload, Operation};
    use crate::core::ledger;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(799.99, 1000.0), ThresholdState::Normal);
        assert_eq!(classify(800.0, 1000.0), ThresholdState::Warning);
        assert_eq!(classify(1000.0, 1000.0), ThresholdState::Warning);
        assert_eq!(classify(1000.01, 1000.0), ThresholdState::Exceeded);
        assert_eq!(classify(0.0, 1000.0), ThresholdState::Normal);
    }

    #[tokio::test]
    async fn test_alerts_fire_once_per_crossing() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let sink = CollectingNotifier::default();

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 1000.0)),
            )
            .await?;

        // Cumulative spend 700 -> 850 -> 950 -> 1050, one run after each
        let mut emitted = Vec::new();
        for amount in [700.0, 150.0, 100.0, 100.0] {
            gateway
                .apply(
                    Operation::Insert,
                    MutationPayload::Transaction(test_transaction("Food", amount)),
                )
                .await?;
            emitted.push(run_once(&db, &sink).await?);
        }

        assert_eq!(emitted, vec![0, 1, 0, 1]);
        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].1,
            "You are approaching your budget limit for Food"
        );
        assert_eq!(
            messages[1].1,
            "You have exceeded your budget limit for Food"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_reevaluation_is_idempotent() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let sink = CollectingNotifier::default();

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 1000.0)),
            )
            .await?;
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 900.0)),
            )
            .await?;

        assert_eq!(run_once(&db, &sink).await?, 1);
        // No intervening mutation: the second run must emit nothing
        assert_eq!(run_once(&db, &sink).await?, 0);
        assert_eq!(sink.messages().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_direct_jump_to_exceeded_emits_one_alert() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let sink = CollectingNotifier::default();

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 100.0)),
            )
            .await?;
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 500.0)),
            )
            .await?;

        assert_eq!(run_once(&db, &sink).await?, 1);
        assert_eq!(
            sink.messages()[0].1,
            "You have exceeded your budget limit for Food"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_deescalation_rearms_the_alert() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let sink = CollectingNotifier::default();

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 1000.0)),
            )
            .await?;
        let spend_id = gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 1200.0)),
            )
            .await?;
        assert_eq!(run_once(&db, &sink).await?, 1);

        // Spend drops back below the warning threshold: persist silently
        let spend = ledger::get_transaction_by_id(&db, spend_id).await?.unwrap();
        gateway
            .apply(Operation::Delete, MutationPayload::Transaction(spend))
            .await?;
        assert_eq!(run_once(&db, &sink).await?, 0);

        // The next crossing fires again
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Transaction(test_transaction("Food", 850.0)),
            )
            .await?;
        assert_eq!(run_once(&db, &sink).await?, 1);
        assert_eq!(sink.messages().len(), 2);

        Ok(())
    }

    /// Flips a shutdown flag from inside the first alert delivery, so the
    /// scan observes it before the next per-budget unit.
    struct ShutdownOnFirstAlert {
        shutdown: watch::Sender<bool>,
    }

    impl NotificationSink for ShutdownOnFirstAlert {
        fn notify(&self, _title: &str, _message: &str) {
            let _ = self.shutdown.send(true);
        }
    }

    #[tokio::test]
    async fn test_shutdown_mid_scan_skips_remaining_budgets() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;

        // Two exceeded budgets, scanned in id order
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 100.0)),
            )
            .await?;
        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Travel", 100.0)),
            )
            .await?;
        for category in ["Food", "Travel"] {
            gateway
                .apply(
                    Operation::Insert,
                    MutationPayload::Transaction(test_transaction(category, 500.0)),
                )
                .await?;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sink = ShutdownOnFirstAlert {
            shutdown: shutdown_tx,
        };
        let emitted = run_guarded(&db, &sink, &shutdown_rx).await?;
        assert_eq!(emitted, 1);

        // The first budget's committed transition persists; the second was
        // never evaluated
        let states = AlertState::find().all(&db).await?;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].category, "Food");
        assert_eq!(states[0].last_state, "EXCEEDED");

        // The next full run picks up the skipped budget from persisted state
        let sink = CollectingNotifier::default();
        assert_eq!(run_once(&db, &sink).await?, 1);
        assert_eq!(
            sink.messages()[0].1,
            "You have exceeded your budget limit for Travel"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() -> Result<()> {
        let db = setup_test_db().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = tokio::spawn(run_scheduler(
            db,
            Arc::new(TracingNotifier),
            Duration::from_secs(3600),
            shutdown_rx,
        ));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), engine)
            .await
            .unwrap()
            .unwrap();

        Ok(())
    }

    #[tokio::test]
    async fn test_failed_run_is_recoverable() -> Result<()> {
        let (db, gateway) = setup_with_gateway().await?;
        let sink = CollectingNotifier::default();

        gateway
            .apply(
                Operation::Insert,
                MutationPayload::Budget(test_budget("Food", 100.0)),
            )
            .await?;

        db.execute_unprepared("DROP TABLE transactions").await?;
        assert!(run_once(&db, &sink).await.is_err());
        // No alert was emitted by the failed run
        assert!(sink.messages().is_empty());

        Ok(())
    }
}
