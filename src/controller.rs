//! Row controller - commits a row through the persistence provider
//!
//! The controller holds handles only: the shared row store, the notification
//! center, and the persistence provider. A commit reads a snapshot, releases
//! the store lock, awaits the provider, then applies the outcome:
//!
//! ```text
//! EDITING --commit: success--> READONLY   (values kept)
//! EDITING --commit: failure--> EDITING    (danger notification posted)
//! ```
//!
//! Success only settles the row if it still holds what was sent. Changes
//! made while the provider was working stay unsaved on an editing row. If
//! the table was reloaded or the row disappeared, the late result is dropped.

use crate::grid::{lock_store, RowId, SharedRowStore};
use crate::notify::{NotificationCenter, NotificationId, Severity};
use crate::persistence::{PersistenceError, RowPersistence};
use std::fmt;
use std::sync::Arc;

/// Result of a commit that reached a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Persisted; the row is read-only again
    Saved,
    /// Persisted, but the row changed meanwhile; it stays in edit mode with
    /// the newer values unsaved
    Superseded,
    /// Provider refused; the row stays in edit mode
    Failed {
        notification: NotificationId,
        error: PersistenceError,
    },
    /// The row is not in edit mode, nothing was sent
    NotEditing,
    /// The table changed under the in-flight commit; result ignored
    Stale,
}

/// Commit could not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    RowNotFound(RowId),
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowNotFound(id) => write!(f, "row {} not found", id),
        }
    }
}

impl std::error::Error for CommitError {}

/// Orchestrates commits across the store, notifications and persistence
#[derive(Clone)]
pub struct RowController {
    store: SharedRowStore,
    notifications: NotificationCenter,
    persistence: Arc<dyn RowPersistence>,
}

impl RowController {
    pub fn new(
        store: SharedRowStore,
        notifications: NotificationCenter,
        persistence: Arc<dyn RowPersistence>,
    ) -> Self {
        Self {
            store,
            notifications,
            persistence,
        }
    }

    pub fn store(&self) -> &SharedRowStore {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn persistence_name(&self) -> &'static str {
        self.persistence.name()
    }

    /// Try to persist a row
    ///
    /// `RowNotFound` is the only error; callers treat it as a no-op.
    pub async fn commit(&self, id: RowId) -> Result<CommitOutcome, CommitError> {
        let (snapshot, generation) = {
            let store = lock_store(&self.store);
            let record = store.get(id).ok_or(CommitError::RowNotFound(id))?;
            if !record.is_editing() {
                return Ok(CommitOutcome::NotEditing);
            }
            (record.clone(), store.generation())
        };

        tracing::info!("Committing row {} via {}", id, self.persistence.name());
        let result = self.persistence.update(&snapshot).await;

        {
            let mut store = lock_store(&self.store);
            if store.generation() != generation || store.get(id).is_none() {
                tracing::debug!("Dropping commit result for row {}: table changed", id);
                return Ok(CommitOutcome::Stale);
            }

            if result.is_ok() && store.settle_commit(id, &snapshot) == Some(false) {
                tracing::info!("Row {} saved; newer changes remain unsaved", id);
                return Ok(CommitOutcome::Superseded);
            }
        }

        match result {
            Ok(()) => {
                tracing::info!("Row {} saved", id);
                Ok(CommitOutcome::Saved)
            }
            Err(error) => {
                let notification = self
                    .notifications
                    .post(format!("Failed to save row {}: {}", id, error), Severity::Danger);
                Ok(CommitOutcome::Failed {
                    notification,
                    error,
                })
            }
        }
    }
}

impl fmt::Debug for RowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowController")
            .field("persistence", &self.persistence.name())
            .field("notifications", &self.notifications)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{FieldValue, RawRecord, Record, RowStore};
    use crate::persistence::{AcceptAll, SimulatedFailure};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn two_people() -> SharedRowStore {
        let mut store = RowStore::new();
        store.load(vec![
            raw(json!({"id": 1, "name": "John Doe", "active": true})),
            raw(json!({"id": 2, "name": "Jane Smith", "active": false})),
        ]);
        store.shared()
    }

    fn controller(store: SharedRowStore, persistence: Arc<dyn RowPersistence>) -> RowController {
        RowController::new(store, NotificationCenter::default(), persistence)
    }

    /// Blocks every update until released, then answers with `outcome`
    struct Gated {
        gate: Arc<Notify>,
        outcome: Result<(), PersistenceError>,
    }

    impl RowPersistence for Gated {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn update<'a>(&'a self, _record: &'a Record) -> BoxFuture<'a, Result<(), PersistenceError>> {
            async move {
                self.gate.notified().await;
                self.outcome.clone()
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_row_editing() {
        let store = two_people();
        let ctl = controller(store.clone(), Arc::new(SimulatedFailure));
        let other_before = lock_store(&store).get(RowId(2)).cloned();

        lock_store(&store).toggle_edit(RowId(1));
        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Ada"));

        let outcome = ctl.commit(RowId(1)).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Failed { .. }));

        let guard = lock_store(&store);
        let record = guard.get(RowId(1)).unwrap();
        assert!(record.is_editing());
        assert_eq!(record.get("name"), Some(&FieldValue::text("Ada")));
        assert_eq!(guard.get(RowId(2)).cloned(), other_before);

        let active = ctl.notifications().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Danger);
        assert!(active[0].message.contains("Simulated server error"));
    }

    #[tokio::test]
    async fn test_successful_commit_returns_row_to_readonly() {
        let store = two_people();
        let ctl = controller(store.clone(), Arc::new(AcceptAll));

        lock_store(&store).toggle_edit(RowId(1));
        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Ada"));

        assert_eq!(ctl.commit(RowId(1)).await, Ok(CommitOutcome::Saved));

        let guard = lock_store(&store);
        let record = guard.get(RowId(1)).unwrap();
        assert!(!record.is_editing());
        assert_eq!(record.get("name"), Some(&FieldValue::text("Ada")));
        assert!(ctl.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_commit_unknown_row() {
        let ctl = controller(two_people(), Arc::new(AcceptAll));
        assert_eq!(
            ctl.commit(RowId(99)).await,
            Err(CommitError::RowNotFound(RowId(99)))
        );
        assert!(ctl.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_commit_readonly_row_sends_nothing() {
        let ctl = controller(two_people(), Arc::new(SimulatedFailure));
        assert_eq!(ctl.commit(RowId(1)).await, Ok(CommitOutcome::NotEditing));
        assert!(ctl.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds_without_reentering_edit() {
        let store = two_people();
        let failing = controller(store.clone(), Arc::new(SimulatedFailure));
        let accepting = RowController::new(
            store.clone(),
            failing.notifications().clone(),
            Arc::new(AcceptAll),
        );

        lock_store(&store).toggle_edit(RowId(2));
        failing.commit(RowId(2)).await.unwrap();
        assert!(lock_store(&store).get(RowId(2)).unwrap().is_editing());

        assert_eq!(accepting.commit(RowId(2)).await, Ok(CommitOutcome::Saved));
        assert!(!lock_store(&store).get(RowId(2)).unwrap().is_editing());
        assert_eq!(accepting.notifications().len(), 1, "no extra notification on success");
    }

    #[tokio::test]
    async fn test_reload_during_commit_drops_result() {
        let store = two_people();
        let gate = Arc::new(Notify::new());
        let ctl = controller(
            store.clone(),
            Arc::new(Gated {
                gate: gate.clone(),
                outcome: Err(PersistenceError::Rejected {
                    status: 500,
                    message: "boom".to_string(),
                }),
            }),
        );

        lock_store(&store).toggle_edit(RowId(1));
        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.commit(RowId(1)).await }
        });

        // Let the commit reach the provider, then replace the table
        tokio::time::sleep(Duration::from_millis(10)).await;
        lock_store(&store).load(vec![raw(json!({"id": 1, "name": "Reloaded"}))]);
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(CommitOutcome::Stale));
        assert!(ctl.notifications().is_empty());
        assert!(!lock_store(&store).get(RowId(1)).unwrap().is_editing());
    }

    fn gated_success(store: SharedRowStore) -> (RowController, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let ctl = controller(
            store,
            Arc::new(Gated {
                gate: gate.clone(),
                outcome: Ok(()),
            }),
        );
        (ctl, gate)
    }

    #[tokio::test]
    async fn test_edit_during_commit_stays_unsaved() {
        let store = two_people();
        let (ctl, gate) = gated_success(store.clone());

        lock_store(&store).toggle_edit(RowId(1));
        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Ada"));
        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.commit(RowId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Grace"));
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(CommitOutcome::Superseded));
        let guard = lock_store(&store);
        let record = guard.get(RowId(1)).unwrap();
        assert!(record.is_editing());
        assert!(record.has_unsaved_changes());
        assert_eq!(record.get("name"), Some(&FieldValue::text("Grace")));
        drop(guard);
        assert!(ctl.notifications().is_empty());

        // The next commit sends the newer value and settles the row
        let accepting = controller(store.clone(), Arc::new(AcceptAll));
        assert_eq!(accepting.commit(RowId(1)).await, Ok(CommitOutcome::Saved));
        assert!(!lock_store(&store).get(RowId(1)).unwrap().is_editing());
    }

    #[tokio::test]
    async fn test_cancel_during_commit_reopens_row_over_persisted_values() {
        let store = two_people();
        let (ctl, gate) = gated_success(store.clone());

        lock_store(&store).toggle_edit(RowId(1));
        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Ada"));
        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.commit(RowId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(lock_store(&store).cancel_edit(RowId(1)));
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(CommitOutcome::Superseded));
        let mut guard = lock_store(&store);
        let record = guard.get(RowId(1)).unwrap();
        assert!(record.is_editing());
        assert!(record.has_unsaved_changes());
        assert_eq!(record.get("name"), Some(&FieldValue::text("John Doe")));

        // Cancelling again lands on what the backend now holds
        guard.cancel_edit(RowId(1));
        assert_eq!(
            guard.get(RowId(1)).unwrap().get("name"),
            Some(&FieldValue::text("Ada"))
        );
    }

    #[tokio::test]
    async fn test_cancel_and_identical_reedit_during_commit_is_saved() {
        let store = two_people();
        let (ctl, gate) = gated_success(store.clone());

        lock_store(&store).toggle_edit(RowId(1));
        lock_store(&store).set_field(RowId(1), "name", FieldValue::text("Ada"));
        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.commit(RowId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        {
            let mut guard = lock_store(&store);
            guard.cancel_edit(RowId(1));
            guard.toggle_edit(RowId(1));
            guard.set_field(RowId(1), "name", FieldValue::text("Ada"));
        }
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(CommitOutcome::Saved));
        assert!(!lock_store(&store).get(RowId(1)).unwrap().is_editing());
    }

    #[tokio::test]
    async fn test_other_rows_stay_editable_while_commit_in_flight() {
        let store = two_people();
        let gate = Arc::new(Notify::new());
        let ctl = controller(
            store.clone(),
            Arc::new(Gated {
                gate: gate.clone(),
                outcome: Ok(()),
            }),
        );

        lock_store(&store).toggle_edit(RowId(1));
        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.commit(RowId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Store is not locked across the provider call
        assert_eq!(lock_store(&store).toggle_edit(RowId(2)), Some(true));
        assert!(lock_store(&store).set_field(RowId(2), "name", FieldValue::text("Grace")));
        assert!(lock_store(&store).get(RowId(1)).unwrap().is_editing());

        gate.notify_one();
        assert_eq!(pending.await.unwrap(), Ok(CommitOutcome::Saved));
        assert!(!lock_store(&store).get(RowId(1)).unwrap().is_editing());
        assert!(lock_store(&store).get(RowId(2)).unwrap().is_editing());
    }
}
