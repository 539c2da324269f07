//! Persistence context: the unit of work a repository commits through

use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

use super::change_tracker::ChangeTracker;

/// A connection handle plus the change tracker for one logical transaction.
///
/// Not meant to be shared between tasks; create one per request.
pub struct PersistenceContext {
    db: DatabaseConnection,
    tracker: ChangeTracker,
}

impl PersistenceContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            tracker: ChangeTracker::new(),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn change_tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn change_tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    /// Flush every pending entry inside a single transaction.
    ///
    /// Returns the number of entries written. Audit columns are not touched
    /// here. If any write fails the transaction is rolled back and the entries
    /// stay pending.
    pub async fn commit(&mut self) -> Result<usize, DbErr> {
        let pending = self.tracker.pending_count();
        if pending == 0 {
            tracing::debug!("Commit skipped: no pending changes");
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        for entry in self.tracker.pending_mut() {
            if let Err(e) = entry.flush(&txn).await {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        }
        txn.commit().await?;

        self.tracker.accept_all_changes();
        tracing::debug!("Committed {} change(s)", pending);
        Ok(pending)
    }

    /// Release the context. Uncommitted changes are dropped.
    pub fn dispose(self) {
        let pending = self.tracker.pending_count();
        if pending > 0 {
            tracing::warn!(
                "Disposing persistence context with {} uncommitted change(s)",
                pending
            );
        }
    }
}

impl std::fmt::Debug for PersistenceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceContext")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}
