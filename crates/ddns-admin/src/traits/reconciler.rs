// # Reconciler Traits
//
// A saved configuration is applied by a one-shot reconciliation run,
// independent of the regular schedule.
//
// - [`Reconciler`] is what the update path sees: a non-blocking trigger.
// - [`ReconcileJob`] is the run itself, executed by a worker with its own
//   lifecycle (see `crate::reconcile`).
//
// `force_full` asks the run to compare every entry against the provider
// regardless of cached state. It travels with the request instead of
// living in process-wide state.

use async_trait::async_trait;

/// Non-blocking trigger for one-shot reconciliation
pub trait Reconciler: Send + Sync {
    /// Schedule a reconciliation run and return immediately
    ///
    /// Failures of the run are not reported back to the caller.
    fn trigger_one_shot(&self, force_full: bool);
}

/// A single reconciliation run
#[async_trait]
pub trait ReconcileJob: Send + Sync {
    /// Re-evaluate and apply DNS records once
    ///
    /// # Parameters
    ///
    /// - `force_full`: Ignore cached state and compare every entry
    async fn run_once(&self, force_full: bool) -> Result<(), crate::Error>;
}
