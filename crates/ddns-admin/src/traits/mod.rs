//! Collaborator traits of the update path
//!
//! - [`ConfigStore`]: load and save the persisted configuration
//! - [`Reconciler`]: schedule a one-shot DNS reconciliation
//! - [`ReconcileJob`]: the reconciliation run itself, driven by a worker

pub mod config_store;
pub mod reconciler;

pub use config_store::ConfigStore;
pub use reconciler::{ReconcileJob, Reconciler};
