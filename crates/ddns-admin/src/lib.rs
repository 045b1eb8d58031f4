// # ddns-admin
//
// Validated configuration update path for the DDNS agent.
//
// ## Architecture Overview
//
// An operator submits a new configuration through the admin form. This
// library decides whether it is admissible and turns it into the stored
// configuration:
// - **SecurityGate**: Trust-window and origin rules for first-time setup and credentials
// - **ConfigAssembler**: Normalizes submitted rows into provider entries
// - **Credential merge**: Keeps stored secrets when the form sends back their mask
// - **UpdateOrchestrator**: Runs the whole pipeline, persists, triggers reconciliation
// - **ConfigStore**: Trait for persisting the configuration
// - **ReconcileQueue**: Fire-and-forget one-shot reconciliation with its own worker
//
// ## Design Principles
//
// 1. **No partial writes**: A rejected update writes nothing
// 2. **Never persist a mask**: Masked credentials resolve to the stored value
// 3. **Non-blocking reconciliation**: The update never waits for DNS work
// 4. **Library-First**: Transport and process concerns live in `ddns-admind`

pub mod assemble;
pub mod config;
pub mod domains;
pub mod error;
pub mod locale;
pub mod merge;
pub mod password;
pub mod payload;
pub mod reconcile;
pub mod security;
pub mod store;
pub mod traits;
pub mod update;

// Re-export core types for convenience
pub use config::{AdminSettings, GlobalConfig, MergeIdentity, ProviderEntry};
pub use error::{Error, Rejection, Result};
pub use locale::Lang;
pub use payload::{ProviderRow, RequestContext, SaveResponse, UpdatePayload};
pub use reconcile::{ReconcileEvent, ReconcileQueue, ReconcileWorker};
pub use store::{FileConfigStore, MemoryConfigStore};
pub use traits::{ConfigStore, ReconcileJob, Reconciler};
pub use update::{UpdateOrchestrator, UpdateOutcome, UpdateStatus};
