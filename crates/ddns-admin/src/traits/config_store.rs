// # Config Store Trait
//
// Defines the interface for persisting the runtime configuration.
//
// ## Purpose
//
// The update path loads the configuration once per update, mutates a
// working copy and hands it back in full. Nothing is written when an
// update is rejected.
//
// ## Absence
//
// `load()` returning `Ok(None)` means no configuration was ever saved.
// The update path treats this as first-time setup.
//
// ## Implementations
//
// - `MemoryConfigStore`: process-local, for tests and ephemeral setups
// - `FileConfigStore`: JSON file with atomic writes and backup recovery

use async_trait::async_trait;

use crate::config::GlobalConfig;

/// Trait for config store implementations
///
/// # Thread Safety
///
/// The store is shared process-wide. Concurrent updates may call `save()`
/// at the same time; implementations must serialize their own writes so
/// that one complete configuration wins. Ordering between racing updates
/// is not guaranteed: the later write wins.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Some(config))`: A configuration was saved before
    /// - `Ok(None)`: Nothing saved yet (first-time setup)
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<GlobalConfig>, crate::Error>;

    /// Replace the stored configuration
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Durably saved
    /// - `Err(Error)`: Storage error; the error message is shown to the operator
    async fn save(&self, config: &GlobalConfig) -> Result<(), crate::Error>;
}
