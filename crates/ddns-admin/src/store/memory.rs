// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// ## Purpose
//
// Keeps the configuration for the lifetime of the process only. Useful
// for tests and for throwaway instances configured at every start.
//
// ## Restart Behavior
//
// - The configuration is lost on restart
// - The first update after a restart is a first-time setup

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::GlobalConfig;
use crate::traits::config_store::ConfigStore;

/// In-memory config store implementation
///
/// Clones share the same underlying slot.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_admin::config::GlobalConfig;
/// use ddns_admin::store::MemoryConfigStore;
/// use ddns_admin::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryConfigStore::new();
///     assert!(store.load().await?.is_none());
///
///     store.save(&GlobalConfig::new()).await?;
///     assert!(store.load().await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<Option<GlobalConfig>>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `config`
    pub fn with_config(config: GlobalConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(config))),
        }
    }

    /// Check if nothing was saved yet
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }

    /// Forget the stored configuration
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<GlobalConfig>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, config: &GlobalConfig) -> Result<(), Error> {
        *self.inner.write().await = Some(config.clone());
        Ok(())
    }
}
