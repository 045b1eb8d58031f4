// # File Config Store
//
// File-based implementation of ConfigStore with crash recovery.
//
// ## Purpose
//
// Persists the runtime configuration across restarts. A crash in the
// middle of a save must never leave a half-written configuration behind.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of the previous configuration
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "config": {
//     "Username": "admin",
//     "Password": "…",
//     "NotAllowWanAccess": true,
//     "DnsConfEntries": []
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::Error;
use crate::config::GlobalConfig;
use crate::traits::config_store::ConfigStore;

/// Config file format version
/// Used for future migration if format changes
const CONFIG_FILE_VERSION: &str = "1.0";

/// File-based config store with crash recovery
///
/// The configuration is read once when the store is opened and cached;
/// `save()` writes the file first and only then replaces the cache, so
/// the cache never holds a configuration that failed to persist.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_admin::store::FileConfigStore;
/// use ddns_admin::traits::ConfigStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/var/lib/ddns/config.json").await?;
///
///     if let Some(mut config) = store.load().await? {
///         config.not_allow_wan_access = true;
///         store.save(&config).await?;
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    cached: RwLock<Option<GlobalConfig>>,
    /// Serializes writers; readers only touch the cache
    write_lock: Mutex<()>,
}

/// Serializable config file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ConfigFileFormat {
    version: String,
    saved_at: chrono::DateTime<chrono::Utc>,
    config: GlobalConfig,
}

/// Why a config file could not be read
#[derive(Debug)]
enum ReadFailure {
    /// The file exists but does not parse
    Corrupt(Error),
    /// The file could not be read at all
    Unreadable(Error),
}

impl FileConfigStore {
    /// Open a file config store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing config file
    /// 3. If corruption detected, try to load from backup
    /// 4. If there is no usable file, start empty (first-time setup)
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let cached = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            cached: RwLock::new(cached),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main config file
    /// 2. If it does not parse, try loading backup
    /// 3. If backup also fails, start with no configuration
    async fn load_with_recovery(path: &Path) -> Result<Option<GlobalConfig>, Error> {
        match Self::read_file(path).await {
            Ok(config) => {
                tracing::debug!(
                    "Loaded config from {}: {}",
                    path.display(),
                    if config.is_some() { "present" } else { "absent" }
                );
                Ok(config)
            }
            Err(ReadFailure::Unreadable(e)) => Err(e),
            Err(ReadFailure::Corrupt(e)) => {
                tracing::warn!(
                    "Config file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting without configuration.");
                    return Ok(None);
                }

                match Self::read_file(&backup_path).await {
                    Ok(config) => {
                        tracing::info!("Recovered config from backup");
                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore config file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(config)
                    }
                    Err(ReadFailure::Corrupt(backup_err) | ReadFailure::Unreadable(backup_err)) => {
                        tracing::error!(
                            "Backup also unusable: {}. Starting without configuration.",
                            backup_err
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Read and parse a config file
    async fn read_file(path: &Path) -> Result<Option<GlobalConfig>, ReadFailure> {
        if !path.exists() {
            tracing::debug!("Config file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ReadFailure::Unreadable(Error::store(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: ConfigFileFormat = serde_json::from_str(&content).map_err(|e| {
            ReadFailure::Corrupt(Error::store(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != CONFIG_FILE_VERSION {
            tracing::warn!(
                "Config file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                CONFIG_FILE_VERSION,
                file.version
            );
        }

        Ok(Some(file.config))
    }

    /// Write a configuration to disk atomically
    async fn write_file(&self, config: &GlobalConfig) -> Result<(), Error> {
        let file = ConfigFileFormat {
            version: CONFIG_FILE_VERSION.to_string(),
            saved_at: chrono::Utc::now(),
            config: config.clone(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize config: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut handle = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            handle.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous configuration as backup
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Config written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore config file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored config file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<Option<GlobalConfig>, Error> {
        Ok(self.cached.read().await.clone())
    }

    async fn save(&self, config: &GlobalConfig) -> Result<(), Error> {
        let _writer = self.write_lock.lock().await;
        self.write_file(config).await?;
        *self.cached.write().await = Some(config.clone());
        Ok(())
    }
}
