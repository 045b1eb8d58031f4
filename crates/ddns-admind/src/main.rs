// # ddns-admind - DDNS Admin Daemon
//
// Thin process wrapper around `ddns-admin`:
// 1. Reads configuration from environment variables
// 2. Opens the config store
// 3. Starts the reconciliation worker
// 4. Serves save requests until stdin closes or a signal arrives
//
// ## Transport
//
// One JSON request per stdin line:
//
// ```json
// {"remote_addr": "192.168.1.20:51234", "host": "192.168.1.2:9876",
//  "accept_language": "en-US", "payload": {"Username": "admin", ...}}
// ```
//
// `payload` is the form body, either as a JSON value or as a string
// holding the raw body. Each request is answered with one
// `{"result": ..., "dnsConf": ...}` line on stdout. Logs go to stderr.
//
// ## Configuration
//
// - `DDNS_ADMIN_STORE`: Type of config store (file, memory)
// - `DDNS_ADMIN_CONFIG_PATH`: Path to the config file (for file store)
// - `DDNS_ADMIN_LOG_LEVEL`: trace, debug, info, warn, error
// - `DDNS_ADMIN_TRUST_WINDOW_SECS`: Trust window after start (default 300)
// - `DDNS_ADMIN_MERGE_IDENTITY`: positional or named
//
// ## Example
//
// ```bash
// export DDNS_ADMIN_STORE=file
// export DDNS_ADMIN_CONFIG_PATH=/var/lib/ddns/config.json
//
// ddns-admind < requests.jsonl
// ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use ddns_admin::{
    AdminSettings, ConfigStore, FileConfigStore, Lang, MemoryConfigStore, MergeIdentity,
    ReconcileEvent, ReconcileJob, ReconcileQueue, Rejection, RequestContext, SaveResponse,
    UpdateOrchestrator,
};
use serde::Deserialize;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long shutdown waits for a running reconciliation
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum AdminExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<AdminExitCode> for ExitCode {
    fn from(code: AdminExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    config_path: Option<String>,
    log_level: String,
    trust_window_secs: Option<u64>,
    merge_identity: MergeIdentity,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let trust_window_secs = match env::var("DDNS_ADMIN_TRUST_WINDOW_SECS") {
            Ok(raw) => Some(raw.trim().parse::<u64>().with_context(|| {
                format!("DDNS_ADMIN_TRUST_WINDOW_SECS must be a number of seconds. Got: {raw}")
            })?),
            Err(_) => None,
        };

        let merge_identity = match env::var("DDNS_ADMIN_MERGE_IDENTITY") {
            Ok(raw) => raw.trim().parse::<MergeIdentity>()?,
            Err(_) => MergeIdentity::default(),
        };

        Ok(Self {
            store_type: env::var("DDNS_ADMIN_STORE").unwrap_or_else(|_| "file".to_string()),
            config_path: env::var("DDNS_ADMIN_CONFIG_PATH").ok(),
            log_level: env::var("DDNS_ADMIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            trust_window_secs,
            merge_identity,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "DDNS_ADMIN_STORE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        if self.store_type == "file" {
            match self.config_path.as_deref() {
                None => anyhow::bail!(
                    "DDNS_ADMIN_CONFIG_PATH is required when DDNS_ADMIN_STORE=file. \
                    Set it via: export DDNS_ADMIN_CONFIG_PATH=/var/lib/ddns/config.json"
                ),
                Some("") => anyhow::bail!(
                    "DDNS_ADMIN_CONFIG_PATH cannot be empty when DDNS_ADMIN_STORE=file"
                ),
                Some(_) => {}
            }
        }

        if let Some(secs) = self.trust_window_secs
            && secs > 24 * 60 * 60
        {
            anyhow::bail!(
                "DDNS_ADMIN_TRUST_WINDOW_SECS must be at most one day (86400). Got: {}",
                secs
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "DDNS_ADMIN_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }

    fn settings(&self) -> AdminSettings {
        let settings = AdminSettings::default().with_merge_identity(self.merge_identity);
        match self.trust_window_secs {
            Some(secs) => settings.with_trust_window_secs(secs),
            None => settings,
        }
    }
}

/// One line of input
#[derive(Debug, Deserialize)]
struct AdminRequest {
    #[serde(flatten)]
    context: RequestContext,
    #[serde(default)]
    payload: serde_json::Value,
}

impl AdminRequest {
    /// The form body as raw bytes
    fn body(&self) -> Result<Vec<u8>> {
        Ok(match &self.payload {
            serde_json::Value::String(raw) => raw.clone().into_bytes(),
            value => serde_json::to_vec(value)?,
        })
    }
}

/// Reconcile job that reports what the agent would now manage
///
/// DNS updates are performed by the agent itself; this daemon only
/// records that a full pass is due and what it covers.
struct SummaryJob {
    store: Arc<dyn ConfigStore>,
}

#[async_trait]
impl ReconcileJob for SummaryJob {
    async fn run_once(&self, force_full: bool) -> ddns_admin::Result<()> {
        let Some(config) = self.store.load().await? else {
            info!("Reconciliation: no configuration stored yet");
            return Ok(());
        };

        info!(
            "Reconciliation (force_full: {}): {} provider entr{}, wan access {}",
            force_full,
            config.entries.len(),
            if config.entries.len() == 1 { "y" } else { "ies" },
            if config.not_allow_wan_access { "disabled" } else { "enabled" }
        );
        for (idx, entry) in config.entries.iter().enumerate() {
            info!(
                "  #{} {}: ipv4 {} [{}], ipv6 {} [{}]",
                idx + 1,
                entry.provider_name,
                if entry.ipv4.enable { "on" } else { "off" },
                entry.ipv4.domains.join(", "),
                if entry.ipv6.enable { "on" } else { "off" },
                entry.ipv6.domains.join(", ")
            );
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    let started_at = std::time::Instant::now();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return AdminExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return AdminExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AdminExitCode::ConfigError.into();
    }

    info!("Starting ddns-admind");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return AdminExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        // The trust window counts from process start, not runtime start
        let started_at = Instant::now() - started_at.elapsed();

        let store = match open_store(&config).await {
            Ok(store) => store,
            Err(e) => {
                error!("Failed to open config store: {:#}", e);
                return AdminExitCode::ConfigError;
            }
        };

        match run_daemon(config, store, started_at).await {
            Ok(()) => AdminExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                AdminExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Open the configured store
async fn open_store(config: &Config) -> Result<Arc<dyn ConfigStore>> {
    match (config.store_type.as_str(), config.config_path.as_deref()) {
        ("file", Some(path)) => {
            let store = FileConfigStore::new(path).await?;
            info!("Using file config store at {}", store.path().display());
            Ok(Arc::new(store))
        }
        _ => {
            warn!("Using in-memory config store; configuration is lost on exit");
            Ok(Arc::new(MemoryConfigStore::new()))
        }
    }
}

/// Serve requests until stdin closes or a shutdown signal arrives
async fn run_daemon(config: Config, store: Arc<dyn ConfigStore>, started_at: Instant) -> Result<()> {
    let settings = config.settings();

    let job = Arc::new(SummaryJob {
        store: store.clone(),
    });
    let (queue, worker, events) = ReconcileQueue::new(job, &settings);
    let worker_handle = worker.spawn();
    let events_handle = tokio::spawn(log_events(events));

    let orchestrator = UpdateOrchestrator::new(store, Arc::new(queue), settings)?
        .with_start_time(started_at);
    info!(
        "Accepting updates (trust window: {}s, merge identity: {:?})",
        orchestrator.settings().trust_window_secs,
        orchestrator.settings().merge_identity
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let reason = loop {
        tokio::select! {
            signal = &mut shutdown => break signal?,

            line = lines.next_line() => match line.context("Failed to read request")? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    let response = handle_line(&orchestrator, &line).await;
                    let mut encoded = serde_json::to_vec(&response)?;
                    encoded.push(b'\n');
                    stdout.write_all(&encoded).await?;
                    stdout.flush().await?;
                }
                None => break "EOF",
            },
        }
    };
    info!("Shutting down ({})", reason);

    // Dropping the orchestrator releases the last trigger handle; the
    // worker finishes pending requests and stops
    drop(orchestrator);
    match tokio::time::timeout(DRAIN_TIMEOUT, worker_handle).await {
        Ok(joined) => joined.context("Reconciliation worker panicked")??,
        Err(_) => anyhow::bail!(
            "Reconciliation worker did not stop within {:?}",
            DRAIN_TIMEOUT
        ),
    }
    let _ = events_handle.await;

    info!("Shutdown complete");
    Ok(())
}

/// Decode one request line and run it through the update path
async fn handle_line(orchestrator: &UpdateOrchestrator, line: &str) -> SaveResponse {
    let request: AdminRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Ignoring malformed request line: {}", e);
            return SaveResponse {
                result: Rejection::MalformedPayload.message(Lang::En),
                dns_conf: "[]".to_string(),
            };
        }
    };

    let body = match request.body() {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to encode request payload: {:#}", e);
            Vec::new()
        }
    };

    debug!(
        "Save request from {} via {}",
        request.context.remote_addr, request.context.host
    );
    orchestrator.save(&body, &request.context).await
}

/// Log worker events until the worker stops
async fn log_events(mut events: mpsc::Receiver<ReconcileEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ReconcileEvent::Started {
                force_full,
                coalesced,
            } => debug!(
                "Reconciliation started (force_full: {}, triggers: {})",
                force_full, coalesced
            ),
            ReconcileEvent::Completed { .. } => debug!("Reconciliation completed"),
            ReconcileEvent::Failed { error } => warn!("Reconciliation failed: {}", error),
            ReconcileEvent::Stopped { reason } => debug!("Reconciliation worker stopped: {}", reason),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
