//! Update orchestration
//!
//! [`UpdateOrchestrator`] runs one configuration update from payload to
//! persisted configuration:
//!
//! ```text
//! load ─▶ decode ─▶ locale ─▶ security gate ─▶ global fields
//!      ─▶ wan invariant ─▶ password strength ─▶ assemble entries
//!      ─▶ save ─▶ trigger one-shot reconciliation ─▶ outcome
//! ```
//!
//! Every step before `save` may reject the update; a rejection abandons
//! the working copy and writes nothing. The reconciliation trigger fires
//! after every save attempt, successful or not.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::assemble::ConfigAssembler;
use crate::config::{AdminSettings, GlobalConfig};
use crate::error::{Rejection, Result};
use crate::locale::{Lang, Warning};
use crate::password::{EntropyScorer, PasswordScorer};
use crate::payload::{RequestContext, SaveResponse, UpdatePayload, display_entries};
use crate::security::{GateInput, SecurityGate, is_private_network};
use crate::traits::{ConfigStore, Reconciler};

/// Terminal state of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Persisted; carries the configuration as saved
    Accepted(GlobalConfig),
    /// Refused or failed to persist
    Rejected(Rejection),
}

/// Result of [`UpdateOrchestrator::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Accepted or rejected
    pub status: UpdateStatus,
    /// Language the operator asked for
    pub lang: Lang,
    /// Soft warnings raised while assembling entries
    pub warnings: Vec<Warning>,
}

impl UpdateOutcome {
    /// Whether the update was persisted
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, UpdateStatus::Accepted(_))
    }

    /// The rejection, if any
    pub fn rejection(&self) -> Option<&Rejection> {
        match &self.status {
            UpdateStatus::Rejected(rejection) => Some(rejection),
            UpdateStatus::Accepted(_) => None,
        }
    }

    /// `"ok"` or the localized rejection message
    pub fn message(&self) -> String {
        match &self.status {
            UpdateStatus::Accepted(_) => SaveResponse::OK.to_string(),
            UpdateStatus::Rejected(rejection) => rejection.message(self.lang),
        }
    }
}

/// Validates, merges and persists configuration updates
///
/// ## Concurrency
///
/// Each call is an independent pipeline and takes no locks. Two racing
/// updates both load the same baseline; the later `save()` wins, and a
/// reconciliation triggered by the earlier one may run against either
/// configuration. The store serializes its own writes.
pub struct UpdateOrchestrator {
    store: Arc<dyn ConfigStore>,
    reconciler: Arc<dyn Reconciler>,
    scorer: Box<dyn PasswordScorer>,
    gate: SecurityGate,
    assembler: ConfigAssembler,
    settings: AdminSettings,
    started_at: Instant,
}

impl UpdateOrchestrator {
    /// Create an orchestrator whose trust window starts now
    ///
    /// # Parameters
    ///
    /// - `store`: Config store holding the current configuration
    /// - `reconciler`: Trigger for one-shot reconciliation
    /// - `settings`: Policy settings
    pub fn new(
        store: Arc<dyn ConfigStore>,
        reconciler: Arc<dyn Reconciler>,
        settings: AdminSettings,
    ) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            store,
            reconciler,
            scorer: Box::new(EntropyScorer::new()),
            gate: SecurityGate::new(std::time::Duration::from_secs(settings.trust_window_secs)),
            assembler: ConfigAssembler::new(settings.merge_identity),
            settings,
            started_at: Instant::now(),
        })
    }

    /// Measure the trust window from `started_at` (usually process start)
    pub fn with_start_time(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Replace the password scorer
    pub fn with_scorer(mut self, scorer: Box<dyn PasswordScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Policy settings in use
    pub fn settings(&self) -> &AdminSettings {
        &self.settings
    }

    /// Handle a save request and build the form response
    ///
    /// On success `dnsConf` holds the persisted entries with masked
    /// credentials; otherwise it is `"[]"`.
    pub async fn save(&self, body: &[u8], ctx: &RequestContext) -> SaveResponse {
        let outcome = self.apply(body, ctx).await;

        let dns_conf = match &outcome.status {
            UpdateStatus::Accepted(config) => display_entries(&config.entries).unwrap_or_else(|e| {
                error!("Failed to render saved entries: {}", e);
                "[]".to_string()
            }),
            UpdateStatus::Rejected(_) => "[]".to_string(),
        };

        SaveResponse {
            result: outcome.message(),
            dns_conf,
        }
    }

    /// Apply a raw JSON payload
    pub async fn apply(&self, body: &[u8], ctx: &RequestContext) -> UpdateOutcome {
        self.run(UpdatePayload::from_slice(body), ctx).await
    }

    /// Apply an already decoded payload
    pub async fn apply_payload(&self, payload: UpdatePayload, ctx: &RequestContext) -> UpdateOutcome {
        self.run(Ok(payload), ctx).await
    }

    async fn run(
        &self,
        payload: std::result::Result<UpdatePayload, serde_json::Error>,
        ctx: &RequestContext,
    ) -> UpdateOutcome {
        let lang = Lang::from_accept_language(ctx.accept_language.as_deref());
        let mut warnings = Vec::new();

        let status = match self.pipeline(payload, ctx, lang, &mut warnings).await {
            Ok(config) => UpdateStatus::Accepted(config),
            Err(rejection) => {
                warn!("Configuration update rejected: {}", rejection);
                UpdateStatus::Rejected(rejection)
            }
        };

        UpdateOutcome {
            status,
            lang,
            warnings,
        }
    }

    async fn pipeline(
        &self,
        payload: std::result::Result<UpdatePayload, serde_json::Error>,
        ctx: &RequestContext,
        lang: Lang,
        warnings: &mut Vec<Warning>,
    ) -> std::result::Result<GlobalConfig, Rejection> {
        // 1. Current configuration; anything unloadable means first-time setup
        let (mut config, first_time) = match self.store.load().await {
            Ok(Some(config)) => (config, false),
            Ok(None) => (GlobalConfig::new(), true),
            Err(e) => {
                warn!("Failed to load configuration, treating as first-time setup: {}", e);
                (GlobalConfig::new(), true)
            }
        };

        // 2. Decode
        let payload = payload.map_err(|e| {
            debug!("Payload decode failed: {}", e);
            Rejection::MalformedPayload
        })?;

        // 3. Locale
        config.lang = lang;

        // 4. Security gate
        let username = payload.username.trim().to_string();
        let password = payload.password.trim().to_string();
        let stored_credentials_empty = config.has_no_credentials();

        self.gate.check(&GateInput {
            elapsed: self.started_at.elapsed(),
            first_time,
            origin_private: is_private_network(&ctx.remote_addr) && is_private_network(&ctx.host),
            stored_credentials_empty,
            sets_credentials: !username.is_empty() || !password.is_empty(),
        })?;

        // 5. Global fields
        config.not_allow_wan_access = payload.not_allow_wan_access;
        config.username = username;
        config.password = password;
        config.webhook_url = payload.webhook_url.trim().to_string();
        config.webhook_request_body = payload.webhook_request_body.trim().to_string();
        config.webhook_headers = payload.webhook_headers.trim().to_string();

        // 6. Public access needs both credentials
        if !config.not_allow_wan_access && (config.username.is_empty() || config.password.is_empty())
        {
            return Err(Rejection::WanCredentialsRequired);
        }

        // 7. Password strength
        if !config.password.is_empty() {
            let min_bits = self.settings.min_entropy_bits(config.not_allow_wan_access);
            self.scorer
                .validate(&config.password, min_bits)
                .map_err(|weak| {
                    debug!("{}", weak);
                    Rejection::WeakPassword
                })?;
        }

        // 8. Entries
        let assembly = self.assembler.assemble(
            &payload.dns_conf,
            &config.entries,
            stored_credentials_empty,
            lang,
        )?;
        warnings.extend(assembly.warnings);
        config.entries = assembly.entries;

        // 9. Persist
        let saved = self.store.save(&config).await;

        // 10. Reconcile, whether or not the save went through
        self.reconciler.trigger_one_shot(true);

        // 11. Outcome
        match saved {
            Ok(()) => {
                info!(
                    "Configuration saved: {} provider entr{}",
                    config.entries.len(),
                    if config.entries.len() == 1 { "y" } else { "ies" }
                );
                Ok(config)
            }
            Err(e) => {
                error!("Failed to save configuration: {}", e);
                Err(Rejection::Store(e.to_string()))
            }
        }
    }
}
