//! Test doubles and common utilities for update contract tests
//!
//! This module provides minimal doubles for the collaborators of the
//! update path plus builders for request payloads.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_admin::config::GlobalConfig;
use ddns_admin::error::{Error, Result};
use ddns_admin::payload::{ProviderRow, RequestContext};
use ddns_admin::store::MemoryConfigStore;
use ddns_admin::traits::{ConfigStore, ReconcileJob, Reconciler};
use ddns_admin::{AdminSettings, UpdateOrchestrator};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Comfortably above the public-access threshold
pub const STRONG_PASSWORD: &str = "Tr0ub4dour&3horse!";

/// Above the private-only threshold, below the public one
pub const LAN_GRADE_PASSWORD: &str = "password";

/// A config store double that counts calls and can fail loads or saves
pub struct MockConfigStore {
    inner: MemoryConfigStore,
    load_calls: Arc<AtomicUsize>,
    save_calls: Arc<AtomicUsize>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl MockConfigStore {
    /// Empty store (first-time setup)
    pub fn new() -> Self {
        Self::wrapping(MemoryConfigStore::new())
    }

    /// Store that already holds `config`
    pub fn with_config(config: GlobalConfig) -> Self {
        Self::wrapping(MemoryConfigStore::with_config(config))
    }

    fn wrapping(inner: MemoryConfigStore) -> Self {
        Self {
            inner,
            load_calls: Arc::new(AtomicUsize::new(0)),
            save_calls: Arc::new(AtomicUsize::new(0)),
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make every following load fail
    pub fn fail_loads(&self) {
        self.fail_loads.store(true, Ordering::SeqCst);
    }

    /// Make every following save fail
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// Get the number of times load() was called
    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times save() was called
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// What a fresh load would return, bypassing the counters
    pub async fn stored(&self) -> Option<GlobalConfig> {
        self.inner.load().await.expect("memory store never fails")
    }
}

#[async_trait]
impl ConfigStore for MockConfigStore {
    async fn load(&self) -> Result<Option<GlobalConfig>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(Error::store("config file unreadable"));
        }
        self.inner.load().await
    }

    async fn save(&self, config: &GlobalConfig) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::store("disk full"));
        }
        self.inner.save(config).await
    }
}

/// A reconciler double that records every trigger
#[derive(Default)]
pub struct RecordingReconciler {
    triggers: Mutex<Vec<bool>>,
}

impl RecordingReconciler {
    /// `force_full` flags of every trigger so far
    pub fn triggers(&self) -> Vec<bool> {
        self.triggers.lock().unwrap().clone()
    }
}

impl Reconciler for RecordingReconciler {
    fn trigger_one_shot(&self, force_full: bool) {
        self.triggers.lock().unwrap().push(force_full);
    }
}

/// A reconcile job double that counts runs
#[derive(Default)]
pub struct CountingJob {
    runs: AtomicUsize,
    forced_runs: AtomicUsize,
}

impl CountingJob {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn forced_runs(&self) -> usize {
        self.forced_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReconcileJob for CountingJob {
    async fn run_once(&self, force_full: bool) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if force_full {
            self.forced_runs.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Orchestrator wired to the given doubles with default settings
pub fn build_orchestrator(
    store: &Arc<MockConfigStore>,
    reconciler: &Arc<RecordingReconciler>,
) -> UpdateOrchestrator {
    build_orchestrator_with(store, reconciler, AdminSettings::default())
}

/// Orchestrator wired to the given doubles
pub fn build_orchestrator_with(
    store: &Arc<MockConfigStore>,
    reconciler: &Arc<RecordingReconciler>,
    settings: AdminSettings,
) -> UpdateOrchestrator {
    UpdateOrchestrator::new(store.clone(), reconciler.clone(), settings)
        .expect("default settings are valid")
}

/// Requester and host both on the loopback interface
pub fn private_ctx() -> RequestContext {
    RequestContext::new("127.0.0.1:51234", "localhost:9876")
}

/// Requester on the internet, server reached under a public name
pub fn public_ctx() -> RequestContext {
    RequestContext::new("203.0.113.7:40000", "ddns.example.com:9876")
}

/// A filled-in provider row
pub fn row(ipv4_domains: &str, ipv6_domains: &str) -> ProviderRow {
    ProviderRow {
        ttl: 600,
        dns_name: "cloudflare".to_string(),
        dns_id: "zone-0123456789".to_string(),
        dns_secret: "cf-token-abcdefghijklmnop".to_string(),
        ipv4_enable: !ipv4_domains.is_empty(),
        ipv4_url: "https://api.ipify.org".to_string(),
        ipv4_domains: ipv4_domains.to_string(),
        ipv6_enable: !ipv6_domains.is_empty(),
        ipv6_domains: ipv6_domains.to_string(),
        ..ProviderRow::default()
    }
}

/// JSON body of a save request
pub fn body(
    username: &str,
    password: &str,
    not_allow_wan_access: bool,
    rows: &[ProviderRow],
) -> Vec<u8> {
    let value: Value = json!({
        "Username": username,
        "Password": password,
        "NotAllowWanAccess": not_allow_wan_access,
        "WebhookURL": "  https://hooks.example.com/ddns  ",
        "WebhookRequestBody": "",
        "WebhookHeaders": "",
        "DnsConf": rows,
    });
    serde_json::to_vec(&value).expect("payload serializes")
}

/// A stored configuration that is private-only and has no credentials
pub fn lan_only_without_credentials() -> GlobalConfig {
    GlobalConfig {
        not_allow_wan_access: true,
        ..GlobalConfig::default()
    }
}
