//! Contract Test: Credential Merge and Entry Assembly
//!
//! This test verifies what the update path persists for provider entries.
//!
//! Constraints verified:
//! - Re-submitting the displayed (masked) form persists the same bytes
//! - A mask is never persisted as a credential
//! - Blank rows never become entries
//! - Rows without domains are kept and produce a warning
//! - Named identity follows entries across reordering

mod common;

use common::*;
use ddns_admin::config::GetType;
use ddns_admin::locale::Warning;
use ddns_admin::payload::ProviderRow;
use ddns_admin::{AdminSettings, Lang, MergeIdentity, UpdateStatus};
use std::sync::Arc;

fn saved_rows(dns_conf: &str) -> Vec<ProviderRow> {
    serde_json::from_str(dns_conf).expect("dnsConf is a JSON array of rows")
}

#[tokio::test]
async fn resubmitting_displayed_form_is_idempotent() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);
    let ctx = private_ctx();

    let mut first_row = row("a.com\nb.com", "v6.a.com");
    first_row.ipv6_reg = "  @1  ".to_string();
    let rows = vec![first_row, row("c.com", "")];

    let response = orchestrator
        .save(&body("admin", STRONG_PASSWORD, false, &rows), &ctx)
        .await;
    assert!(response.is_ok(), "{}", response.result);
    let first = serde_json::to_vec(&store.stored().await).unwrap();

    // The form shows masked credentials and CRLF-joined domains
    let displayed = saved_rows(&response.dns_conf);
    assert_eq!(displayed[0].dns_id, "zon************");
    assert_eq!(displayed[0].ipv4_domains, "a.com\r\nb.com");

    let response = orchestrator
        .save(&body("admin", STRONG_PASSWORD, false, &displayed), &ctx)
        .await;
    assert!(response.is_ok(), "{}", response.result);
    let second = serde_json::to_vec(&store.stored().await).unwrap();

    assert_eq!(first, second);
    assert_eq!(saved_rows(&response.dns_conf), displayed);
}

#[tokio::test]
async fn mask_resolves_to_stored_credential() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);
    let ctx = private_ctx();

    orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &[row("a.com", "")]), &ctx)
        .await;

    // Secret left masked, id replaced
    let mut update = row("a.com", "");
    update.dns_id = "zone-new".to_string();
    update.dns_secret = "cf-**********************".to_string();
    let outcome = orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &[update]), &ctx)
        .await;

    let UpdateStatus::Accepted(config) = outcome.status else {
        panic!("update rejected: {:?}", outcome.rejection());
    };
    assert_eq!(config.entries[0].provider_id, "zone-new");
    assert_eq!(config.entries[0].provider_secret, "cf-token-abcdefghijklmnop");
    assert_eq!(store.stored().await, Some(config));
}

#[tokio::test]
async fn cleared_credential_stays_cleared() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);
    let ctx = private_ctx();

    orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &[row("a.com", "")]), &ctx)
        .await;

    let mut update = row("a.com", "");
    update.dns_secret = String::new();
    orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &[update]), &ctx)
        .await;

    let stored = store.stored().await.unwrap();
    assert_eq!(stored.entries[0].provider_secret, "");
}

#[tokio::test]
async fn blank_rows_are_dropped() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);

    let blank = ProviderRow::default();
    let rows = vec![
        blank.clone(),
        row("a.com", ""),
        blank.clone(),
        row("", "b.com"),
        blank,
    ];
    let outcome = orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &rows), &private_ctx())
        .await;

    assert!(outcome.is_accepted(), "{:?}", outcome.rejection());
    let stored = store.stored().await.unwrap();
    assert_eq!(stored.entries.len(), 2);
    assert_eq!(stored.entries[0].ipv4.domains, vec!["a.com"]);
    assert_eq!(stored.entries[1].ipv6.domains, vec!["b.com"]);
}

#[tokio::test]
async fn rows_without_domains_are_kept_with_warning() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);

    let rows = vec![row("a.com", ""), row("", "")];
    let ctx = private_ctx().with_accept_language("zh-CN");
    let outcome = orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &rows), &ctx)
        .await;

    assert!(outcome.is_accepted(), "{:?}", outcome.rejection());
    assert_eq!(outcome.lang, Lang::Zh);
    assert_eq!(outcome.warnings, vec![Warning::NoDomains { position: 2 }]);
    assert_eq!(outcome.warnings[0].message(Lang::En), "The 2nd configuration has no domains filled in");

    let stored = store.stored().await.unwrap();
    assert_eq!(stored.entries.len(), 2);
    assert_eq!(stored.entries[1].ipv4.domains, vec![""]);
    assert_eq!(stored.lang, Lang::Zh);
}

#[tokio::test]
async fn text_fields_are_trimmed() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);

    let mut padded = row("a.com", "");
    padded.name = "  home  ".to_string();
    padded.dns_id = "\tzone-0123456789 ".to_string();
    padded.ipv4_get_type = GetType::Url;
    padded.ipv4_url = " https://api.ipify.org\n".to_string();
    let outcome = orchestrator
        .apply(&body(" admin ", STRONG_PASSWORD, false, &[padded]), &private_ctx())
        .await;

    let UpdateStatus::Accepted(config) = outcome.status else {
        panic!("update rejected: {:?}", outcome.rejection());
    };
    assert_eq!(config.username, "admin");
    assert_eq!(config.webhook_url, "https://hooks.example.com/ddns");
    assert_eq!(config.entries[0].name, "home");
    assert_eq!(config.entries[0].provider_id, "zone-0123456789");
    assert_eq!(config.entries[0].ipv4.url, "https://api.ipify.org");
}

#[tokio::test]
async fn named_identity_survives_reordering() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let settings = AdminSettings::default().with_merge_identity(MergeIdentity::Named);
    let orchestrator = build_orchestrator_with(&store, &reconciler, settings);
    let ctx = private_ctx();

    let mut home = row("home.example.com", "");
    home.name = "home".to_string();
    home.dns_secret = "home-secret-value".to_string();
    let mut office = row("office.example.com", "");
    office.name = "office".to_string();
    office.dns_secret = "office-secret-value".to_string();

    let response = orchestrator
        .save(&body("admin", STRONG_PASSWORD, false, &[home, office]), &ctx)
        .await;
    assert!(response.is_ok(), "{}", response.result);

    // Operator swaps the two rows without touching the masked secrets
    let mut displayed = saved_rows(&response.dns_conf);
    displayed.reverse();
    orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &displayed), &ctx)
        .await;

    let stored = store.stored().await.unwrap();
    assert_eq!(stored.entries[0].name, "office");
    assert_eq!(stored.entries[0].provider_secret, "office-secret-value");
    assert_eq!(stored.entries[1].name, "home");
    assert_eq!(stored.entries[1].provider_secret, "home-secret-value");
}

#[tokio::test]
async fn positional_identity_keeps_mask_after_reordering() {
    let store = Arc::new(MockConfigStore::new());
    let reconciler = Arc::new(RecordingReconciler::default());
    let orchestrator = build_orchestrator(&store, &reconciler);
    let ctx = private_ctx();

    let mut first = row("one.example.com", "");
    first.dns_secret = "aaa-first-secret".to_string();
    let mut second = row("two.example.com", "");
    second.dns_secret = "bbb-second-secret".to_string();

    let response = orchestrator
        .save(&body("admin", STRONG_PASSWORD, false, &[first, second]), &ctx)
        .await;
    let mut displayed = saved_rows(&response.dns_conf);
    displayed.reverse();
    orchestrator
        .apply(&body("admin", STRONG_PASSWORD, false, &displayed), &ctx)
        .await;

    // Position 0 now carries the mask of the old position 1, which does
    // not match the mask stored at position 0, so it is taken verbatim
    let stored = store.stored().await.unwrap();
    assert_eq!(stored.entries[0].provider_secret, "bbb**************");
}
