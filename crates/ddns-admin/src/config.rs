//! Configuration types for the admin update path
//!
//! [`GlobalConfig`] is the persisted runtime configuration of the agent.
//! Its serialized field names are a stable contract with the config
//! store. [`AdminSettings`] tunes the update policies themselves.

use serde::{Deserialize, Serialize};

use crate::locale::Lang;

/// Persisted runtime configuration
///
/// The Debug implementation does NOT expose the password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Admin username, empty when unset
    #[serde(rename = "Username", default)]
    pub username: String,

    /// Admin password, empty when unset
    #[serde(rename = "Password", default)]
    pub password: String,

    /// Restrict the admin surface to private network origins
    #[serde(rename = "NotAllowWanAccess", default)]
    pub not_allow_wan_access: bool,

    /// Webhook target
    #[serde(rename = "WebhookURL", default)]
    pub webhook_url: String,

    /// Webhook request body template
    #[serde(rename = "WebhookRequestBody", default)]
    pub webhook_request_body: String,

    /// Webhook headers, one per line
    #[serde(rename = "WebhookHeaders", default)]
    pub webhook_headers: String,

    /// Language of the last operator who saved
    #[serde(rename = "Lang", default)]
    pub lang: Lang,

    /// Provider bindings, in display order
    #[serde(rename = "DnsConfEntries", default)]
    pub entries: Vec<ProviderEntry>,
}

impl GlobalConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether neither a username nor a password is set
    pub fn has_no_credentials(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for GlobalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalConfig")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("not_allow_wan_access", &self.not_allow_wan_access)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_request_body", &self.webhook_request_body)
            .field("webhook_headers", &self.webhook_headers)
            .field("lang", &self.lang)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Placeholder printed instead of a secret; empty stays visibly empty
pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<REDACTED>" }
}

/// One configured DNS-backend binding
///
/// The Debug implementation masks the provider ID and hides the secret.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Optional operator-chosen label, used by [`MergeIdentity::Named`]
    #[serde(rename = "Name", default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Record TTL in seconds
    #[serde(rename = "TTL", default)]
    pub ttl: u32,

    /// Which DNS backend to use
    #[serde(rename = "ProviderName", default)]
    pub provider_name: String,

    /// Provider credential identifier
    #[serde(rename = "ProviderID", default)]
    pub provider_id: String,

    /// Provider credential secret
    #[serde(rename = "ProviderSecret", default)]
    pub provider_secret: String,

    /// IPv4 address discovery and records
    #[serde(rename = "IPv4", default)]
    pub ipv4: Ipv4Settings,

    /// IPv6 address discovery and records
    #[serde(rename = "IPv6", default)]
    pub ipv6: Ipv6Settings,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("provider_name", &self.provider_name)
            .field("provider_id", &crate::merge::mask(&self.provider_id))
            .field("provider_secret", &redacted(&self.provider_secret))
            .field("ipv4", &self.ipv4)
            .field("ipv6", &self.ipv6)
            .finish()
    }
}

/// How the agent discovers its current address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GetType {
    /// Not chosen yet
    #[default]
    #[serde(rename = "")]
    Unspecified,
    /// Query an external URL
    #[serde(rename = "url")]
    Url,
    /// Read a local network interface
    #[serde(rename = "netInterface")]
    NetInterface,
    /// Run a shell command
    #[serde(rename = "cmd")]
    Cmd,
}

/// IPv4 settings of a provider entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Settings {
    #[serde(rename = "Enable", default)]
    pub enable: bool,
    #[serde(rename = "GetType", default)]
    pub get_type: GetType,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "NetInterface", default)]
    pub net_interface: String,
    #[serde(rename = "Cmd", default)]
    pub cmd: String,
    #[serde(rename = "Domains", default)]
    pub domains: Vec<String>,
}

/// IPv6 settings of a provider entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv6Settings {
    #[serde(rename = "Enable", default)]
    pub enable: bool,
    #[serde(rename = "GetType", default)]
    pub get_type: GetType,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "NetInterface", default)]
    pub net_interface: String,
    #[serde(rename = "Cmd", default)]
    pub cmd: String,
    /// Pattern selecting one address when the interface has several
    #[serde(rename = "Regexp", default)]
    pub regexp: String,
    #[serde(rename = "Domains", default)]
    pub domains: Vec<String>,
}

/// How an incoming row finds its stored counterpart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeIdentity {
    /// Row `k` merges with stored entry `k`
    #[default]
    Positional,
    /// Rows with a non-empty name merge with the stored entry of the same
    /// name; unnamed rows fall back to position
    Named,
}

impl std::str::FromStr for MergeIdentity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positional" => Ok(MergeIdentity::Positional),
            "named" => Ok(MergeIdentity::Named),
            other => Err(crate::Error::config(format!(
                "Unknown merge identity '{other}'. Valid: positional, named"
            ))),
        }
    }
}

/// Policy settings for the update path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    /// Relaxed-rules window after process start (in seconds)
    #[serde(default = "default_trust_window_secs")]
    pub trust_window_secs: u64,

    /// Minimum password entropy when the admin surface is private-only
    #[serde(default = "default_min_entropy_bits_lan")]
    pub min_entropy_bits_lan: f64,

    /// Minimum password entropy when the admin surface is public
    #[serde(default = "default_min_entropy_bits_wan")]
    pub min_entropy_bits_wan: f64,

    /// Counterpart lookup used by the credential merge
    #[serde(default)]
    pub merge_identity: MergeIdentity,

    /// Pending reconciliation requests before triggers are dropped
    #[serde(default = "default_reconcile_queue_capacity")]
    pub reconcile_queue_capacity: usize,

    /// Capacity of the reconciliation event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl AdminSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self {
            trust_window_secs: default_trust_window_secs(),
            min_entropy_bits_lan: default_min_entropy_bits_lan(),
            min_entropy_bits_wan: default_min_entropy_bits_wan(),
            merge_identity: MergeIdentity::default(),
            reconcile_queue_capacity: default_reconcile_queue_capacity(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the trust window
    pub fn with_trust_window_secs(mut self, secs: u64) -> Self {
        self.trust_window_secs = secs;
        self
    }

    /// Set the merge identity strategy
    pub fn with_merge_identity(mut self, identity: MergeIdentity) -> Self {
        self.merge_identity = identity;
        self
    }

    /// Entropy threshold for the given wan-access setting
    pub fn min_entropy_bits(&self, not_allow_wan_access: bool) -> f64 {
        if not_allow_wan_access {
            self.min_entropy_bits_lan
        } else {
            self.min_entropy_bits_wan
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.min_entropy_bits_lan.is_finite() || self.min_entropy_bits_lan < 0.0 {
            return Err(crate::Error::config(
                "min_entropy_bits_lan must be a non-negative number",
            ));
        }
        if !self.min_entropy_bits_wan.is_finite() || self.min_entropy_bits_wan < 0.0 {
            return Err(crate::Error::config(
                "min_entropy_bits_wan must be a non-negative number",
            ));
        }
        if self.reconcile_queue_capacity == 0 {
            return Err(crate::Error::config("reconcile_queue_capacity must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self::new()
    }
}

fn default_trust_window_secs() -> u64 {
    300
}

fn default_min_entropy_bits_lan() -> f64 {
    25.0
}

fn default_min_entropy_bits_wan() -> f64 {
    50.0
}

fn default_reconcile_queue_capacity() -> usize {
    16
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_field_names() {
        let mut config = GlobalConfig::new();
        config.username = "admin".to_string();
        config.entries.push(ProviderEntry {
            ttl: 600,
            provider_name: "cloudflare".to_string(),
            ..ProviderEntry::default()
        });

        let json = serde_json::to_value(&config).unwrap();
        for key in [
            "Username",
            "Password",
            "NotAllowWanAccess",
            "WebhookURL",
            "WebhookRequestBody",
            "WebhookHeaders",
            "DnsConfEntries",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }

        let entry = &json["DnsConfEntries"][0];
        assert_eq!(entry["TTL"], 600);
        assert_eq!(entry["ProviderName"], "cloudflare");
        assert!(entry.get("Name").is_none());
        assert_eq!(entry["IPv6"]["Regexp"], "");
        assert_eq!(entry["IPv4"]["GetType"], "");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = GlobalConfig {
            username: "admin".to_string(),
            password: "hunter2-but-longer".to_string(),
            entries: vec![ProviderEntry {
                provider_id: "LTAI5tRealKeyId".to_string(),
                provider_secret: "s3cr3t-token-value".to_string(),
                ..ProviderEntry::default()
            }],
            ..GlobalConfig::default()
        };

        let debug = format!("{:?}", config);
        assert!(debug.contains("admin"));
        assert!(debug.contains("LTA************"));
        assert!(debug.contains("<REDACTED>"));
        assert!(!debug.contains("hunter2-but-longer"));
        assert!(!debug.contains("LTAI5tRealKeyId"));
        assert!(!debug.contains("s3cr3t-token-value"));
    }

    #[test]
    fn test_get_type_wire_names() {
        let parsed: Vec<GetType> =
            serde_json::from_str(r#"["", "url", "netInterface", "cmd"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![GetType::Unspecified, GetType::Url, GetType::NetInterface, GetType::Cmd]
        );
    }

    #[test]
    fn test_settings_defaults_from_empty_json() {
        let settings: AdminSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, AdminSettings::default());
        assert_eq!(settings.trust_window_secs, 300);
        assert_eq!(settings.min_entropy_bits(true), 25.0);
        assert_eq!(settings.min_entropy_bits(false), 50.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = AdminSettings::default();
        settings.reconcile_queue_capacity = 0;
        assert!(settings.validate().is_err());

        let mut settings = AdminSettings::default();
        settings.min_entropy_bits_wan = f64::NAN;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_merge_identity_from_str() {
        assert_eq!("named".parse::<MergeIdentity>().unwrap(), MergeIdentity::Named);
        assert_eq!(
            "Positional".parse::<MergeIdentity>().unwrap(),
            MergeIdentity::Positional
        );
        assert!("by-id".parse::<MergeIdentity>().is_err());
    }
}
