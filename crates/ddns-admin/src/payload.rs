//! Wire shapes exchanged with the admin form
//!
//! The form edits provider entries as flat rows with multi-line domain
//! text. [`ProviderRow`] is that shape both ways: decoded from a save
//! request, and rendered (with masked credentials) for display.

use serde::{Deserialize, Serialize};

use crate::config::{GetType, ProviderEntry, redacted};
use crate::domains::join_lines;
use crate::merge::mask;

/// A decoded save request
///
/// The Debug implementation does NOT expose the password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdatePayload {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "NotAllowWanAccess")]
    pub not_allow_wan_access: bool,
    #[serde(rename = "WebhookURL")]
    pub webhook_url: String,
    #[serde(rename = "WebhookRequestBody")]
    pub webhook_request_body: String,
    #[serde(rename = "WebhookHeaders")]
    pub webhook_headers: String,
    #[serde(rename = "DnsConf")]
    pub dns_conf: Vec<ProviderRow>,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for UpdatePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePayload")
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("not_allow_wan_access", &self.not_allow_wan_access)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_request_body", &self.webhook_request_body)
            .field("webhook_headers", &self.webhook_headers)
            .field("dns_conf", &self.dns_conf)
            .finish()
    }
}

impl UpdatePayload {
    /// Decode a payload from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// One provider entry as the form submits and displays it
///
/// A row equal to `ProviderRow::default()` is a blank line in the form and
/// never becomes a stored entry. Its Debug output masks `DnsID` and hides
/// `DnsSecret`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "DnsName")]
    pub dns_name: String,
    #[serde(rename = "DnsID")]
    pub dns_id: String,
    #[serde(rename = "DnsSecret")]
    pub dns_secret: String,

    #[serde(rename = "Ipv4Enable")]
    pub ipv4_enable: bool,
    #[serde(rename = "Ipv4GetType")]
    pub ipv4_get_type: GetType,
    #[serde(rename = "Ipv4Url")]
    pub ipv4_url: String,
    #[serde(rename = "Ipv4NetInterface")]
    pub ipv4_net_interface: String,
    #[serde(rename = "Ipv4Cmd")]
    pub ipv4_cmd: String,
    #[serde(rename = "Ipv4Domains")]
    pub ipv4_domains: String,

    #[serde(rename = "Ipv6Enable")]
    pub ipv6_enable: bool,
    #[serde(rename = "Ipv6GetType")]
    pub ipv6_get_type: GetType,
    #[serde(rename = "Ipv6Url")]
    pub ipv6_url: String,
    #[serde(rename = "Ipv6NetInterface")]
    pub ipv6_net_interface: String,
    #[serde(rename = "Ipv6Cmd")]
    pub ipv6_cmd: String,
    #[serde(rename = "Ipv6Reg")]
    pub ipv6_reg: String,
    #[serde(rename = "Ipv6Domains")]
    pub ipv6_domains: String,
}

impl std::fmt::Debug for ProviderRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRow")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("dns_name", &self.dns_name)
            .field("dns_id", &mask(&self.dns_id))
            .field("dns_secret", &redacted(&self.dns_secret))
            .field("ipv4_enable", &self.ipv4_enable)
            .field("ipv4_get_type", &self.ipv4_get_type)
            .field("ipv4_url", &self.ipv4_url)
            .field("ipv4_net_interface", &self.ipv4_net_interface)
            .field("ipv4_cmd", &self.ipv4_cmd)
            .field("ipv4_domains", &self.ipv4_domains)
            .field("ipv6_enable", &self.ipv6_enable)
            .field("ipv6_get_type", &self.ipv6_get_type)
            .field("ipv6_url", &self.ipv6_url)
            .field("ipv6_net_interface", &self.ipv6_net_interface)
            .field("ipv6_cmd", &self.ipv6_cmd)
            .field("ipv6_reg", &self.ipv6_reg)
            .field("ipv6_domains", &self.ipv6_domains)
            .finish()
    }
}

impl ProviderRow {
    /// Whether this row is the all-default blank row
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Render a stored entry for display, credentials masked
    pub fn display(entry: &ProviderEntry) -> Self {
        Self {
            name: entry.name.clone(),
            ttl: entry.ttl,
            dns_name: entry.provider_name.clone(),
            dns_id: mask(&entry.provider_id),
            dns_secret: mask(&entry.provider_secret),
            ipv4_enable: entry.ipv4.enable,
            ipv4_get_type: entry.ipv4.get_type,
            ipv4_url: entry.ipv4.url.clone(),
            ipv4_net_interface: entry.ipv4.net_interface.clone(),
            ipv4_cmd: entry.ipv4.cmd.clone(),
            ipv4_domains: join_lines(&entry.ipv4.domains),
            ipv6_enable: entry.ipv6.enable,
            ipv6_get_type: entry.ipv6.get_type,
            ipv6_url: entry.ipv6.url.clone(),
            ipv6_net_interface: entry.ipv6.net_interface.clone(),
            ipv6_cmd: entry.ipv6.cmd.clone(),
            ipv6_reg: entry.ipv6.regexp.clone(),
            ipv6_domains: join_lines(&entry.ipv6.domains),
        }
    }
}

/// Render stored entries as the JSON array the form displays
pub fn display_entries(entries: &[ProviderEntry]) -> Result<String, serde_json::Error> {
    let rows: Vec<ProviderRow> = entries.iter().map(ProviderRow::display).collect();
    serde_json::to_string(&rows)
}

/// Transport facts about the request carrying an update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Requester transport address, optionally with port
    #[serde(default)]
    pub remote_addr: String,
    /// Host the server was reached under, optionally with port
    #[serde(default)]
    pub host: String,
    /// Raw `Accept-Language` header
    #[serde(default)]
    pub accept_language: Option<String>,
}

impl RequestContext {
    /// Create a context for the given requester and host
    pub fn new(remote_addr: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            host: host.into(),
            accept_language: None,
        }
    }

    /// Set the `Accept-Language` header
    pub fn with_accept_language(mut self, header: impl Into<String>) -> Self {
        self.accept_language = Some(header.into());
        self
    }
}

/// Response of a save request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    /// `"ok"` or a localized rejection message
    pub result: String,
    /// JSON array of display rows; `"[]"` unless the save succeeded
    #[serde(rename = "dnsConf")]
    pub dns_conf: String,
}

impl SaveResponse {
    /// Result tag of an accepted update
    pub const OK: &'static str = "ok";

    /// Whether the update was accepted
    pub fn is_ok(&self) -> bool {
        self.result == Self::OK
    }
}
