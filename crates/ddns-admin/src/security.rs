// # Security Gate
//
// Decides whether an update may weaken security at all.
//
// ## Trust window
//
// For a short period after process start (default 5 minutes) any update
// passes: this is how a fresh install gets configured. After the window:
//
// - First-time setup is only accepted when both the requester address
//   and the server's advertised host are private.
// - Setting credentials on an instance that never had any requires a
//   restart (which reopens the window).
//
// Without these rules an attacker who finds an unconfigured public
// instance after the window could take it over by setting credentials.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::Rejection;

/// Default trust window after process start
pub const TRUST_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Facts the gate decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInput {
    /// Time since process start
    pub elapsed: Duration,
    /// No prior configuration could be loaded
    pub first_time: bool,
    /// Requester address and server host are both private
    pub origin_private: bool,
    /// The stored configuration has neither username nor password
    pub stored_credentials_empty: bool,
    /// The update sets a non-empty username or password
    pub sets_credentials: bool,
}

/// Pure policy check for the trust window rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityGate {
    window: Duration,
}

impl SecurityGate {
    /// Create a gate with the given trust window
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Length of the trust window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Allow or reject an update
    pub fn check(&self, input: &GateInput) -> Result<(), Rejection> {
        if input.elapsed <= self.window {
            return Ok(());
        }

        // Whole minutes, rounded up
        let window_minutes = self.window.as_secs().div_ceil(60);

        if input.first_time && !input.origin_private {
            return Err(Rejection::PublicFirstTimeSetup { window_minutes });
        }

        if !input.first_time && input.stored_credentials_empty && input.sets_credentials {
            return Err(Rejection::LateCredentials { window_minutes });
        }

        Ok(())
    }
}

impl Default for SecurityGate {
    fn default() -> Self {
        Self::new(TRUST_WINDOW)
    }
}

/// Whether an address or host (optionally with port) is on a private network
///
/// IP literals count as private when they are loopback, private
/// (RFC 1918 / unique local) or link-local unicast. The name `localhost`
/// and names under `.local` are private too. Anything else is public.
pub fn is_private_network(addr: &str) -> bool {
    let host = strip_port(addr.trim());

    if let Ok(ip) = host.parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
            IpAddr::V6(v6) => {
                if let Some(mapped) = v6.to_ipv4_mapped() {
                    return is_private_network(&mapped.to_string());
                }
                v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local()
            }
        };
    }

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    host == "localhost" || host.ends_with(".local")
}

/// Remove an optional `:port` suffix
///
/// Bracketed IPv6 (`[::1]:8080`) keeps what is inside the brackets; an
/// unclosed bracket is returned unchanged and so never parses as an IP. A
/// bare IPv6 literal has several colons and is returned unchanged.
fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => addr,
        };
    }

    match addr.rfind(':') {
        Some(idx) if addr[..idx].contains(':') => addr,
        Some(idx) => &addr[..idx],
        None => addr,
    }
}
