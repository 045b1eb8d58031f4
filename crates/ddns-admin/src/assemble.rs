//! Config assembly
//!
//! Turns the submitted rows into the normalized entry list, in order:
//!
//! 1. Blank rows are dropped.
//! 2. Text fields are trimmed and domain texts split into lists.
//! 3. Credentials are merged with the stored counterpart, if any.
//! 4. A changed address command is refused while the instance has no
//!    credentials: running commands is privileged.
//!
//! Any refusal aborts the whole assembly.

use tracing::{debug, warn};

use crate::config::{Ipv4Settings, Ipv6Settings, MergeIdentity, ProviderEntry};
use crate::domains::{has_no_domains, split_lines};
use crate::error::Rejection;
use crate::locale::{Lang, Warning};
use crate::merge::{counterpart, merge_entry_credentials};
use crate::payload::ProviderRow;

/// Result of a successful assembly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    /// Entries to persist
    pub entries: Vec<ProviderEntry>,
    /// Soft warnings raised on the way
    pub warnings: Vec<Warning>,
}

/// Builds provider entries from submitted rows
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigAssembler {
    identity: MergeIdentity,
}

impl ConfigAssembler {
    /// Create an assembler using the given counterpart lookup
    pub fn new(identity: MergeIdentity) -> Self {
        Self { identity }
    }

    /// Assemble `rows` against the `stored` entries
    ///
    /// `stored_credentials_empty` is whether the configuration in force
    /// before this update has neither username nor password. `lang`
    /// localizes the logged warnings.
    pub fn assemble(
        &self,
        rows: &[ProviderRow],
        stored: &[ProviderEntry],
        stored_credentials_empty: bool,
        lang: Lang,
    ) -> Result<Assembly, Rejection> {
        let mut assembly = Assembly::default();

        for (position, row) in rows.iter().enumerate() {
            if row.is_blank() {
                debug!("Skipping blank row {}", position + 1);
                continue;
            }

            if has_no_domains(&row.ipv4_domains, &row.ipv6_domains) {
                let warning = Warning::NoDomains {
                    position: position + 1,
                };
                warn!("{}", warning.message(lang));
                assembly.warnings.push(warning);
            }

            let mut entry = build_entry(row);

            if let Some(previous) = counterpart(self.identity, stored, position, &entry.name) {
                merge_entry_credentials(&mut entry, previous);

                if stored_credentials_empty
                    && (previous.ipv4.cmd != entry.ipv4.cmd || previous.ipv6.cmd != entry.ipv6.cmd)
                {
                    warn!(
                        "Refusing command change on row {} without credentials",
                        position + 1
                    );
                    return Err(Rejection::CommandChangeNeedsCredentials);
                }
            }

            assembly.entries.push(entry);
        }

        Ok(assembly)
    }
}

/// Normalize one submitted row into an entry (no merge)
fn build_entry(row: &ProviderRow) -> ProviderEntry {
    ProviderEntry {
        name: row.name.trim().to_string(),
        ttl: row.ttl,
        provider_name: row.dns_name.clone(),
        provider_id: row.dns_id.trim().to_string(),
        provider_secret: row.dns_secret.trim().to_string(),
        ipv4: Ipv4Settings {
            enable: row.ipv4_enable,
            get_type: row.ipv4_get_type,
            url: row.ipv4_url.trim().to_string(),
            net_interface: row.ipv4_net_interface.clone(),
            cmd: row.ipv4_cmd.trim().to_string(),
            domains: split_lines(&row.ipv4_domains),
        },
        ipv6: Ipv6Settings {
            enable: row.ipv6_enable,
            get_type: row.ipv6_get_type,
            url: row.ipv6_url.trim().to_string(),
            net_interface: row.ipv6_net_interface.clone(),
            cmd: row.ipv6_cmd.trim().to_string(),
            regexp: row.ipv6_reg.trim().to_string(),
            domains: split_lines(&row.ipv6_domains),
        },
    }
}
