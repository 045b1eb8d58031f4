//! Credential merge
//!
//! Stored provider credentials are shown to the operator in a masked
//! form. When the form is saved again without touching a credential, the
//! mask comes back; the merge recognises it and keeps the stored raw
//! value instead of persisting the mask.

use crate::config::{MergeIdentity, ProviderEntry};

/// Leading characters left visible by [`mask`]
const VISIBLE_PREFIX: usize = 3;

/// Display form of a stored credential
///
/// Values of at most three characters are shown unchanged. Longer values
/// keep their first three characters and every other character becomes
/// `*`.
pub fn mask(value: &str) -> String {
    let total = value.chars().count();
    if total <= VISIBLE_PREFIX {
        return value.to_string();
    }

    let mut masked: String = value.chars().take(VISIBLE_PREFIX).collect();
    masked.extend(std::iter::repeat_n('*', total - VISIBLE_PREFIX));
    masked
}

/// Reconcile one incoming credential field with the stored one
///
/// Returns the stored raw value when `incoming` equals the mask computed
/// from it, otherwise `incoming` verbatim. An empty `incoming` clears the
/// credential.
pub fn merge_credential(incoming: &str, masked: &str, stored: &str) -> String {
    if incoming == masked {
        stored.to_string()
    } else {
        incoming.to_string()
    }
}

/// Merge provider ID and secret of `entry` against its stored counterpart
pub fn merge_entry_credentials(entry: &mut ProviderEntry, stored: &ProviderEntry) {
    entry.provider_id = merge_credential(
        &entry.provider_id,
        &mask(&stored.provider_id),
        &stored.provider_id,
    );
    entry.provider_secret = merge_credential(
        &entry.provider_secret,
        &mask(&stored.provider_secret),
        &stored.provider_secret,
    );
}

/// Find the stored counterpart of the incoming row at `position`
///
/// Under [`MergeIdentity::Named`] a non-empty `name` is looked up among
/// the stored entries; a name with no stored match means a new entry.
/// Unnamed rows, and every row under [`MergeIdentity::Positional`], use
/// the stored entry at the same index.
pub fn counterpart<'a>(
    identity: MergeIdentity,
    stored: &'a [ProviderEntry],
    position: usize,
    name: &str,
) -> Option<&'a ProviderEntry> {
    match identity {
        MergeIdentity::Named if !name.is_empty() => {
            stored.iter().find(|entry| entry.name == name)
        }
        _ => stored.get(position),
    }
}
