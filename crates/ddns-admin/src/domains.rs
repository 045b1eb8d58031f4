//! Multi-line domain list handling
//!
//! The admin form submits each domain list as a single text blob, one
//! hostname per line. Order and duplicates are preserved.

/// Split a text blob into lines
///
/// Splits on `"\r\n"` when the text contains it anywhere, otherwise on
/// `"\n"`. Always yields at least one element: an empty text becomes
/// `[""]`.
pub fn split_lines(text: &str) -> Vec<String> {
    let separator = if text.contains("\r\n") { "\r\n" } else { "\n" };
    text.split(separator).map(str::to_string).collect()
}

/// Inverse of [`split_lines`] used when rendering entries for display
pub fn join_lines(domains: &[String]) -> String {
    domains.join("\r\n")
}

/// Whether neither address family has any domain text
pub fn has_no_domains(ipv4_text: &str, ipv6_text: &str) -> bool {
    ipv4_text.is_empty() && ipv6_text.is_empty()
}
