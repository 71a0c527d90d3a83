//! `Upload-Metadata` header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes pairs as `key base64(value)` joined by commas, in the given order.
pub(crate) fn encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key} {}", STANDARD.encode(value)))
        .collect::<Vec<_>>()
        .join(",")
}
