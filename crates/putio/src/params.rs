//! Argument validation and encoding shared by the services.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::{InvalidArgument, Result};

/// Rejects negative ids.
pub(crate) fn check_id(id: i64) -> Result<i64> {
    if id < 0 {
        return Err(InvalidArgument::NegativeId.into());
    }
    Ok(id)
}

/// Joins ids as `1,2,3`, rejecting an empty list with `empty`.
pub(crate) fn join_ids(ids: &[i64], empty: InvalidArgument) -> Result<String> {
    if ids.is_empty() {
        return Err(empty.into());
    }
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        out.push(check_id(id)?.to_string());
    }
    Ok(out.join(","))
}

/// Percent-encodes a caller-supplied path segment.
pub(crate) fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}
