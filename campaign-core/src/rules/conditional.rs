// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conditional request headers
//!
//! Builds the validators sent with a rules download from the metadata of
//! the previous successful sync, and captures the validators of a fresh
//! response for the next one.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::cache::CacheMetadata;
use crate::network::HttpResponse;

pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_RANGE: &str = "If-Range";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";
pub const RANGE: &str = "Range";
/// Carries base64 linkage fields for personalized rules.
pub const LINKAGE_FIELDS_HEADER: &str = "X-InApp-Auth";

const RFC2822_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Headers derived from the previous sync's metadata.
///
/// `cached_size` is the size of the previously downloaded archive.
pub fn build_conditional_headers(
    metadata: &CacheMetadata,
    cached_size: Option<u64>,
) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    let last_modified = format_last_modified(metadata.last_modified_millis);

    if let Some(etag) = metadata.etag.as_deref() {
        headers.push((IF_NONE_MATCH.to_string(), etag.to_string()));
    }

    let if_range = metadata.etag.clone().or_else(|| last_modified.clone());
    if let Some(value) = if_range {
        headers.push((IF_RANGE.to_string(), value));
    }

    if let Some(date) = last_modified {
        headers.push((IF_MODIFIED_SINCE.to_string(), date));
    }

    if let Some(size) = cached_size.filter(|s| *s > 0) {
        headers.push((RANGE.to_string(), format!("bytes={}-", size)));
    }

    headers
}

/// Capture ETag (raw) and Last-Modified (epoch millis) from a response
pub fn extract_metadata(response: &HttpResponse) -> CacheMetadata {
    let etag = response.header("ETag").map(str::to_string);
    let last_modified = response
        .header("Last-Modified")
        .and_then(parse_http_date)
        .unwrap_or(0);
    CacheMetadata::new(etag, last_modified)
}

/// Format epoch millis as an RFC-2822 GMT date; `None` for 0 or out of range
pub fn format_last_modified(millis: i64) -> Option<String> {
    if millis <= 0 {
        return None;
    }
    let date = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(date.format(RFC2822_GMT).to_string())
}

/// Parse an RFC-2822 date into epoch millis
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.timestamp_millis());
    }
    match NaiveDateTime::parse_from_str(value, RFC2822_GMT) {
        Ok(date) => Some(date.and_utc().timestamp_millis()),
        Err(e) => {
            debug!(value, error = %e, "Unparsable Last-Modified header");
            None
        }
    }
}

/// Base64 of the JSON object of linkage fields; `None` when empty
pub fn encode_linkage_fields(fields: &BTreeMap<String, String>) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let json = serde_json::to_string(fields).ok()?;
    Some(STANDARD.encode(json.as_bytes()))
}
