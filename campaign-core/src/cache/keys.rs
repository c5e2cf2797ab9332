// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cache keys for remote assets
//!
//! Asset URLs can't be used as file names, so they are keyed by the
//! hex-encoded SHA-256 of the URL.

use ring::digest::{Context, SHA256};

/// Compute the cache key of a remote asset URL
///
/// # Example
/// ```
/// use campaign_core::cache::asset_cache_key;
///
/// let key = asset_cache_key("https://example.com/banner.png");
/// assert_eq!(key.len(), 64);
/// ```
pub fn asset_cache_key(url: &str) -> String {
    let mut context = Context::new(&SHA256);
    context.update(url.as_bytes());
    hex::encode(context.finish().as_ref())
}
