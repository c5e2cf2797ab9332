// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Conditional cache module
//!
//! File-backed byte cache where every entry carries the HTTP validators
//! (ETag, Last-Modified) of the response that produced it. Both the rule
//! bundle and the message assets are stored here:
//! - `campaign/campaignRules/<file>` for extracted bundle files
//! - `campaign/messages/<messageId>/<sha256(url)>` for remote assets

mod keys;
mod metadata;
mod store;

pub use keys::asset_cache_key;
pub use metadata::CacheMetadata;
pub use store::{CacheEntry, CacheError, ConditionalCacheStore};

/// Namespace shared by every file extracted from the rule bundle.
pub const RULES_NAMESPACE: &str = "campaign/campaignRules";

/// Parent namespace of the per-message asset namespaces.
pub const MESSAGES_NAMESPACE: &str = "campaign/messages";

/// Namespace holding the assets of one message.
pub fn message_namespace(message_id: &str) -> String {
    format!("{}/{}", MESSAGES_NAMESPACE, message_id)
}
