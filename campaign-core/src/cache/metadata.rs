// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-entry cache metadata
//!
//! Stored next to each cached file as a small JSON sidecar with an explicit
//! schema version, so the on-disk format can evolve without guessing.

use serde::{Deserialize, Serialize};

/// Current sidecar schema version.
pub(crate) const METADATA_SCHEMA_VERSION: u32 = 1;

/// HTTP validators captured from the response that produced a cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Raw ETag, weak prefix included (`W/"..."`)
    pub etag: Option<String>,

    /// Last-Modified as epoch milliseconds, 0 when unknown
    pub last_modified_millis: i64,
}

impl CacheMetadata {
    /// Create metadata from explicit validators
    pub fn new(etag: Option<String>, last_modified_millis: i64) -> Self {
        Self {
            etag: etag.filter(|e| !e.is_empty()),
            last_modified_millis,
        }
    }
}

/// On-disk sidecar layout
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MetadataSidecar {
    pub schema_version: u32,
    pub metadata: CacheMetadata,
}

impl MetadataSidecar {
    pub fn new(metadata: CacheMetadata) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            metadata,
        }
    }
}
