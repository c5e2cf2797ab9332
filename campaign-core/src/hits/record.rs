// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hit records and their persisted form

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::HttpMethod;

/// Current schema version of a persisted hit.
pub const HIT_SCHEMA_VERSION: u32 = 1;

/// One outbound registration or tracking request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub url: String,
    /// JSON body; empty for tracking hits
    #[serde(default)]
    pub payload: String,
    /// Connect and read timeout, in seconds
    pub timeout: u64,
}

/// Versioned envelope stored in the hit queue
#[derive(Serialize, Deserialize)]
struct PersistedHit {
    v: u32,
    #[serde(flatten)]
    hit: HitRecord,
}

impl HitRecord {
    pub fn new(url: impl Into<String>, payload: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            payload: payload.into(),
            timeout: timeout_secs,
        }
    }

    /// Tracking hit without a body
    pub fn tracking(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self::new(url, String::new(), timeout_secs)
    }

    /// Registration hits carry a payload
    pub fn is_registration(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn method(&self) -> HttpMethod {
        if self.is_registration() {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        }
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Serialize to the persisted queue form
    pub fn to_persisted(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PersistedHit {
            v: HIT_SCHEMA_VERSION,
            hit: self.clone(),
        })
    }

    /// Parse the persisted queue form
    pub fn from_persisted(data: &str) -> Result<Self, HitDecodeError> {
        let persisted: PersistedHit = serde_json::from_str(data)?;
        if persisted.v != HIT_SCHEMA_VERSION {
            return Err(HitDecodeError::UnsupportedVersion(persisted.v));
        }
        if persisted.hit.url.is_empty() {
            return Err(HitDecodeError::EmptyUrl);
        }
        Ok(persisted.hit)
    }
}

/// A persisted hit that cannot be turned back into a record
#[derive(Debug, Error)]
pub enum HitDecodeError {
    #[error("malformed hit: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported hit schema version {0}")]
    UnsupportedVersion(u32),

    #[error("hit has no url")]
    EmptyUrl,
}
