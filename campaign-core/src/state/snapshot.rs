// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shared-state snapshots published by the host
//!
//! The host hands over its configuration and identity shared state as loose
//! JSON maps. These wrappers give typed, lenient access to the keys the
//! engine reads.

use serde_json::{Map, Value};

/// Configuration keys read by the engine.
pub mod config_keys {
    pub const PRIVACY: &str = "global.privacy";
    pub const PROPERTY_ID: &str = "property.id";
    pub const SERVER: &str = "campaign.server";
    pub const PKEY: &str = "campaign.pkey";
    pub const MCIAS: &str = "campaign.mcias";
    pub const TIMEOUT: &str = "campaign.timeout";
    pub const REGISTRATION_DELAY: &str = "campaign.registrationDelay";
    pub const REGISTRATION_PAUSED: &str = "campaign.registrationPaused";
}

/// Identity key holding the Experience Cloud ID.
pub const IDENTITY_ECID_KEY: &str = "mid";

/// Configuration shared state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationSnapshot {
    values: Map<String, Value>,
}

impl ConfigurationSnapshot {
    /// Wraps a configuration map.
    pub fn new(values: Map<String, Value>) -> Self {
        ConfigurationSnapshot { values }
    }

    /// Builds a snapshot from a JSON object; anything else yields an empty snapshot.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => ConfigurationSnapshot { values },
            _ => ConfigurationSnapshot::default(),
        }
    }

    /// Non-empty string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Integer value, accepting numbers and numeric strings.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value, accepting booleans and "true"/"false".
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Whether the snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Identity shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySnapshot {
    /// Experience Cloud ID (`mid`).
    pub ecid: Option<String>,
}

impl IdentitySnapshot {
    /// Identity with a known ECID.
    pub fn with_ecid(ecid: impl Into<String>) -> Self {
        let ecid: String = ecid.into();
        IdentitySnapshot {
            ecid: Some(ecid).filter(|e| !e.is_empty()),
        }
    }

    /// Reads `mid` from an identity shared-state map.
    pub fn from_value(value: &Value) -> Self {
        let ecid = value
            .get(IDENTITY_ECID_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        IdentitySnapshot { ecid }
    }
}
