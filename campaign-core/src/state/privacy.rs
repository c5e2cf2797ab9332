// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Privacy status

use serde::{Deserialize, Serialize};

/// User privacy status as published by the host configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrivacyStatus {
    /// Network activity allowed.
    OptIn,
    /// Network activity forbidden; queued and cached data is purged.
    OptOut,
    /// Undecided; work is held but kept.
    #[default]
    Unknown,
}

impl PrivacyStatus {
    /// Parses the `global.privacy` configuration value.
    ///
    /// Anything other than `optedin` / `optedout` is `Unknown`.
    pub fn from_config_value(value: &str) -> Self {
        match value {
            "optedin" => PrivacyStatus::OptIn,
            "optedout" => PrivacyStatus::OptOut,
            _ => PrivacyStatus::Unknown,
        }
    }

    /// Configuration string of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyStatus::OptIn => "optedin",
            PrivacyStatus::OptOut => "optedout",
            PrivacyStatus::Unknown => "optunknown",
        }
    }
}
