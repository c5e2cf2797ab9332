// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Local configuration for the campaign engine
//!
//! Remote settings (server, pkey, privacy...) arrive at runtime as a
//! [`ConfigurationSnapshot`](crate::state::ConfigurationSnapshot). This struct
//! only holds what the embedding app decides up front.

use std::path::PathBuf;
use std::time::Duration;

/// Default request timeout when the remote configuration doesn't set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of days between two registration requests.
pub const DEFAULT_REGISTRATION_DELAY_DAYS: i64 = 7;

/// Fixed backoff applied to a hit that failed with a recoverable error.
pub const DEFAULT_HIT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for the campaign engine
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Root directory for the rules/asset cache and the SQLite database
    pub storage_path: PathBuf,

    /// HTTP timeout used when the remote configuration has none
    pub default_timeout: Duration,

    /// Registration delay used when the remote configuration has none
    pub default_registration_delay_days: i64,

    /// Backoff between two attempts of a retryable hit
    pub hit_retry_interval: Duration,

    /// Capacity of the bounded event work queue
    pub work_queue_capacity: usize,

    /// Push platform reported in registration payloads
    pub push_platform: String,

    /// User agent sent by the HTTP transport
    pub user_agent: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("."),
            default_timeout: DEFAULT_TIMEOUT,
            default_registration_delay_days: DEFAULT_REGISTRATION_DELAY_DAYS,
            hit_retry_interval: DEFAULT_HIT_RETRY_INTERVAL,
            work_queue_capacity: 64,
            push_platform: "gcm".to_string(),
            user_agent: format!(
                "CampaignCore/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ),
        }
    }
}

impl CampaignConfig {
    /// Configuration rooted at `storage_path`, defaults otherwise
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            ..Self::default()
        }
    }

    /// Override the hit retry backoff
    pub fn with_hit_retry_interval(mut self, interval: Duration) -> Self {
        self.hit_retry_interval = interval;
        self
    }

    /// Override the event work queue capacity
    pub fn with_work_queue_capacity(mut self, capacity: usize) -> Self {
        self.work_queue_capacity = capacity.max(1);
        self
    }

    /// Override the push platform reported at registration
    pub fn with_push_platform(mut self, platform: impl Into<String>) -> Self {
        self.push_platform = platform.into();
        self
    }

    /// Override the fallback HTTP timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Path of the SQLite database holding the hit queue and datastore
    pub fn database_path(&self) -> PathBuf {
        self.storage_path.join("campaign.db")
    }

    /// Root of the file cache
    pub fn cache_path(&self) -> PathBuf {
        self.storage_path.join("cache")
    }

    /// Parent directory for bundle scratch directories
    pub fn scratch_path(&self) -> PathBuf {
        self.storage_path.join("campaign-tmp")
    }
}
