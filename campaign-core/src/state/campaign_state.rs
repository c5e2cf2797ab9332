// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-event campaign state
//!
//! Rebuilt from the latest configuration and identity snapshots on every
//! relevant event and replaced as a whole; never mutated in place.

use std::time::Duration;

use tracing::trace;

use super::privacy::PrivacyStatus;
use super::snapshot::{config_keys, ConfigurationSnapshot, IdentitySnapshot};
use crate::config::CampaignConfig;

/// Immutable view of everything needed to build URLs and gate network work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignState {
    server: Option<String>,
    mcias: Option<String>,
    property_id: Option<String>,
    pkey: Option<String>,
    timeout: Duration,
    privacy: PrivacyStatus,
    registration_delay_days: i64,
    registration_paused: bool,
    ecid: Option<String>,
}

impl CampaignState {
    /// Empty state: nothing configured, privacy unknown
    pub fn empty(defaults: &CampaignConfig) -> Self {
        Self::from_snapshots(
            &ConfigurationSnapshot::default(),
            &IdentitySnapshot::default(),
            defaults,
        )
    }

    /// Build a fresh state from the host snapshots
    pub fn from_snapshots(
        config: &ConfigurationSnapshot,
        identity: &IdentitySnapshot,
        defaults: &CampaignConfig,
    ) -> Self {
        let timeout = config
            .get_i64(config_keys::TIMEOUT)
            .filter(|t| *t > 0)
            .map(|t| Duration::from_secs(t as u64))
            .unwrap_or(defaults.default_timeout);

        let registration_delay_days = config
            .get_i64(config_keys::REGISTRATION_DELAY)
            .filter(|d| *d >= 0)
            .unwrap_or(defaults.default_registration_delay_days);

        Self {
            server: config.get_str(config_keys::SERVER).map(str::to_string),
            mcias: config.get_str(config_keys::MCIAS).map(str::to_string),
            property_id: config.get_str(config_keys::PROPERTY_ID).map(str::to_string),
            pkey: config.get_str(config_keys::PKEY).map(str::to_string),
            timeout,
            privacy: config
                .get_str(config_keys::PRIVACY)
                .map(PrivacyStatus::from_config_value)
                .unwrap_or_default(),
            registration_delay_days,
            registration_paused: config
                .get_bool(config_keys::REGISTRATION_PAUSED)
                .unwrap_or(false),
            ecid: identity.ecid.clone(),
        }
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn mcias(&self) -> Option<&str> {
        self.mcias.as_deref()
    }

    pub fn property_id(&self) -> Option<&str> {
        self.property_id.as_deref()
    }

    pub fn pkey(&self) -> Option<&str> {
        self.pkey.as_deref()
    }

    /// Connect/read timeout for every request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn privacy(&self) -> PrivacyStatus {
        self.privacy
    }

    pub fn registration_delay_days(&self) -> i64 {
        self.registration_delay_days
    }

    pub fn registration_paused(&self) -> bool {
        self.registration_paused
    }

    /// Experience Cloud ID
    pub fn ecid(&self) -> Option<&str> {
        self.ecid.as_deref()
    }

    /// Opted in with ECID, server, mcias and property id known
    pub fn can_download_rules(&self) -> bool {
        if !self.opted_in("download rules") {
            return false;
        }
        self.ecid.is_some()
            && self.server.is_some()
            && self.mcias.is_some()
            && self.property_id.is_some()
    }

    /// Opted in with ECID, server and pkey known
    pub fn can_register_with_current_ecid(&self) -> bool {
        if !self.opted_in("register") {
            return false;
        }
        self.ecid.is_some() && self.server.is_some() && self.pkey.is_some()
    }

    /// Opted in with ECID and server known
    pub fn can_send_track_info(&self) -> bool {
        if !self.opted_in("send track info") {
            return false;
        }
        self.ecid.is_some() && self.server.is_some()
    }

    /// `https://{mcias}/{server}/{propertyId}/{ecid}/rules.zip`
    pub fn rules_url(&self) -> Option<String> {
        Some(format!(
            "https://{}/{}/{}/{}/rules.zip",
            self.mcias.as_deref()?,
            self.server.as_deref()?,
            self.property_id.as_deref()?,
            self.ecid.as_deref()?
        ))
    }

    /// `https://{server}/rest/head/mobileAppV5/{pkey}/subscriptions/{ecid}`
    pub fn registration_url(&self) -> Option<String> {
        Some(format!(
            "https://{}/rest/head/mobileAppV5/{}/subscriptions/{}",
            self.server.as_deref()?,
            self.pkey.as_deref()?,
            self.ecid.as_deref()?
        ))
    }

    /// `https://{server}/r/?id={broadlogId},{deliveryId},{action}&mcId={ecid}`
    pub fn tracking_url(&self, broadlog_id: &str, delivery_id: &str, action: &str) -> Option<String> {
        Some(format!(
            "https://{}/r/?id={},{},{}&mcId={}",
            self.server.as_deref()?,
            broadlog_id,
            delivery_id,
            action,
            self.ecid.as_deref()?
        ))
    }

    fn opted_in(&self, what: &str) -> bool {
        if self.privacy != PrivacyStatus::OptIn {
            trace!(privacy = self.privacy.as_str(), "Cannot {}, privacy status is not opted in", what);
            return false;
        }
        true
    }
}
