// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mutable extension context
//!
//! Owned by the dispatch loop and passed to each handler. Holds the latest
//! host snapshots, the state derived from them, and the few flags that
//! carry over from one event to the next.

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::CampaignConfig;
use crate::rules::encode_linkage_fields;
use crate::state::{CampaignState, ConfigurationSnapshot, IdentitySnapshot};

/// Cross-event state of the extension
#[derive(Debug, Clone)]
pub struct CampaignContext {
    configuration: ConfigurationSnapshot,
    identity: IdentitySnapshot,
    state: CampaignState,
    linkage_header: Option<String>,
    /// Set while a rules download is owed for the current configuration
    has_to_download_rules: bool,
    cached_rules_loaded: bool,
}

impl CampaignContext {
    pub fn new(defaults: &CampaignConfig) -> Self {
        Self {
            configuration: ConfigurationSnapshot::default(),
            identity: IdentitySnapshot::default(),
            state: CampaignState::empty(defaults),
            linkage_header: None,
            has_to_download_rules: true,
            cached_rules_loaded: false,
        }
    }

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    /// Replace the configuration snapshot and rebuild the state
    pub fn update_configuration(&mut self, snapshot: ConfigurationSnapshot, defaults: &CampaignConfig) {
        self.configuration = snapshot;
        self.refresh(defaults);
    }

    /// Replace the identity snapshot and rebuild the state
    pub fn update_identity(&mut self, snapshot: IdentitySnapshot, defaults: &CampaignConfig) {
        self.identity = snapshot;
        self.refresh(defaults);
    }

    fn refresh(&mut self, defaults: &CampaignConfig) {
        self.state = CampaignState::from_snapshots(&self.configuration, &self.identity, defaults);
        trace!(state = ?self.state, "Campaign state refreshed");
    }

    /// Base64 linkage header, if linkage fields are set
    pub fn linkage_header(&self) -> Option<&str> {
        self.linkage_header.as_deref()
    }

    /// Encode and store `fields`; returns false if nothing was stored
    pub fn set_linkage_fields(&mut self, fields: &BTreeMap<String, String>) -> bool {
        match encode_linkage_fields(fields) {
            Some(header) => {
                self.linkage_header = Some(header);
                true
            }
            None => false,
        }
    }

    pub fn clear_linkage_fields(&mut self) {
        self.linkage_header = None;
    }

    pub fn has_to_download_rules(&self) -> bool {
        self.has_to_download_rules
    }

    pub fn set_has_to_download_rules(&mut self, value: bool) {
        self.has_to_download_rules = value;
    }

    pub fn cached_rules_loaded(&self) -> bool {
        self.cached_rules_loaded
    }

    pub fn mark_cached_rules_loaded(&mut self) {
        self.cached_rules_loaded = true;
    }
}
