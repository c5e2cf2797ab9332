// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Inbound events sent by the host and outbound events reported back to it.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::messages::MessageInteraction;
use crate::rules::{Consequence, SyncOutcome};
use crate::state::{ConfigurationSnapshot, IdentitySnapshot, PrivacyStatus};

/// Events the host feeds into the extension.
#[derive(Debug, Clone)]
pub enum CampaignEvent {
    /// New configuration shared state.
    ConfigurationUpdated(ConfigurationSnapshot),

    /// New identity shared state.
    IdentityUpdated(IdentitySnapshot),

    /// Application launch reported by lifecycle.
    LifecycleStart {
        /// Event time in epoch millis.
        timestamp_millis: i64,
        /// Extra registration payload fields.
        extra: BTreeMap<String, String>,
    },

    /// Evaluate the active rules against event data.
    EvaluateRules(Map<String, Value>),

    /// Consequences already produced by the host's rules engine.
    RulesTriggered(Vec<Consequence>),

    /// Message tracking info (push or local notification).
    MessageTrack {
        broadlog_id: String,
        delivery_id: String,
        /// "1" viewed, "2" clicked, "7" impression.
        action: String,
    },

    /// The user interacted with a displayed message.
    MessageInteraction {
        message_id: String,
        interaction: MessageInteraction,
    },

    /// A link was clicked inside a full-screen message.
    InAppLinkClicked {
        message_id: String,
        url: String,
    },

    /// A local notification was opened or dismissed by the user.
    NotificationInteracted {
        /// The notification's user data.
        user_data: Map<String, Value>,
    },

    /// Linkage fields for personalized rules.
    SetLinkageFields(BTreeMap<String, String>),

    /// Forget the linkage fields.
    ResetLinkageFields,

    /// Stop the dispatch loop and the hit queue.
    Shutdown,
}

impl CampaignEvent {
    /// Events that fill a readiness slot instead of waiting for one.
    pub(crate) fn is_shared_state_update(&self) -> bool {
        matches!(
            self,
            CampaignEvent::ConfigurationUpdated(_) | CampaignEvent::IdentityUpdated(_)
        )
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            CampaignEvent::ConfigurationUpdated(_) => "configuration_updated",
            CampaignEvent::IdentityUpdated(_) => "identity_updated",
            CampaignEvent::LifecycleStart { .. } => "lifecycle_start",
            CampaignEvent::EvaluateRules(_) => "evaluate_rules",
            CampaignEvent::RulesTriggered(_) => "rules_triggered",
            CampaignEvent::MessageTrack { .. } => "message_track",
            CampaignEvent::MessageInteraction { .. } => "message_interaction",
            CampaignEvent::InAppLinkClicked { .. } => "in_app_link_clicked",
            CampaignEvent::NotificationInteracted { .. } => "notification_interacted",
            CampaignEvent::SetLinkageFields(_) => "set_linkage_fields",
            CampaignEvent::ResetLinkageFields => "reset_linkage_fields",
            CampaignEvent::Shutdown => "shutdown",
        }
    }
}

/// Events emitted by the extension.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Message interaction context data (`a.message.*`).
    MessageInteraction {
        data: BTreeMap<String, String>,
    },

    /// A rules download finished.
    RulesSynced {
        url: String,
        outcome: SyncOutcome,
    },

    /// Cached rules were registered without a download.
    CachedRulesLoaded {
        count: usize,
    },

    /// The privacy status changed.
    PrivacyChanged {
        status: PrivacyStatus,
    },
}

/// Event handler trait.
///
/// Implement this trait to receive extension events.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: OutboundEvent);
}

/// Simple callback-based event handler.
///
/// Wraps a closure for easy event handling.
pub struct CallbackHandler<F>
where
    F: Fn(OutboundEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(OutboundEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(OutboundEvent) + Send + Sync,
{
    fn on_event(&self, event: OutboundEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: OutboundEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
