// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Campaign event handlers
//!
//! [`Campaign`] owns every collaborator of the extension and handles one
//! inbound event at a time. It is driven by the dispatch loop in
//! [`runtime`](super::runtime); nothing here is shared across tasks except
//! the rules engine snapshot and the hit queue.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::context::CampaignContext;
use super::events::{CampaignEvent, EventDispatcher, OutboundEvent};
use super::readiness::ReadinessGate;
use crate::cache::{ConditionalCacheStore, MESSAGES_NAMESPACE, RULES_NAMESPACE};
use crate::config::CampaignConfig;
use crate::error::CampaignResult;
use crate::hits::{DurableHitQueue, HitProcessor, HitRecord};
use crate::messages::{
    parse_in_app_url, CampaignMessage, MessageInteraction, MessagePresenter, BROADLOG_ID_KEY,
    DELIVERY_ID_KEY, MESSAGE_CLICKED_KEY, MESSAGE_ID_KEY, MESSAGE_VIEWED_KEY,
};
use crate::network::HttpTransport;
use crate::rules::{BundleExtractor, Consequence, RuleSyncCoordinator, RulesEngine};
use crate::state::{
    should_send_registration_request, ConfigurationSnapshot, IdentitySnapshot, PrivacyStatus,
    RegistrationLedger,
};
use crate::storage::SharedStorage;

/// Tracking action of a viewed message.
pub const VIEWED_ACTION: &str = "1";
/// Tracking action of a clicked message.
pub const CLICKED_ACTION: &str = "2";
/// Tracking action of a displayed local notification.
pub const IMPRESSION_ACTION: &str = "7";

const PUSH_PLATFORM_KEY: &str = "pushPlatform";
const ECID_PAYLOAD_KEY: &str = "marketingCloudId";

/// Whether the dispatch loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// The extension: context plus collaborators
pub struct Campaign {
    config: CampaignConfig,
    context: CampaignContext,
    gate: ReadinessGate<CampaignEvent>,
    engine: Arc<RulesEngine>,
    sync: RuleSyncCoordinator,
    hits: DurableHitQueue,
    ledger: RegistrationLedger,
    cache: ConditionalCacheStore,
    presenter: Arc<dyn MessagePresenter>,
    dispatcher: EventDispatcher,
}

impl Campaign {
    /// Wire up the extension. Must be called from within a tokio runtime.
    pub fn new(
        config: CampaignConfig,
        storage: SharedStorage,
        transport: Arc<dyn HttpTransport>,
        presenter: Arc<dyn MessagePresenter>,
        dispatcher: EventDispatcher,
    ) -> CampaignResult<Self> {
        let cache = ConditionalCacheStore::new(&config.cache_path())?;
        let ledger = RegistrationLedger::new(Arc::clone(&storage));
        let engine = Arc::new(RulesEngine::new());

        let extractor = BundleExtractor::new(config.scratch_path(), cache.clone());
        let sync = RuleSyncCoordinator::new(
            Arc::clone(&transport),
            cache.clone(),
            extractor,
            Arc::clone(&engine),
            ledger.clone(),
        );

        let processor = HitProcessor::new(transport, ledger.clone());
        let hits = DurableHitQueue::start(storage, processor, config.hit_retry_interval);

        Ok(Self {
            context: CampaignContext::new(&config),
            gate: ReadinessGate::new(),
            config,
            engine,
            sync,
            hits,
            ledger,
            cache,
            presenter,
            dispatcher,
        })
    }

    pub fn context(&self) -> &CampaignContext {
        &self.context
    }

    pub fn rules_engine(&self) -> &Arc<RulesEngine> {
        &self.engine
    }

    pub fn hit_queue(&self) -> &DurableHitQueue {
        &self.hits
    }

    /// Handle one inbound event
    pub(crate) async fn handle(&mut self, event: CampaignEvent) -> Flow {
        debug!(event = event.name(), "Handling campaign event");
        match event {
            CampaignEvent::Shutdown => return Flow::Stop,
            CampaignEvent::ConfigurationUpdated(snapshot) => {
                if snapshot.is_empty() {
                    debug!("Ignoring empty configuration");
                    return Flow::Continue;
                }
                self.handle_configuration(snapshot).await;
                let released = self.gate.fill_configuration();
                self.replay(released).await;
            }
            CampaignEvent::IdentityUpdated(snapshot) => {
                self.handle_identity(snapshot).await;
                let released = self.gate.fill_identity();
                self.replay(released).await;
            }
            other => {
                debug_assert!(!other.is_shared_state_update());
                if let Some(event) = self.gate.admit(other) {
                    self.process(event).await;
                } else {
                    debug!("Configuration or identity not known yet, holding event");
                }
            }
        }
        Flow::Continue
    }

    /// Stop background work
    pub(crate) async fn shutdown(&self) {
        self.hits.shutdown().await;
        info!("Campaign extension stopped");
    }

    async fn replay(&mut self, events: Vec<CampaignEvent>) {
        for event in events {
            self.process(event).await;
        }
    }

    async fn process(&mut self, event: CampaignEvent) {
        match event {
            CampaignEvent::LifecycleStart {
                timestamp_millis,
                extra,
            } => self.handle_lifecycle(timestamp_millis, extra),
            CampaignEvent::EvaluateRules(data) => {
                let consequences = self.engine.evaluate(&data);
                self.show_message(&consequences);
            }
            CampaignEvent::RulesTriggered(consequences) => self.show_message(&consequences),
            CampaignEvent::MessageTrack {
                broadlog_id,
                delivery_id,
                action,
            } => self.handle_message_track(&broadlog_id, &delivery_id, &action),
            CampaignEvent::MessageInteraction {
                message_id,
                interaction,
            } => self.handle_interaction(&message_id, &interaction),
            CampaignEvent::InAppLinkClicked { message_id, url } => {
                match parse_in_app_url(&url) {
                    Some(interactions) => {
                        for interaction in &interactions {
                            self.handle_interaction(&message_id, interaction);
                        }
                    }
                    None => debug!(url = %url, "Not an in-app message link"),
                }
            }
            CampaignEvent::NotificationInteracted { user_data } => {
                let broadlog = string_field(&user_data, BROADLOG_ID_KEY);
                let delivery = string_field(&user_data, DELIVERY_ID_KEY);
                self.handle_message_track(broadlog, delivery, CLICKED_ACTION);
            }
            CampaignEvent::SetLinkageFields(fields) => self.handle_set_linkage_fields(&fields).await,
            CampaignEvent::ResetLinkageFields => self.handle_reset_linkage_fields().await,
            CampaignEvent::ConfigurationUpdated(_)
            | CampaignEvent::IdentityUpdated(_)
            | CampaignEvent::Shutdown => {}
        }
    }

    async fn handle_configuration(&mut self, snapshot: ConfigurationSnapshot) {
        self.context.update_configuration(snapshot, &self.config);
        let state = self.context.state().clone();

        let privacy = state.privacy();
        if self.hits.privacy() != privacy {
            self.dispatcher
                .dispatch(OutboundEvent::PrivacyChanged { status: privacy });
        }
        self.hits.handle_privacy_change(privacy);
        if privacy == PrivacyStatus::OptOut {
            self.process_privacy_opt_out();
            return;
        }

        // Once per process, before any download can replace them
        if !self.context.cached_rules_loaded() {
            self.context.mark_cached_rules_loaded();
            if self.sync.has_cached_rules() {
                if let Some(count) = self.sync.load_cached_rules(state.timeout()).await {
                    self.dispatcher
                        .dispatch(OutboundEvent::CachedRulesLoaded { count });
                }
            }
        }

        if self.context.has_to_download_rules() && state.can_download_rules() {
            self.context.set_has_to_download_rules(false);
            self.trigger_rules_download().await;
        } else {
            self.context.set_has_to_download_rules(true);
        }
    }

    async fn handle_identity(&mut self, snapshot: IdentitySnapshot) {
        self.context.update_identity(snapshot, &self.config);
        if self.context.has_to_download_rules() && self.context.state().can_download_rules() {
            self.context.set_has_to_download_rules(false);
            self.trigger_rules_download().await;
        }
    }

    /// Forget everything tied to the user
    fn process_privacy_opt_out(&mut self) {
        info!("Privacy opted out, clearing campaign data");
        self.context.clear_linkage_fields();
        self.engine.clear();
        self.sync.clear_cached_rules();
        if let Err(e) = self.cache.remove_namespace(MESSAGES_NAMESPACE) {
            warn!(error = %e, "Could not clear message assets");
        }
        if let Err(e) = self.ledger.clear() {
            warn!(error = %e, "Could not clear campaign datastore");
        }
    }

    async fn trigger_rules_download(&mut self) {
        let state = self.context.state();
        let Some(url) = state.rules_url() else {
            warn!("Cannot build rules url from current state");
            return;
        };
        let timeout = state.timeout();
        let linkage = self.context.linkage_header().map(str::to_string);

        let outcome = self.sync.sync(&url, linkage.as_deref(), timeout).await;
        debug!(url = %url, outcome = ?outcome, "Rules sync finished");
        self.dispatcher
            .dispatch(OutboundEvent::RulesSynced { url, outcome });
    }

    fn handle_lifecycle(&mut self, timestamp_millis: i64, extra: BTreeMap<String, String>) {
        let state = self.context.state();
        if !state.can_register_with_current_ecid() {
            return;
        }
        let (Some(url), Some(ecid)) = (state.registration_url(), state.ecid()) else {
            return;
        };

        let mut body = extra;
        body.insert(PUSH_PLATFORM_KEY.to_string(), self.config.push_platform.clone());
        body.insert(ECID_PAYLOAD_KEY.to_string(), ecid.to_string());
        let payload = match serde_json::to_string(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Could not encode registration payload");
                return;
            }
        };

        if !should_send_registration_request(state, &self.ledger, timestamp_millis) {
            return;
        }
        let hit = HitRecord::new(url, payload, state.timeout().as_secs());
        debug!(url = %hit.url, "Queueing registration request");
        self.hits.enqueue(hit);
    }

    fn handle_message_track(&self, broadlog_id: &str, delivery_id: &str, action: &str) {
        let state = self.context.state();
        if !state.can_send_track_info() {
            return;
        }
        if broadlog_id.is_empty() || delivery_id.is_empty() || action.is_empty() {
            debug!(
                broadlog_id,
                delivery_id, action, "Ignoring message track with missing fields"
            );
            return;
        }

        self.dispatch_tracked_interaction(action, delivery_id);

        let Some(url) = state.tracking_url(broadlog_id, delivery_id, action) else {
            return;
        };
        let hit = HitRecord::tracking(url, state.timeout().as_secs());
        debug!(url = %hit.url, "Queueing tracking request");
        self.hits.enqueue(hit);
    }

    /// Report viewed/clicked push messages; the delivery id is hexadecimal
    fn dispatch_tracked_interaction(&self, action: &str, delivery_id: &str) {
        let flag = match action {
            CLICKED_ACTION => MESSAGE_CLICKED_KEY,
            VIEWED_ACTION => MESSAGE_VIEWED_KEY,
            _ => return,
        };
        let message_id = match u64::from_str_radix(delivery_id, 16) {
            Ok(id) => id,
            Err(e) => {
                debug!(delivery_id, error = %e, "Delivery id is not hexadecimal");
                return;
            }
        };

        let data = BTreeMap::from([
            (MESSAGE_ID_KEY.to_string(), message_id.to_string()),
            (flag.to_string(), "1".to_string()),
        ]);
        self.dispatcher
            .dispatch(OutboundEvent::MessageInteraction { data });
    }

    fn handle_interaction(&self, message_id: &str, interaction: &MessageInteraction) {
        let data = interaction.to_data(message_id);
        if let Some(url) = data.open_url.as_deref() {
            if !self.presenter.open_url(url) {
                debug!(url, "Could not open url");
            }
        }
        self.dispatcher
            .dispatch(OutboundEvent::MessageInteraction { data: data.data });
    }

    /// Present the first in-app message among `consequences`
    fn show_message(&self, consequences: &[Consequence]) {
        let Some(consequence) = consequences.iter().find(|c| c.is_in_app_message()) else {
            return;
        };
        let message = match CampaignMessage::from_consequence(consequence) {
            Ok(message) => message,
            Err(e) => {
                warn!(message_id = %consequence.id, error = %e, "Error reading message definition");
                return;
            }
        };

        match &message {
            CampaignMessage::Alert(alert) => {
                self.handle_interaction(&alert.id, &MessageInteraction::Triggered);
                self.presenter.show_alert(alert);
            }
            CampaignMessage::FullScreen(fullscreen) => {
                let Some(entry) = self.cache.get(RULES_NAMESPACE, &fullscreen.html) else {
                    warn!(html = %fullscreen.html, "Full-screen html is not in the rules cache");
                    return;
                };
                let html = String::from_utf8_lossy(&entry.bytes);
                if html.is_empty() {
                    warn!(html = %fullscreen.html, "Full-screen html is empty");
                    return;
                }
                let assets = self
                    .sync
                    .assets()
                    .cached_assets_map(&fullscreen.id, &fullscreen.remote_assets);
                self.handle_interaction(&fullscreen.id, &MessageInteraction::Triggered);
                self.presenter.show_fullscreen(fullscreen, &html, &assets);
            }
            CampaignMessage::LocalNotification(notification) => {
                self.handle_interaction(&notification.id, &MessageInteraction::Triggered);
                if let Some((broadlog, delivery)) = notification.tracking_ids() {
                    self.handle_message_track(&broadlog, &delivery, IMPRESSION_ACTION);
                }
                self.presenter.schedule_local_notification(notification);
            }
        }
    }

    async fn handle_set_linkage_fields(&mut self, fields: &BTreeMap<String, String>) {
        if fields.is_empty() {
            debug!("Ignoring empty linkage fields");
            return;
        }
        if !self.context.set_linkage_fields(fields) {
            return;
        }
        if !self.context.state().can_download_rules() {
            return;
        }
        self.sync.clear_cached_rules();
        self.trigger_rules_download().await;
    }

    async fn handle_reset_linkage_fields(&mut self) {
        self.context.clear_linkage_fields();
        self.engine.clear();
        self.sync.clear_cached_rules();
        if self.context.state().can_download_rules() {
            self.trigger_rules_download().await;
        }
    }
}

fn string_field<'a>(data: &'a Map<String, Value>, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}
