// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Campaign Core Library
//!
//! Rule bundle synchronization over conditional HTTP and durable delivery of
//! registration and tracking hits, gated by the user's privacy status.

pub mod cache;
pub mod config;
pub mod error;
pub mod extension;
pub mod hits;
pub mod messages;
pub mod network;
pub mod rules;
pub mod state;
pub mod storage;

pub use cache::{CacheEntry, CacheError, ConditionalCacheStore};
pub use config::CampaignConfig;
pub use error::{CampaignError, CampaignResult};
pub use extension::{
    CallbackHandler, CampaignEvent, CampaignHandle, CampaignRuntime, EventDispatcher,
    EventHandler, OutboundEvent,
};
pub use hits::{DurableHitQueue, HitOutcome, HitProcessor, HitRecord};
pub use messages::{CampaignMessage, MessageError, MessageInteraction, MessagePresenter};
pub use network::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockTransport};
#[cfg(feature = "http-client")]
pub use network::ReqwestTransport;
pub use rules::{
    AssetSynchronizer, BundleExtractor, Consequence, LaunchRule, RuleSyncCoordinator,
    RulesEngine, SyncOutcome,
};
pub use state::{
    CampaignState, ConfigurationSnapshot, IdentitySnapshot, PrivacyStatus, RegistrationLedger,
};
pub use storage::{SharedStorage, Storage, StorageError};
