// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Extension Tests
//!
//! Full event flows through the dispatch runtime: readiness, rule sync
//! triggers, registration, tracking and message presentation.
//!
//! Run with: cargo test --test extension

#[path = "../common/mod.rs"]
mod common;

mod runtime_tests;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use campaign_core::{
    CallbackHandler, CampaignConfig, CampaignEvent, CampaignHandle, CampaignRuntime,
    ConfigurationSnapshot, EventDispatcher, HttpResponse, IdentitySnapshot, MockTransport,
    OutboundEvent,
};

use common::fixtures::{opted_in_config, RecordingPresenter, ECID};

/// A running extension with recording doubles
pub struct Harness {
    pub dir: TempDir,
    pub transport: Arc<MockTransport>,
    pub presenter: Arc<RecordingPresenter>,
    pub events: Arc<Mutex<Vec<OutboundEvent>>>,
    pub runtime: CampaignRuntime,
    pub handle: CampaignHandle,
}

impl Harness {
    pub fn start() -> Self {
        common::init_tracing();
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(MockTransport::new());
        transport.set_fallback(HttpResponse::new(200, Vec::new()));
        let presenter = Arc::new(RecordingPresenter::default());

        let events = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let sink = Arc::clone(&events);
        dispatcher.add_handler(Arc::new(CallbackHandler::new(move |event| {
            sink.lock().push(event);
        })));

        let config = CampaignConfig::new(dir.path())
            .with_hit_retry_interval(Duration::from_millis(50));
        let runtime =
            CampaignRuntime::spawn(config, transport.clone(), presenter.clone(), dispatcher)
                .unwrap();
        let handle = runtime.handle();

        Harness {
            dir,
            transport,
            presenter,
            events,
            runtime,
            handle,
        }
    }

    pub async fn send(&self, event: CampaignEvent) {
        self.handle.send(event).await.unwrap();
        self.handle.flush().await.unwrap();
    }

    pub async fn configure(&self, config: ConfigurationSnapshot) {
        self.send(CampaignEvent::ConfigurationUpdated(config)).await;
    }

    /// Opted-in configuration and a known ECID
    pub async fn make_ready(&self) {
        self.configure(opted_in_config()).await;
        self.send(CampaignEvent::IdentityUpdated(IdentitySnapshot::with_ecid(ECID)))
            .await;
    }

    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }

    pub fn interaction_events(&self) -> Vec<std::collections::BTreeMap<String, String>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::MessageInteraction { data } => Some(data),
                _ => None,
            })
            .collect()
    }
}
