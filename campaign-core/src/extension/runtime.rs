// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serial dispatch runtime
//!
//! A single tokio task owns the [`Campaign`] and handles events in the order
//! they were sent. Hosts talk to it through a cloneable [`CampaignHandle`].

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::campaign::{Campaign, Flow};
use super::events::{CampaignEvent, EventDispatcher};
use crate::config::CampaignConfig;
use crate::error::{CampaignError, CampaignResult};
use crate::messages::MessagePresenter;
use crate::network::HttpTransport;
use crate::rules::RulesEngine;
use crate::storage::{SharedStorage, Storage};

enum Command {
    Event(CampaignEvent),
    /// Acknowledged once every earlier command has been handled
    Flush(oneshot::Sender<()>),
}

/// Sending side of the dispatch loop
#[derive(Clone)]
pub struct CampaignHandle {
    tx: mpsc::Sender<Command>,
}

impl CampaignHandle {
    /// Queue `event`, waiting for room if the work queue is full.
    pub async fn send(&self, event: CampaignEvent) -> CampaignResult<()> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| CampaignError::ShutDown)
    }

    /// Queue `event` without waiting.
    pub fn try_send(&self, event: CampaignEvent) -> CampaignResult<()> {
        self.tx
            .try_send(Command::Event(event))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => CampaignError::WorkQueueFull,
                mpsc::error::TrySendError::Closed(_) => CampaignError::ShutDown,
            })
    }

    /// Wait until every event sent before this call has been handled.
    pub async fn flush(&self) -> CampaignResult<()> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .await
            .map_err(|_| CampaignError::ShutDown)?;
        done.await.map_err(|_| CampaignError::ShutDown)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Running extension
pub struct CampaignRuntime {
    handle: CampaignHandle,
    engine: Arc<RulesEngine>,
    task: JoinHandle<()>,
}

impl CampaignRuntime {
    /// Open the datastore under the configured storage path and start.
    pub fn spawn(
        config: CampaignConfig,
        transport: Arc<dyn HttpTransport>,
        presenter: Arc<dyn MessagePresenter>,
        dispatcher: EventDispatcher,
    ) -> CampaignResult<Self> {
        let storage = Storage::open(&config.database_path())?.into_shared();
        Self::spawn_with_storage(config, storage, transport, presenter, dispatcher)
    }

    /// Start on an already opened datastore. Must be called from within a
    /// tokio runtime.
    pub fn spawn_with_storage(
        config: CampaignConfig,
        storage: SharedStorage,
        transport: Arc<dyn HttpTransport>,
        presenter: Arc<dyn MessagePresenter>,
        dispatcher: EventDispatcher,
    ) -> CampaignResult<Self> {
        let capacity = config.work_queue_capacity.max(1);
        let campaign = Campaign::new(config, storage, transport, presenter, dispatcher)?;
        let engine = Arc::clone(campaign.rules_engine());

        let (tx, rx) = mpsc::channel(capacity);
        let task = tokio::spawn(run(campaign, rx));

        Ok(Self {
            handle: CampaignHandle { tx },
            engine,
            task,
        })
    }

    pub fn handle(&self) -> CampaignHandle {
        self.handle.clone()
    }

    /// Rules currently registered with the engine
    pub fn rules_engine(&self) -> &Arc<RulesEngine> {
        &self.engine
    }

    /// Stop the dispatch loop once queued events are handled.
    pub async fn shutdown(self) {
        if self.handle.send(CampaignEvent::Shutdown).await.is_err() {
            debug!("Dispatch loop already stopped");
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "Dispatch loop panicked");
        }
    }
}

async fn run(mut campaign: Campaign, mut rx: mpsc::Receiver<Command>) {
    debug!("Campaign dispatch loop started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Event(event) => {
                if campaign.handle(event).await == Flow::Stop {
                    break;
                }
            }
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    rx.close();
    campaign.shutdown().await;
}
