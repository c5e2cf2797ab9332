// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable hit queue
//!
//! Hits are persisted in the `hit_queue` table and delivered by a single
//! worker task, strictly one at a time in enqueue order. The head entry is
//! only deleted once its outcome is terminal; a retryable outcome keeps it
//! at the head and the worker waits out the retry interval before trying it
//! again.
//!
//! Delivery is gated by privacy:
//! - `OptIn`: online
//! - `Unknown`: suspended, entries kept
//! - `OptOut`: suspended and every entry purged

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::processor::HitProcessor;
use super::record::HitRecord;
use crate::state::{current_time_millis, PrivacyStatus};
use crate::storage::{QueuedHit, SharedStorage};

/// Persistent FIFO of hits with a privacy gate
pub struct DurableHitQueue {
    storage: SharedStorage,
    privacy: watch::Sender<PrivacyStatus>,
    stop: watch::Sender<bool>,
    wake: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DurableHitQueue {
    /// Start the queue worker. Must be called from within a tokio runtime.
    ///
    /// The queue starts suspended (`Unknown`). Entries left by a previous
    /// process are delivered once privacy becomes `OptIn`.
    pub fn start(storage: SharedStorage, processor: HitProcessor, retry_interval: Duration) -> Self {
        let (privacy, privacy_rx) = watch::channel(PrivacyStatus::Unknown);
        let (stop, stop_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());

        let worker = Worker {
            storage: Arc::clone(&storage),
            processor,
            retry_interval,
            privacy: privacy_rx,
            stop: stop_rx,
            wake: Arc::clone(&wake),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            storage,
            privacy,
            stop,
            wake,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Persist `hit` for delivery. Returns whether it was queued.
    pub fn enqueue(&self, hit: HitRecord) -> bool {
        if *self.privacy.borrow() == PrivacyStatus::OptOut {
            debug!(url = %hit.url, "Privacy opted out, dropping hit");
            return false;
        }
        let data = match hit.to_persisted() {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Could not encode hit, dropping it");
                return false;
            }
        };
        match self.storage.lock().push_hit(&data, current_time_millis()) {
            Ok(id) => {
                trace!(id, url = %hit.url, "Queued hit");
                self.wake.notify_one();
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not persist hit");
                false
            }
        }
    }

    /// Apply a privacy transition
    pub fn handle_privacy_change(&self, status: PrivacyStatus) {
        let changed = self.privacy.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
        if changed {
            info!(privacy = status.as_str(), "Hit queue privacy changed");
        }
        if status == PrivacyStatus::OptOut {
            let purged = self.clear();
            debug!(purged, "Purged hit queue");
        }
    }

    /// Current privacy gate
    pub fn privacy(&self) -> PrivacyStatus {
        *self.privacy.borrow()
    }

    /// Number of queued hits
    pub fn len(&self) -> usize {
        self.storage.lock().count_hits().unwrap_or_else(|e| {
            warn!(error = %e, "Could not count queued hits");
            0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queued hit, returning how many were removed
    pub fn clear(&self) -> usize {
        self.storage.lock().clear_hits().unwrap_or_else(|e| {
            warn!(error = %e, "Could not clear hit queue");
            0
        })
    }

    /// Stop the worker. An in-flight hit finishes first; queued hits stay
    /// persisted for the next start.
    pub async fn shutdown(&self) {
        self.stop.send_replace(true);
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Hit queue worker ended abnormally");
            }
        }
    }
}

impl Drop for DurableHitQueue {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}

/// Why a wait ended
enum Wake {
    Proceed,
    Stop,
}

struct Worker {
    storage: SharedStorage,
    processor: HitProcessor,
    retry_interval: Duration,
    privacy: watch::Receiver<PrivacyStatus>,
    stop: watch::Receiver<bool>,
    wake: Arc<Notify>,
}

impl Worker {
    async fn run(mut self) {
        debug!("Hit queue worker started");
        loop {
            if *self.stop.borrow_and_update() {
                break;
            }
            if *self.privacy.borrow_and_update() != PrivacyStatus::OptIn {
                if let Wake::Stop = self.wait(None, false).await {
                    break;
                }
                continue;
            }

            let head = self.storage.lock().peek_hit();
            let entry = match head {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    if let Wake::Stop = self.wait(None, true).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "Could not read hit queue");
                    if let Wake::Stop = self.wait(Some(self.retry_interval), true).await {
                        break;
                    }
                    continue;
                }
            };

            if !self.deliver(&entry).await {
                trace!(id = entry.id, "Waiting before retrying hit");
                if let Wake::Stop = self.backoff().await {
                    break;
                }
            }
        }
        debug!("Hit queue worker stopped");
    }

    /// Process the head entry. Returns false when it must be retried.
    async fn deliver(&self, entry: &QueuedHit) -> bool {
        let hit = match HitRecord::from_persisted(&entry.data) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(id = entry.id, error = %e, "Dropping unreadable hit");
                self.remove(entry.id);
                return true;
            }
        };

        let outcome = self.processor.process(&hit).await;
        if outcome.is_terminal() {
            self.remove(entry.id);
            true
        } else {
            false
        }
    }

    fn remove(&self, id: i64) {
        // Already gone if the queue was purged while the hit was in flight
        if let Err(e) = self.storage.lock().delete_hit(id) {
            warn!(id, error = %e, "Could not remove hit from queue");
        }
    }

    /// Wait out the full retry interval. Ends early only on a stop request or
    /// an opt-out, since opting out purges the queue.
    async fn backoff(&mut self) -> Wake {
        let deadline = Instant::now() + self.retry_interval;
        loop {
            tokio::select! {
                changed = self.privacy.changed() => {
                    if changed.is_err() {
                        return Wake::Stop;
                    }
                    if *self.privacy.borrow_and_update() == PrivacyStatus::OptOut {
                        return Wake::Proceed;
                    }
                }
                changed = self.stop.changed() => match changed {
                    Ok(()) => return Wake::Proceed,
                    Err(_) => return Wake::Stop,
                },
                _ = tokio::time::sleep_until(deadline) => return Wake::Proceed,
            }
        }
    }

    /// Sleep until a privacy change, a stop request, the optional timeout,
    /// or (with `on_enqueue`) a new hit.
    async fn wait(&mut self, timeout: Option<Duration>, on_enqueue: bool) -> Wake {
        let wake = &self.wake;
        let sleep = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        let enqueued = async {
            if on_enqueue {
                wake.notified().await
            } else {
                std::future::pending::<()>().await
            }
        };

        tokio::select! {
            changed = self.privacy.changed() => match changed {
                Ok(()) => Wake::Proceed,
                Err(_) => Wake::Stop,
            },
            changed = self.stop.changed() => match changed {
                Ok(()) => Wake::Proceed,
                Err(_) => Wake::Stop,
            },
            _ = sleep => Wake::Proceed,
            _ = enqueued => Wake::Proceed,
        }
    }
}
