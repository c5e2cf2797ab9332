// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message asset synchronization
//!
//! Full-screen messages reference images as alternative groups:
//! `remoteAssets: [["https://cdn/a.png", "https://mirror/a.png", "a.png"], ...]`.
//! Reconciliation makes sure each group is satisfied by a cached download
//! or a bundled local name, then removes the asset namespaces of messages
//! that are no longer in the active rule set.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use super::conditional::extract_metadata;
use super::model::LaunchRule;
use crate::cache::{asset_cache_key, message_namespace, ConditionalCacheStore, MESSAGES_NAMESPACE};
use crate::network::{HttpRequest, HttpTransport};

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Message ids referenced by the active rules
    pub active_messages: BTreeSet<String>,
    /// Number of assets downloaded during this pass
    pub downloaded: usize,
    /// Message ids whose cached assets were removed
    pub removed_messages: Vec<String>,
}

/// Downloads missing message assets and drops stale ones
#[derive(Clone)]
pub struct AssetSynchronizer {
    transport: Arc<dyn HttpTransport>,
    cache: ConditionalCacheStore,
}

impl AssetSynchronizer {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: ConditionalCacheStore) -> Self {
        Self { transport, cache }
    }

    /// Bring the asset cache in line with `rules`.
    ///
    /// Per-message downloads run concurrently; the cleanup pass starts only
    /// once all of them have finished.
    pub async fn reconcile(&self, rules: &[LaunchRule], timeout: Duration) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut downloads = JoinSet::new();

        let fullscreen = rules
            .iter()
            .flat_map(|rule| rule.consequences.iter())
            .filter(|c| c.is_fullscreen_message());

        for consequence in fullscreen {
            if consequence.id.is_empty() {
                debug!("Skipping asset download, consequence id is empty");
                continue;
            }
            report.active_messages.insert(consequence.id.clone());

            let groups = consequence.remote_assets();
            if groups.is_empty() {
                trace!(message_id = %consequence.id, "No remote assets for message");
                continue;
            }

            let transport = Arc::clone(&self.transport);
            let cache = self.cache.clone();
            let message_id = consequence.id.clone();
            downloads.spawn(async move {
                download_message_assets(transport, cache, message_id, groups, timeout).await
            });
        }

        while let Some(joined) = downloads.join_next().await {
            match joined {
                Ok(count) => report.downloaded += count,
                Err(e) => warn!(error = %e, "Asset download task failed"),
            }
        }

        report.removed_messages = self.remove_inactive(&report.active_messages);
        report
    }

    /// Map each group's first URL to what a message should render.
    ///
    /// The first cached member wins (as a local file path); otherwise the
    /// last member is used when it is a bundled local name.
    pub fn cached_assets_map(
        &self,
        message_id: &str,
        groups: &[Vec<String>],
    ) -> BTreeMap<String, String> {
        let namespace = message_namespace(message_id);
        let mut cached = BTreeMap::new();
        let mut fallback = BTreeMap::new();

        for group in groups {
            let (Some(first), Some(last)) = (group.first(), group.last()) else {
                continue;
            };

            let hit = group
                .iter()
                .filter(|asset| is_downloadable(asset))
                .map(|asset| asset_cache_key(asset))
                .find(|key| self.cache.contains(&namespace, key))
                .and_then(|key| self.cache.path_of(&namespace, &key).ok());

            match hit {
                Some(path) => {
                    cached.insert(first.clone(), path.to_string_lossy().into_owned());
                }
                None if !is_downloadable(last) => {
                    fallback.insert(first.clone(), last.clone());
                }
                None => {}
            }
        }

        cached.extend(fallback);
        cached
    }

    fn remove_inactive(&self, active: &BTreeSet<String>) -> Vec<String> {
        let mut removed = Vec::new();
        for message_id in self.cache.child_namespaces(MESSAGES_NAMESPACE) {
            if active.contains(&message_id) {
                continue;
            }
            match self.cache.remove_namespace(&message_namespace(&message_id)) {
                Ok(()) => {
                    debug!(message_id = %message_id, "Removed assets of inactive message");
                    removed.push(message_id);
                }
                Err(e) => warn!(message_id = %message_id, error = %e, "Could not remove message assets"),
            }
        }
        removed
    }
}

async fn download_message_assets(
    transport: Arc<dyn HttpTransport>,
    cache: ConditionalCacheStore,
    message_id: String,
    groups: Vec<Vec<String>>,
    timeout: Duration,
) -> usize {
    let namespace = message_namespace(&message_id);
    let mut downloaded = 0;

    for group in groups {
        let already_cached = group
            .iter()
            .filter(|asset| is_downloadable(asset))
            .any(|asset| cache.contains(&namespace, &asset_cache_key(asset)));
        if already_cached {
            trace!(message_id = %message_id, "Asset group already cached");
            continue;
        }

        for asset in &group {
            if !is_downloadable(asset) {
                trace!(message_id = %message_id, asset = %asset, "Using bundled asset");
                break;
            }
            if download_asset(transport.as_ref(), &cache, &namespace, asset, timeout).await {
                downloaded += 1;
                break;
            }
        }
    }

    downloaded
}

async fn download_asset(
    transport: &dyn HttpTransport,
    cache: &ConditionalCacheStore,
    namespace: &str,
    url: &str,
    timeout: Duration,
) -> bool {
    let response = match transport.send(HttpRequest::get(url, timeout)).await {
        Ok(response) => response,
        Err(e) => {
            debug!(url, error = %e, "Asset download failed");
            return false;
        }
    };
    if response.status != 200 {
        debug!(url, status = response.status, "Asset download returned non-200");
        return false;
    }

    let metadata = extract_metadata(&response);
    match cache.set(namespace, &asset_cache_key(url), &response.body, &metadata) {
        Ok(()) => {
            trace!(url, "Cached message asset");
            true
        }
        Err(e) => {
            warn!(url, error = %e, "Could not cache message asset");
            false
        }
    }
}

/// Only http(s) URLs are fetched; anything else names a bundled asset
pub fn is_downloadable(asset: &str) -> bool {
    url::Url::parse(asset)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
