// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rule sync coordinator
//!
//! Issues the conditional GET for the rule bundle and applies the result:
//! - 200: extract, cache, remember the URL, replace rules, reconcile assets
//! - 304: nothing to do
//! - anything else, or no response: logged and dropped, no retry
//!
//! Rule replacement only happens once the bundle is fully cached.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use super::assets::{AssetSynchronizer, ReconcileReport};
use super::bundle::BundleExtractor;
use super::conditional::{build_conditional_headers, extract_metadata, LINKAGE_FIELDS_HEADER};
use super::engine::RulesEngine;
use super::model::{parse_rules, LaunchRule};
use crate::cache::{CacheError, CacheMetadata, ConditionalCacheStore, RULES_NAMESPACE};
use crate::network::{HttpRequest, HttpTransport};
use crate::state::RegistrationLedger;

/// Rules definition file inside a bundle.
pub const RULES_FILE: &str = "rules.json";

/// Namespace of the bundle descriptor.
const BUNDLE_NAMESPACE: &str = "campaign/bundle";
const DESCRIPTOR_KEY: &str = "descriptor.json";
const DESCRIPTOR_SCHEMA_VERSION: u32 = 1;

/// Result of one sync attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New bundle cached and its rules registered
    Updated {
        rules: usize,
        assets: ReconcileReport,
    },
    /// Server answered 304
    NotModified,
    /// No request issued (empty URL)
    Skipped,
    /// Request or processing failed; previous rules stand
    Failed(String),
}

/// What the last successful sync left in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBundleDescriptor {
    pub schema_version: u32,
    pub source_url: String,
    /// Size of the downloaded archive in bytes
    pub archive_size: u64,
    /// Keys of the extracted files in the rules namespace
    pub cached_entries: Vec<String>,
}

/// Downloads, caches and registers rule bundles
pub struct RuleSyncCoordinator {
    transport: Arc<dyn HttpTransport>,
    cache: ConditionalCacheStore,
    extractor: BundleExtractor,
    engine: Arc<RulesEngine>,
    assets: AssetSynchronizer,
    ledger: RegistrationLedger,
}

impl RuleSyncCoordinator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: ConditionalCacheStore,
        extractor: BundleExtractor,
        engine: Arc<RulesEngine>,
        ledger: RegistrationLedger,
    ) -> Self {
        let assets = AssetSynchronizer::new(Arc::clone(&transport), cache.clone());
        Self {
            transport,
            cache,
            extractor,
            engine,
            assets,
            ledger,
        }
    }

    /// Engine holding the registered rules
    pub fn engine(&self) -> &Arc<RulesEngine> {
        &self.engine
    }

    /// Asset synchronizer sharing this coordinator's cache
    pub fn assets(&self) -> &AssetSynchronizer {
        &self.assets
    }

    /// Descriptor of the last successful sync, if any
    pub fn descriptor(&self) -> Option<(RuleBundleDescriptor, CacheMetadata)> {
        let entry = self.cache.get(BUNDLE_NAMESPACE, DESCRIPTOR_KEY)?;
        let descriptor: RuleBundleDescriptor = serde_json::from_slice(&entry.bytes).ok()?;
        if descriptor.schema_version != DESCRIPTOR_SCHEMA_VERSION {
            warn!(
                version = descriptor.schema_version,
                "Ignoring bundle descriptor with unknown schema version"
            );
            return None;
        }
        Some((descriptor, entry.metadata))
    }

    /// Conditionally download the bundle at `url` and apply it
    pub async fn sync(
        &self,
        url: &str,
        linkage_fields: Option<&str>,
        timeout: Duration,
    ) -> SyncOutcome {
        if url.is_empty() {
            warn!("Cannot download rules, url is empty. Cached rules will be used if present");
            return SyncOutcome::Skipped;
        }

        let mut request = HttpRequest::get(url, timeout);
        if let Some((descriptor, metadata)) = self.descriptor() {
            request = request
                .with_headers(build_conditional_headers(&metadata, Some(descriptor.archive_size)));
        }
        if let Some(fields) = linkage_fields.filter(|f| !f.is_empty()) {
            request = request.with_header(LINKAGE_FIELDS_HEADER, fields);
        }

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Rules download failed");
                return SyncOutcome::Failed(e.to_string());
            }
        };

        match response.status {
            200 => {}
            304 => {
                trace!(url, "Rules have not been modified, will not re-download");
                return SyncOutcome::NotModified;
            }
            status => {
                error!(url, status, "Received rules download response");
                return SyncOutcome::Failed(format!("HTTP {}", status));
            }
        }

        let metadata = extract_metadata(&response);
        let cached = match self.extractor.extract(&response.body, &metadata) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(url, error = %e, "Could not extract rule bundle");
                return SyncOutcome::Failed(e.to_string());
            }
        };

        let descriptor = RuleBundleDescriptor {
            schema_version: DESCRIPTOR_SCHEMA_VERSION,
            source_url: url.to_string(),
            archive_size: response.body.len() as u64,
            cached_entries: cached.into_iter().collect(),
        };
        if let Err(e) = self.write_descriptor(&descriptor, &metadata) {
            warn!(error = %e, "Could not persist bundle descriptor");
        }
        if let Err(e) = self.ledger.set_remote_url(url) {
            warn!(error = %e, "Could not persist rules url");
        }

        let Some(rules) = self.read_cached_rules() else {
            return SyncOutcome::Failed(format!("{} missing or invalid", RULES_FILE));
        };
        let count = rules.len();
        info!(count, "Registering campaign rules");
        let assets = self.register(rules, timeout).await;

        SyncOutcome::Updated {
            rules: count,
            assets,
        }
    }

    /// Whether a previously synced rules file is cached
    pub fn has_cached_rules(&self) -> bool {
        self.cache.contains(RULES_NAMESPACE, RULES_FILE)
    }

    /// Register rules from the cache without any network call.
    ///
    /// Returns the number of rules registered, `None` if nothing usable is cached.
    pub async fn load_cached_rules(&self, timeout: Duration) -> Option<usize> {
        let rules = self.read_cached_rules()?;
        let count = rules.len();
        debug!(count, "Loading campaign rules from cache");
        self.register(rules, timeout).await;
        Some(count)
    }

    /// Remove the cached bundle (rules files and descriptor)
    pub fn clear_cached_rules(&self) {
        for namespace in [RULES_NAMESPACE, BUNDLE_NAMESPACE] {
            if let Err(e) = self.cache.remove_namespace(namespace) {
                warn!(namespace, error = %e, "Could not clear rules cache");
            }
        }
    }

    fn read_cached_rules(&self) -> Option<Vec<LaunchRule>> {
        let entry = self.cache.get(RULES_NAMESPACE, RULES_FILE)?;
        match parse_rules(&entry.bytes) {
            Ok(rules) => Some(rules),
            Err(e) => {
                warn!(error = %e, "Could not parse cached rules");
                None
            }
        }
    }

    /// Replace the active rules, then reconcile message assets against them
    async fn register(&self, rules: Vec<LaunchRule>, timeout: Duration) -> ReconcileReport {
        self.engine.replace_rules(rules);
        let active = self.engine.rules();
        self.assets.reconcile(&active, timeout).await
    }

    fn write_descriptor(
        &self,
        descriptor: &RuleBundleDescriptor,
        metadata: &CacheMetadata,
    ) -> Result<(), CacheError> {
        let data = serde_json::to_vec(descriptor)?;
        self.cache.set(BUNDLE_NAMESPACE, DESCRIPTOR_KEY, &data, metadata)
    }
}
