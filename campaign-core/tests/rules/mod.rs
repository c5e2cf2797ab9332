// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rule Sync Tests
//!
//! Conditional bundle downloads, cache behaviour and message asset
//! reconciliation against a scripted transport.
//!
//! Run with: cargo test --test rules

#[path = "../common/mod.rs"]
mod common;

mod asset_tests;
mod header_props;

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use campaign_core::rules::{BundleExtractor, RuleSyncCoordinator, RulesEngine};
use campaign_core::{ConditionalCacheStore, MockTransport, RegistrationLedger, Storage};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A coordinator over a temporary cache directory
pub struct Harness {
    pub dir: TempDir,
    pub transport: Arc<MockTransport>,
    pub cache: ConditionalCacheStore,
    pub engine: Arc<RulesEngine>,
    pub ledger: RegistrationLedger,
    pub sync: RuleSyncCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        common::init_tracing();
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(MockTransport::new());
        let ledger = RegistrationLedger::new(Storage::in_memory().unwrap().into_shared());
        let (cache, engine, sync) = coordinator(&dir, &transport, &ledger);
        Harness {
            dir,
            transport,
            cache,
            engine,
            ledger,
            sync,
        }
    }

    /// A second coordinator sharing this one's cache directory, as after a restart
    pub fn restarted(&self) -> (Arc<RulesEngine>, RuleSyncCoordinator) {
        let (_, engine, sync) = coordinator(&self.dir, &self.transport, &self.ledger);
        (engine, sync)
    }
}

fn coordinator(
    dir: &TempDir,
    transport: &Arc<MockTransport>,
    ledger: &RegistrationLedger,
) -> (ConditionalCacheStore, Arc<RulesEngine>, RuleSyncCoordinator) {
    let cache = ConditionalCacheStore::new(&dir.path().join("cache")).unwrap();
    let extractor = BundleExtractor::new(dir.path().join("scratch"), cache.clone());
    let engine = Arc::new(RulesEngine::new());
    let sync = RuleSyncCoordinator::new(
        transport.clone(),
        cache.clone(),
        extractor,
        Arc::clone(&engine),
        ledger.clone(),
    );
    (cache, engine, sync)
}
