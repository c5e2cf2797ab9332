// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rules engine
//!
//! Holds the active rule set as an immutable snapshot. Replacement swaps the
//! whole snapshot under a write lock, so readers see either the old set or
//! the new one, never a mix.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{Consequence, LaunchRule};

/// Active rule set with atomic replacement
#[derive(Default)]
pub struct RulesEngine {
    rules: RwLock<Arc<[LaunchRule]>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new rule set
    pub fn replace_rules(&self, rules: Vec<LaunchRule>) {
        let count = rules.len();
        *self.rules.write() = Arc::from(rules);
        debug!(count, "Registered campaign rules");
    }

    /// Drop every rule
    pub fn clear(&self) {
        *self.rules.write() = Arc::from(Vec::new());
    }

    /// Snapshot of the active rules
    pub fn rules(&self) -> Arc<[LaunchRule]> {
        Arc::clone(&self.rules.read())
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Consequences of every rule matching `data`, in rule order
    pub fn evaluate(&self, data: &Map<String, Value>) -> Vec<Consequence> {
        let rules = self.rules();
        rules
            .iter()
            .filter(|rule| rule.condition.matches(data))
            .flat_map(|rule| rule.consequences.iter().cloned())
            .collect()
    }
}
