// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Two-slot readiness gate
//!
//! Events that need both configuration and identity are held until each
//! slot has been filled once, then released in arrival order.

use std::collections::VecDeque;

use tracing::{debug, warn};

/// Held events beyond this are dropped, oldest first.
pub const MAX_HELD_EVENTS: usize = 256;

/// Holds events until configuration and identity are both known
#[derive(Debug)]
pub struct ReadinessGate<E> {
    configuration: bool,
    identity: bool,
    held: VecDeque<E>,
}

impl<E> Default for ReadinessGate<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ReadinessGate<E> {
    pub fn new() -> Self {
        Self {
            configuration: false,
            identity: false,
            held: VecDeque::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.configuration && self.identity
    }

    /// Fill the configuration slot; returns events released by it
    pub fn fill_configuration(&mut self) -> Vec<E> {
        self.configuration = true;
        self.release()
    }

    /// Fill the identity slot; returns events released by it
    pub fn fill_identity(&mut self) -> Vec<E> {
        self.identity = true;
        self.release()
    }

    /// Pass `event` through if the gate is open, hold it otherwise
    pub fn admit(&mut self, event: E) -> Option<E> {
        if self.is_open() {
            return Some(event);
        }
        if self.held.len() >= MAX_HELD_EVENTS {
            warn!("Readiness gate full, dropping oldest held event");
            self.held.pop_front();
        }
        self.held.push_back(event);
        None
    }

    pub fn held_len(&self) -> usize {
        self.held.len()
    }

    fn release(&mut self) -> Vec<E> {
        if !self.is_open() || self.held.is_empty() {
            return Vec::new();
        }
        debug!(count = self.held.len(), "Readiness gate open, replaying held events");
        self.held.drain(..).collect()
    }
}
