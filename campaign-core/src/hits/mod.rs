// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hits Module
//!
//! Registration and tracking requests, delivered durably in FIFO order.

mod processor;
mod queue;
mod record;

pub use processor::{classify, HitOutcome, HitProcessor, RECOVERABLE_STATUS_CODES};
pub use queue::DurableHitQueue;
pub use record::{HitDecodeError, HitRecord, HIT_SCHEMA_VERSION};
