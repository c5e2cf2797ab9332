// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hit delivery and outcome classification

use std::sync::Arc;

use tracing::{debug, warn};

use super::record::HitRecord;
use crate::network::{HttpMethod, HttpRequest, HttpTransport};
use crate::state::{current_time_millis, RegistrationLedger};

/// Status codes worth retrying.
pub const RECOVERABLE_STATUS_CODES: [u16; 3] = [408, 503, 504];

/// Terminal or retryable result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Delivered (HTTP 200)
    Success,
    /// Rejected for good; the hit is discarded
    PermanentFailure,
    /// No connection or a recoverable status; try again later
    Retry,
}

impl HitOutcome {
    /// Whether the hit leaves the queue
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HitOutcome::Retry)
    }
}

/// Sends hits and classifies the response
#[derive(Clone)]
pub struct HitProcessor {
    transport: Arc<dyn HttpTransport>,
    ledger: RegistrationLedger,
}

impl HitProcessor {
    pub fn new(transport: Arc<dyn HttpTransport>, ledger: RegistrationLedger) -> Self {
        Self { transport, ledger }
    }

    /// Deliver `hit` once
    pub async fn process(&self, hit: &HitRecord) -> HitOutcome {
        let timeout = hit.timeout_duration();
        let request = match hit.method() {
            HttpMethod::Post => HttpRequest::post(&hit.url, hit.payload.as_bytes().to_vec(), timeout),
            HttpMethod::Get => HttpRequest::get(&hit.url, timeout),
        }
        .with_header("Connection", "close")
        .with_header("Content-Type", "application/json")
        .with_header("Accept", "*/*");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %hit.url, error = %e, "Hit could not be sent, will retry");
                return HitOutcome::Retry;
            }
        };

        let outcome = classify(response.status);
        match outcome {
            HitOutcome::Success => {
                debug!(url = %hit.url, "Hit delivered");
                if hit.is_registration() {
                    if let Err(e) = self.ledger.record_registration(current_time_millis()) {
                        warn!(error = %e, "Could not record registration timestamp");
                    }
                }
            }
            HitOutcome::Retry => {
                debug!(url = %hit.url, status = response.status, "Recoverable hit failure, will retry");
            }
            HitOutcome::PermanentFailure => {
                debug!(url = %hit.url, status = response.status, "Unrecoverable hit failure, discarding");
            }
        }
        outcome
    }
}

/// Map an HTTP status to an outcome
pub fn classify(status: u16) -> HitOutcome {
    match status {
        200 => HitOutcome::Success,
        // No valid status line
        0 => HitOutcome::Retry,
        s if RECOVERABLE_STATUS_CODES.contains(&s) => HitOutcome::Retry,
        _ => HitOutcome::PermanentFailure,
    }
}
