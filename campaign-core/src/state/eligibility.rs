// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registration eligibility

use tracing::{debug, warn};

use super::campaign_state::CampaignState;
use super::ledger::RegistrationLedger;
use super::MILLIS_PER_DAY;

/// Decide whether a registration request is due at `event_timestamp_millis`.
///
/// A changed ECID always triggers registration and is written to the ledger
/// right away, before the request is delivered. Otherwise registration is due
/// once `registration_delay_days` have passed since the last confirmed one.
pub fn should_send_registration_request(
    state: &CampaignState,
    ledger: &RegistrationLedger,
    event_timestamp_millis: i64,
) -> bool {
    if state.registration_paused() {
        debug!("Registration requests are paused");
        return false;
    }

    let current_ecid = state.ecid().unwrap_or_default();
    let stored_ecid = ledger.ecid().unwrap_or_else(|e| {
        warn!(error = %e, "Could not read registered ECID");
        None
    });

    if stored_ecid.as_deref().unwrap_or_default() != current_ecid {
        debug!("ECID changed since last registration, sending registration request");
        if let Err(e) = ledger.set_ecid(current_ecid) {
            warn!(error = %e, "Could not persist ECID");
        }
        return true;
    }

    let last_registration = ledger.last_registration_timestamp().unwrap_or_else(|e| {
        warn!(error = %e, "Could not read last registration time");
        -1
    });
    let delay_millis = state.registration_delay_days().saturating_mul(MILLIS_PER_DAY);

    if event_timestamp_millis.saturating_sub(last_registration) >= delay_millis {
        debug!(
            delay_days = state.registration_delay_days(),
            "Registration delay elapsed, sending registration request"
        );
        return true;
    }

    debug!(
        delay_days = state.registration_delay_days(),
        "Registration delay not elapsed, skipping registration request"
    );
    false
}
