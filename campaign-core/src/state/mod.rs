// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Campaign state
//!
//! Per-event snapshot of configuration and identity, the privacy status that
//! gates every network activity, and the durable registration ledger.

mod campaign_state;
mod eligibility;
mod ledger;
mod privacy;
mod snapshot;

pub use campaign_state::CampaignState;
pub use eligibility::should_send_registration_request;
pub use ledger::{
    RegistrationLedger, LEDGER_ECID_KEY, LEDGER_REMOTE_URL_KEY, LEDGER_TIMESTAMP_KEY,
};
pub use privacy::PrivacyStatus;
pub use snapshot::{config_keys, ConfigurationSnapshot, IdentitySnapshot, IDENTITY_ECID_KEY};

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Current wall-clock time in epoch milliseconds.
pub fn current_time_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
