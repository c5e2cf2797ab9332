// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registration eligibility against the durable ledger

use proptest::prelude::*;
use serde_json::json;

use campaign_core::state::{should_send_registration_request, MILLIS_PER_DAY};
use campaign_core::{
    CampaignConfig, CampaignState, ConfigurationSnapshot, IdentitySnapshot, RegistrationLedger,
    Storage,
};

const T0: i64 = 1_700_000_000_000;

fn state(ecid: &str, delay_days: i64) -> CampaignState {
    let config = ConfigurationSnapshot::from_value(json!({
        "global.privacy": "optedin",
        "campaign.server": "camp.test",
        "campaign.pkey": "pkey",
        "campaign.registrationDelay": delay_days,
    }));
    CampaignState::from_snapshots(
        &config,
        &IdentitySnapshot::with_ecid(ecid),
        &CampaignConfig::default(),
    )
}

fn registered_ledger(ecid: &str, at: i64) -> RegistrationLedger {
    let ledger = RegistrationLedger::new(Storage::in_memory().unwrap().into_shared());
    ledger.set_ecid(ecid).unwrap();
    ledger.record_registration(at).unwrap();
    ledger
}

#[test]
fn test_within_delay_skips_registration() {
    let ledger = registered_ledger("e1", T0);
    assert!(!should_send_registration_request(
        &state("e1", 7),
        &ledger,
        T0 + 6 * MILLIS_PER_DAY
    ));
}

#[test]
fn test_after_delay_registers() {
    let ledger = registered_ledger("e1", T0);
    assert!(should_send_registration_request(
        &state("e1", 7),
        &ledger,
        T0 + 8 * MILLIS_PER_DAY
    ));
}

#[test]
fn test_exact_delay_registers() {
    let ledger = registered_ledger("e1", T0);
    assert!(should_send_registration_request(
        &state("e1", 7),
        &ledger,
        T0 + 7 * MILLIS_PER_DAY
    ));
}

#[test]
fn test_changed_ecid_registers_immediately() {
    let ledger = registered_ledger("e1", T0);

    assert!(should_send_registration_request(&state("e2", 7), &ledger, T0 + 1));
    assert_eq!(ledger.ecid().unwrap().as_deref(), Some("e2"));
    // The new ECID is recorded, so the delay applies again
    assert!(!should_send_registration_request(&state("e2", 7), &ledger, T0 + 2));
}

#[test]
fn test_never_registered_is_due() {
    let ledger = RegistrationLedger::new(Storage::in_memory().unwrap().into_shared());
    ledger.set_ecid("e1").unwrap();

    assert!(should_send_registration_request(&state("e1", 7), &ledger, T0));
}

proptest! {
    #[test]
    fn prop_same_ecid_follows_delay(
        delay_days in 0i64..30,
        elapsed in 0i64..(40 * MILLIS_PER_DAY),
    ) {
        let ledger = registered_ledger("e1", T0);
        let due = should_send_registration_request(&state("e1", delay_days), &ledger, T0 + elapsed);
        prop_assert_eq!(due, elapsed >= delay_days * MILLIS_PER_DAY);
    }

    #[test]
    fn prop_changed_ecid_always_registers(elapsed in 0i64..(40 * MILLIS_PER_DAY)) {
        let ledger = registered_ledger("e1", T0);
        prop_assert!(should_send_registration_request(&state("e2", 7), &ledger, T0 + elapsed));
    }
}
