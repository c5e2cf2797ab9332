// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registration ledger
//!
//! The only durable state consulted when deciding whether a registration is
//! due: the last registered ECID and the time of the last confirmed
//! registration. The last synced rules URL lives in the same collection.

use crate::storage::{SharedStorage, StorageError};

/// Datastore key of the last registered ECID.
pub const LEDGER_ECID_KEY: &str = "ExperienceCloudId";

/// Datastore key of the last confirmed registration time (epoch millis).
pub const LEDGER_TIMESTAMP_KEY: &str = "CampaignRegistrationTimestamp";

/// Datastore key of the last successfully synced rules URL.
pub const LEDGER_REMOTE_URL_KEY: &str = "CampaignRemoteUrl";

/// Timestamp reported when no registration was ever confirmed.
const NO_REGISTRATION: i64 = -1;

/// Durable registration record backed by the datastore
#[derive(Clone)]
pub struct RegistrationLedger {
    storage: SharedStorage,
}

impl RegistrationLedger {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// ECID of the last registration, if any
    pub fn ecid(&self) -> Result<Option<String>, StorageError> {
        self.storage.lock().get_value(LEDGER_ECID_KEY)
    }

    pub fn set_ecid(&self, ecid: &str) -> Result<(), StorageError> {
        self.storage.lock().set_value(LEDGER_ECID_KEY, ecid)
    }

    /// Time of the last confirmed registration, -1 if never
    pub fn last_registration_timestamp(&self) -> Result<i64, StorageError> {
        self.storage
            .lock()
            .get_i64(LEDGER_TIMESTAMP_KEY, NO_REGISTRATION)
    }

    /// Record a confirmed registration delivered at `timestamp_millis`
    pub fn record_registration(&self, timestamp_millis: i64) -> Result<(), StorageError> {
        self.storage
            .lock()
            .set_value(LEDGER_TIMESTAMP_KEY, &timestamp_millis.to_string())
    }

    /// Last rules URL that synced successfully
    pub fn remote_url(&self) -> Result<Option<String>, StorageError> {
        self.storage.lock().get_value(LEDGER_REMOTE_URL_KEY)
    }

    pub fn set_remote_url(&self, url: &str) -> Result<(), StorageError> {
        self.storage.lock().set_value(LEDGER_REMOTE_URL_KEY, url)
    }

    /// Forget everything (privacy opt-out)
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.lock().clear_datastore()
    }
}
