// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error Types
//!
//! Unified error type for the campaign engine.

use thiserror::Error;

use crate::cache::CacheError;
use crate::messages::MessageError;
use crate::network::TransportError;
use crate::rules::{BundleError, RuleParseError};
use crate::storage::StorageError;

/// Unified error type for campaign operations.
#[derive(Error, Debug)]
pub enum CampaignError {
    /// Cache read or write failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Network request could not complete.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Rule bundle could not be extracted.
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// rules.json could not be parsed.
    #[error("rules error: {0}")]
    Rules(#[from] RuleParseError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Message consequence was invalid.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The runtime has shut down and no longer accepts work.
    #[error("campaign runtime is shut down")]
    ShutDown,

    /// The event work queue is at capacity.
    #[error("campaign work queue is full")]
    WorkQueueFull,
}

/// Result type for campaign operations.
pub type CampaignResult<T> = Result<T, CampaignError>;
