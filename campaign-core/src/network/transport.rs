// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Trait
//!
//! Platform-agnostic abstraction for issuing HTTP requests.

use async_trait::async_trait;
use thiserror::Error;

use super::request::{HttpRequest, HttpResponse};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// A request that produced no usable HTTP response.
///
/// Callers treat every variant as "no connection": hits are retried and
/// rule syncs are skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connect or read timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be built (bad URL, bad header...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// HTTP transport used for rule bundles, assets and hits.
///
/// Any HTTP status, including 4xx/5xx, is a successful `send`; only the
/// absence of a response is an error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and waits for the full response body.
    async fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse>;
}
