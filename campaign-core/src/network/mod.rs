// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP Transport Layer
//!
//! Everything that goes over the wire (rule bundles, assets, hits) goes
//! through the [`HttpTransport`] trait, so the sync and delivery logic can be
//! driven by [`MockTransport`] in tests and by [`ReqwestTransport`] in apps.

mod mock;
mod request;
#[cfg(feature = "http-client")]
mod reqwest_transport;
mod transport;

pub use mock::MockTransport;
pub use request::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(feature = "http-client")]
pub use reqwest_transport::ReqwestTransport;
pub use transport::{HttpTransport, TransportError, TransportResult};
