// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! reqwest-backed transport

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use super::request::{HttpMethod, HttpRequest, HttpResponse};
use super::transport::{HttpTransport, TransportError, TransportResult};
use crate::config::CampaignConfig;

/// Sends requests with a shared reqwest client
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport from config
    pub fn new(config: &CampaignConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.default_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        trace!(method = request.method.as_str(), url = %request.url, "Sending request");

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        // reqwest has no per-request connect timeout, bound the whole exchange
        builder = builder.timeout(request.connect_timeout + request.read_timeout);

        let response = builder.send().await.map_err(map_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
