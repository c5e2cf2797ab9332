// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport
//!
//! Scripted in-memory transport for tests and host integrations that want to
//! run the engine without a network.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::request::{HttpRequest, HttpResponse};
use super::transport::{HttpTransport, TransportError, TransportResult};

#[derive(Debug, Clone)]
enum MockReply {
    Response(HttpResponse),
    Error(TransportError),
}

/// Transport answering from per-URL scripts.
///
/// Replies queued for a URL are consumed in order; the last one is sticky
/// and answers every later request. URLs without a script get the fallback
/// reply (404 unless changed). Every request is recorded.
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    fallback: Mutex<MockReply>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a transport answering 404 to everything.
    pub fn new() -> Self {
        MockTransport {
            routes: Mutex::new(HashMap::new()),
            fallback: Mutex::new(MockReply::Response(HttpResponse::new(404, Vec::new()))),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues a response for `url`.
    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.push(url, MockReply::Response(response));
    }

    /// Queues a bare status response for `url`.
    pub fn respond_status(&self, url: &str, status: u16) {
        self.respond(url, HttpResponse::new(status, Vec::new()));
    }

    /// Queues a transport failure for `url`.
    pub fn fail(&self, url: &str, error: TransportError) {
        self.push(url, MockReply::Error(error));
    }

    /// Replaces the reply for unscripted URLs.
    pub fn set_fallback(&self, response: HttpResponse) {
        *self.fallback.lock() = MockReply::Response(response);
    }

    /// Makes unscripted URLs fail at the transport level.
    pub fn set_fallback_error(&self, error: TransportError) {
        *self.fallback.lock() = MockReply::Error(error);
    }

    /// Drops every script for `url`.
    pub fn reset(&self, url: &str) {
        self.routes.lock().remove(url);
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Recorded requests to `url`.
    pub fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// URLs of the recorded requests, oldest first.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }

    /// Number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Forgets recorded requests (scripts are kept).
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn push(&self, url: &str, reply: MockReply) {
        self.routes
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, url: &str) -> MockReply {
        let mut routes = self.routes.lock();
        if let Some(queue) = routes.get_mut(url) {
            if queue.len() > 1 {
                if let Some(reply) = queue.pop_front() {
                    return reply;
                }
            }
            if let Some(reply) = queue.front() {
                return reply.clone();
            }
        }
        self.fallback.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let reply = self.next_reply(&request.url);
        self.requests.lock().push(request);
        match reply {
            MockReply::Response(response) => Ok(response),
            MockReply::Error(error) => Err(error),
        }
    }
}
