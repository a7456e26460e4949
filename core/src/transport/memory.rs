//! Scripted in-memory `HttpTransport` for deterministic tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::HttpTransport;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// In-memory transport that records executed requests and replays queued responses.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    queued: Mutex<VecDeque<HttpResponse>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response returned by the next `execute` call.
    pub fn queue_response(&self, response: HttpResponse) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    /// Queue a response with a JSON-encoded body.
    pub fn queue_json(&self, status: u16, body: &serde_json::Value) {
        self.queue_response(HttpResponse::new(status, body.to_string()));
    }

    /// Every request executed so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[async_trait]
impl HttpTransport for MemoryTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| ApiError::Transport("memory transport has no queued responses".into()))
    }
}
