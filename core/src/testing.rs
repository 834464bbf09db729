//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{ApiClient, Transport};

pub(crate) const BASE_URL: &str = "http://transit.test/api";

/// Replies with queued responses in order and records every request.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: &str) -> Self {
        self.replies.lock().unwrap().push_back(HttpResponse::new(status, body));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("no scripted reply left".to_string()))
    }
}

pub(crate) fn api(transport: ScriptedTransport) -> ApiClient<ScriptedTransport> {
    ApiClient::new(&ApiConfig::new(BASE_URL), transport)
}
