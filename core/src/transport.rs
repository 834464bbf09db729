//! Async execution of built calls.
//!
//! # Design
//! `Transport` is the single I/O seam: it turns an `HttpRequest` into an
//! `HttpResponse`. `ApiClient` pairs a transport with a `TransitClient` and
//! races every round-trip against the configured timeout, so no call can
//! hang. A call that loses the race is dropped; nothing is retried.

use std::time::Duration;

use log::{debug, error};
use serde::de::DeserializeOwned;

use crate::client::{Call, Credentials, TransitClient};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as data rather than as
/// `Err`; status interpretation belongs to [`Call::parse`]. `Err` is for
/// failures where no response exists (connection refused, DNS, ...), and
/// should use [`ApiError::Transport`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// A `TransitClient` bound to a transport and a timeout.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    client: TransitClient,
    transport: T,
    timeout: Duration,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: &ApiConfig, transport: T) -> Self {
        Self {
            client: TransitClient::new(&config.base_url),
            transport,
            timeout: config.timeout,
        }
    }

    /// Builder side, for `api.call(api.client().build_*(..)?)`.
    pub fn client(&self) -> &TransitClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.client.credentials()
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.client.set_credentials(Some(credentials));
    }

    pub fn clear_credentials(&mut self) {
        self.client.set_credentials(None);
    }

    /// Execute `call`, failing with [`ApiError::Timeout`] when the transport
    /// does not answer in time.
    pub async fn call<R: DeserializeOwned>(&self, call: Call<R>) -> Result<R, ApiError> {
        let request = &call.request;
        debug!("{} {}", request.method, request.path);

        let result = match tokio::time::timeout(self.timeout, self.transport.execute(request)).await {
            Ok(Ok(response)) => call.parse(response),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ApiError::Timeout),
        };

        if let Err(e) = &result {
            error!("API Error [{} {}]: {}", request.method, request.path, e);
        }
        result
    }
}
