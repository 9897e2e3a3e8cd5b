//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::error::LoadFailure;

/// Default request timeout for source metadata requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from metadata requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The request did not produce a response.
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String, body: String },

    /// The response body could not be read.
    #[error("Failed to read response: {0}")]
    Body(String),
}

impl HttpError {
    /// Converts the error into a failure report for a pending URL.
    pub fn into_failure(self, pending_url: &str) -> LoadFailure {
        let failure = LoadFailure::new(pending_url).with_detail(self.to_string());
        match self {
            HttpError::Status { status, body, .. } => failure
                .with_status(format!("HTTP {}", status))
                .with_response(body),
            _ => failure.with_status("error"),
        }
    }
}

/// Trait for async HTTP client operations.
///
/// Loaders are generic over this trait so tests can serve canned responses.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an HTTP GET request and returns the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Real async HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send {
        let request = self.client.get(url);
        let url = url.to_string();
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| HttpError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(HttpError::Status {
                    status: status.as_u16(),
                    url,
                    body,
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| HttpError::Body(e.to_string()))
        }
    }
}
