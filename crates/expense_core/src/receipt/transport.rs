//! Outbound HTTP seam for the inference endpoint.
//!
//! # Responsibility
//! - Deliver one JSON request and return status plus raw body.
//! - Map network failures and timeouts to `AnalysisError::Transport`.
//!
//! # Invariants
//! - Exactly one attempt per call; no retry.
//! - The API key travels in a header, never in the URL.

use super::error::{AnalysisError, AnalysisResult};
use std::time::Duration;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// A fully composed inference request.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub url: String,
    pub api_key: String,
    /// Serialized JSON body.
    pub body: String,
    pub timeout: Duration,
}

/// Raw endpoint reply, before any status interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceReply {
    pub status: u16,
    pub body: String,
}

impl InferenceReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by the analyzer to reach the endpoint.
pub trait InferenceTransport {
    fn send(&self, request: &InferenceRequest) -> AnalysisResult<InferenceReply>;
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl InferenceTransport for HttpTransport {
    fn send(&self, request: &InferenceRequest) -> AnalysisResult<InferenceReply> {
        let response = self
            .client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &request.api_key)
            .timeout(request.timeout)
            .body(request.body.clone())
            .send()
            .map_err(transport_failure)?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|err| AnalysisError::Transport {
            status: Some(status),
            body: format!("failed to read response body: {err}"),
        })?;

        Ok(InferenceReply { status, body })
    }
}

fn transport_failure(err: reqwest::Error) -> AnalysisError {
    let body = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        format!("request failed: {err}")
    };
    AnalysisError::Transport {
        status: err.status().map(|status| status.as_u16()),
        body,
    }
}
