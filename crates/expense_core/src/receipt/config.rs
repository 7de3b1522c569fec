//! Inference endpoint configuration.
//!
//! Passed explicitly into [`super::ReceiptAnalyzer`]; there is no global
//! endpoint or key.

use std::fmt::{Debug, Formatter};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub api_key: String,
    /// Base URL, without the `/models/...` suffix.
    pub endpoint: String,
    pub model: String,
    /// Upper bound for the whole request, including reading the body.
    pub timeout: Duration,
}

impl AnalyzerConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full `generateContent` URL for the configured model.
    pub fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim().trim_end_matches('/'),
            self.model.trim()
        )
    }

    /// Returns the name of the first missing setting, if any.
    pub(crate) fn missing_setting(&self) -> Option<&'static str> {
        if self.api_key.trim().is_empty() {
            Some("api key")
        } else if self.endpoint.trim().is_empty() {
            Some("endpoint")
        } else if self.model.trim().is_empty() {
            Some("model")
        } else {
            None
        }
    }
}

// Keeps the key out of debug logs.
impl Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
