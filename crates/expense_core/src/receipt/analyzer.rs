//! Receipt image → expense candidate.
//!
//! # Responsibility
//! - Compose a single multimodal `generateContent` request for a receipt.
//! - Convert the reply into a validated, unsaved [`Expense`].
//!
//! # Invariants
//! - Missing configuration fails before any network activity.
//! - One request per call; retries belong to the caller.
//! - Either every field validates and a complete record is returned, or a
//!   typed error is returned and no record is built.
//! - No persistence happens here.

use super::config::AnalyzerConfig;
use super::error::{AnalysisError, AnalysisResult};
use super::parse::{extract_candidate_text, normalize_amount, parse_receipt_payload, strip_code_fence};
use super::transport::{HttpTransport, InferenceRequest, InferenceTransport};
use crate::model::expense::Expense;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{error, info, warn};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Instant;

/// Fixed instruction sent with every receipt image.
pub const RECEIPT_INSTRUCTION: &str = "Analyze this receipt. Extract only the store or vendor name, \
the final total amount, and suggest a single expense category (e.g., 'Groceries', 'Dining', \
'Utilities', 'Transport'). Format the output as a JSON object with keys: 'name', 'amount', \
'category'. Do not include any other text or formatting.";

const MAX_LOGGED_BODY_CHARS: usize = 200;

/// Extracts expense candidates from receipt images via an inference endpoint.
///
/// Holds no mutable state; safe to call from a worker thread when the
/// transport is `Send + Sync`.
pub struct ReceiptAnalyzer<T: InferenceTransport = HttpTransport> {
    config: Option<AnalyzerConfig>,
    transport: T,
}

impl ReceiptAnalyzer<HttpTransport> {
    /// Creates an analyzer over the default blocking HTTP transport.
    ///
    /// `None` yields an analyzer whose calls fail with
    /// `ConfigurationMissing`, so shells can treat the feature as unavailable.
    pub fn new(config: Option<AnalyzerConfig>) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: InferenceTransport> ReceiptAnalyzer<T> {
    pub fn with_transport(config: Option<AnalyzerConfig>, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns whether `analyze` can attempt a request at all.
    pub fn is_configured(&self) -> bool {
        self.usable_config().is_ok()
    }

    /// Analyzes an in-memory receipt image.
    ///
    /// # Errors
    /// - `ConfigurationMissing` when key, endpoint or model is absent.
    /// - `EmptyImage` when `image` has no bytes.
    /// - `Transport` for network failures, timeouts and non-2xx statuses.
    /// - `MalformedResponse`, `UnparseablePayload`, `InvalidAmount`,
    ///   `InvalidCandidate` for replies that do not yield a valid record.
    pub fn analyze(&self, image: &[u8], mime_type: &str) -> AnalysisResult<Expense> {
        let config = self.usable_config()?;
        if image.is_empty() {
            return Err(AnalysisError::EmptyImage);
        }

        let started_at = Instant::now();
        info!(
            "event=receipt_analyze module=receipt status=start model={} mime_type={} image_bytes={}",
            config.model,
            mime_type,
            image.len()
        );

        let result = self.run(config, image, mime_type);
        match &result {
            Ok(_) => info!(
                "event=receipt_analyze module=receipt status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=receipt_analyze module=receipt status=error duration_ms={} error_code={} detail={}",
                started_at.elapsed().as_millis(),
                err.code(),
                diagnostic_excerpt(err)
            ),
        }
        result
    }

    /// Reads an image file and analyzes it, inferring the mime type from the
    /// file extension.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> AnalysisResult<Expense> {
        let path = path.as_ref();
        self.usable_config()?;
        let mime_type = mime_type_for_path(path)?;
        let image = std::fs::read(path).map_err(|source| AnalysisError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.analyze(&image, mime_type)
    }

    fn usable_config(&self) -> AnalysisResult<&AnalyzerConfig> {
        let config = self
            .config
            .as_ref()
            .ok_or(AnalysisError::ConfigurationMissing("analyzer configuration"))?;
        match config.missing_setting() {
            Some(setting) => Err(AnalysisError::ConfigurationMissing(setting)),
            None => Ok(config),
        }
    }

    fn run(&self, config: &AnalyzerConfig, image: &[u8], mime_type: &str) -> AnalysisResult<Expense> {
        let encoded = STANDARD.encode(image);
        let request = InferenceRequest {
            url: config.request_url(),
            api_key: config.api_key.clone(),
            body: build_request_body(mime_type, &encoded).to_string(),
            timeout: config.timeout,
        };

        let reply = self.transport.send(&request)?;
        if !reply.is_success() {
            return Err(AnalysisError::Transport {
                status: Some(reply.status),
                body: reply.body,
            });
        }

        let text = extract_candidate_text(&reply.body)?;
        candidate_from_text(&text)
    }
}

/// Builds the `generateContent` body: one `contents` entry whose parts are
/// the instruction followed by the inline image.
pub fn build_request_body(mime_type: &str, encoded_image: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": RECEIPT_INSTRUCTION },
                {
                    "inline_data": {
                        "mime_type": mime_type,
                        "data": encoded_image
                    }
                }
            ]
        }]
    })
}

/// Turns raw model text into a validated, unsaved, undated expense.
pub fn candidate_from_text(text: &str) -> AnalysisResult<Expense> {
    let cleaned = strip_code_fence(text);
    let payload = parse_receipt_payload(cleaned)?;
    let amount = normalize_amount(&payload.amount)?;

    let expense = Expense::new(payload.name.trim(), amount, payload.category.trim());
    expense
        .validate()
        .map_err(|source| AnalysisError::InvalidCandidate {
            source,
            text: cleaned.to_string(),
        })?;
    Ok(expense)
}

/// Maps a receipt file extension to an image mime type.
pub fn mime_type_for_path(path: &Path) -> AnalysisResult<&'static str> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        "heic" => Ok("image/heic"),
        "heif" => Ok("image/heif"),
        _ => {
            warn!(
                "event=receipt_analyze module=receipt status=rejected error_code=unsupported_image_type extension={}",
                extension
            );
            Err(AnalysisError::UnsupportedImageType(extension))
        }
    }
}

fn diagnostic_excerpt(err: &AnalysisError) -> String {
    let raw = match err {
        AnalysisError::Transport { body, .. } | AnalysisError::MalformedResponse { body } => {
            body.as_str()
        }
        AnalysisError::UnparseablePayload { text, .. } | AnalysisError::InvalidCandidate { text, .. } => {
            text.as_str()
        }
        AnalysisError::InvalidAmount { raw } => raw.as_str(),
        _ => "",
    };
    crate::logging::sanitize_message(raw, MAX_LOGGED_BODY_CHARS)
}
