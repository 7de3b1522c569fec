//! Typed failures for receipt analysis.

use crate::model::expense::ExpenseValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Failure of a single `analyze` call.
///
/// Response-shape variants always carry the offending text so prompt or
/// model drift can be diagnosed.
#[derive(Debug)]
pub enum AnalysisError {
    /// No usable key/endpoint; the network was not touched.
    ConfigurationMissing(&'static str),
    EmptyImage,
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },
    UnsupportedImageType(String),
    /// Network failure, timeout (`status == None`) or non-success status.
    Transport {
        status: Option<u16>,
        body: String,
    },
    /// Envelope lacks `candidates[0].content.parts[*].text`.
    MalformedResponse { body: String },
    /// Model text is not a JSON object with exactly `name`, `amount`, `category`.
    UnparseablePayload { text: String, reason: String },
    /// Amount could not be normalized to a positive decimal.
    InvalidAmount { raw: String },
    /// Fields parsed but the candidate violates record invariants.
    InvalidCandidate {
        source: ExpenseValidationError,
        text: String,
    },
}

impl AnalysisError {
    /// Returns a stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::EmptyImage => "empty_image",
            Self::ImageRead { .. } => "image_read_failed",
            Self::UnsupportedImageType(_) => "unsupported_image_type",
            Self::Transport { .. } => "transport_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::UnparseablePayload { .. } => "unparseable_payload",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidCandidate { .. } => "invalid_candidate",
        }
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigurationMissing(what) => {
                write!(f, "receipt analysis is not configured: missing {what}")
            }
            Self::EmptyImage => write!(f, "receipt image is empty"),
            Self::ImageRead { path, source } => {
                write!(f, "failed to read receipt image `{}`: {source}", path.display())
            }
            Self::UnsupportedImageType(ext) => {
                write!(f, "unsupported receipt image type `{ext}`")
            }
            Self::Transport { status, body } => match (status, api_error_message(body)) {
                (Some(code), Some(message)) => {
                    write!(f, "inference endpoint returned HTTP {code}: {message}")
                }
                (Some(code), None) => write!(f, "inference endpoint returned HTTP {code}"),
                (None, _) => write!(f, "inference request failed: {body}"),
            },
            Self::MalformedResponse { .. } => {
                write!(f, "inference response has no generated text part")
            }
            Self::UnparseablePayload { text, reason } => {
                write!(f, "model reply is not a receipt object ({reason}): {text}")
            }
            Self::InvalidAmount { raw } => write!(f, "model reply has an invalid amount `{raw}`"),
            Self::InvalidCandidate { source, text } => {
                write!(f, "model reply failed validation ({source}): {text}")
            }
        }
    }
}

impl Error for AnalysisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ImageRead { source, .. } => Some(source),
            Self::InvalidCandidate { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Extracts `error.message` from a Gemini-style error body.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}
