//! Receipt extraction through an external multimodal inference endpoint.
//!
//! # Responsibility
//! - Encode a receipt image and ask the endpoint for vendor, total, category.
//! - Defensively parse the unstructured reply into an expense candidate.
//!
//! # Invariants
//! - Configuration is explicit; there is no process-wide key or endpoint.
//! - Calls are synchronous and bounded by the configured timeout.

mod analyzer;
pub mod config;
mod error;
pub mod parse;
pub mod transport;

pub use analyzer::{
    build_request_body, candidate_from_text, mime_type_for_path, ReceiptAnalyzer,
    RECEIPT_INSTRUCTION,
};
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use transport::{HttpTransport, InferenceReply, InferenceRequest, InferenceTransport};
