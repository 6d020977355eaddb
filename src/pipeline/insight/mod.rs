//! Insight generation against a remote language service.
//!
//! The sole asynchronous stage of the pipeline: per-chart narratives and
//! the cross-chart summary both suspend on a remote chat-completion call.

pub mod groq;
pub mod prompt;
pub mod types;

pub use groq::{GroqConfig, GroqInsightClient, MockInsightGenerator};
pub use types::InsightGenerator;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("cannot reach language service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("language service returned {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("failed to parse language service response: {0}")]
    ResponseParsing(String),

    #[error("language service returned no completion choices")]
    EmptyResponse,

    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,
}
