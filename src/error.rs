//! Error types for upload handling and ingestion
//!
//! Every variant renders as a plain-text message naming the stage that failed.
//! Messages never carry the absolute staging path or driver credentials.

use crate::ingest::PipelineStep;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures surfaced to the uploader
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing `file` field, malformed multipart body, or a rejected filename
    #[error("Validation error: {0}")]
    Validation(String),

    /// Staging directory creation or file write failed
    #[error("I/O error while {stage}: {message}")]
    Io { stage: &'static str, message: String },

    /// A CSV row could not be converted (e.g. non-numeric quantity)
    #[error("Data error at line {line}: {message}")]
    Data { line: u64, message: String },

    /// One of the four ingestion steps failed; the transaction was rolled back
    #[error("Graph write error in step '{step}': {message}")]
    GraphWrite { step: PipelineStep, message: String },

    /// Opening or committing the graph session failed
    #[error("Graph session error during {stage}: {message}")]
    Session { stage: &'static str, message: String },

    /// The graph store did not answer within the configured bound
    #[error("Timed out during {stage}")]
    Timeout { stage: &'static str },
}

impl IngestError {
    pub fn io(stage: &'static str, err: &std::io::Error) -> Self {
        // std::io::Error never embeds the path, only the OS error
        IngestError::Io {
            stage,
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::Validation(_) => StatusCode::BAD_REQUEST,
            IngestError::Data { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            IngestError::GraphWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            IngestError::Session { .. } => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Whether the failure happened after a graph transaction was opened
    pub fn touched_graph(&self) -> bool {
        matches!(
            self,
            IngestError::GraphWrite { .. } | IngestError::Session { .. } | IngestError::Timeout { .. }
        )
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Startup configuration problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
