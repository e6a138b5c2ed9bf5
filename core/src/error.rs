//! Error types for the request pipeline.
//!
//! # Design
//! The pipeline never returns these to the caller of `Http::request`.
//! Every error raised between `before` and `after` is wrapped in
//! `Failure::Error` and handed to the `on_fail` hook, which decides what the
//! call resolves to. `Failure::Rejected` covers responses that arrived and
//! decoded fine but were classified as failures (status >= 400 or
//! `is_success` returning false).

use std::fmt;

use thiserror::Error;

use crate::http::Payload;

/// Errors raised inside the pipeline or by a transport.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A checkpoint observed a cancelled `CancelToken`.
    #[error("{tag} request canceled")]
    Cancelled { tag: String },

    /// The transport could not complete the round-trip (DNS, connect, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be decoded as the requested `ResType`.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// The parameters could not be encoded into a query string or body.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// A user hook reported an error of its own.
    #[error("hook failed: {0}")]
    Hook(String),

    /// The instance could not be built.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Encode(err.to_string())
    }
}

/// Why a call ended on the fail path. Passed to `on_fail` as `res`.
#[derive(Debug, Clone)]
pub enum Failure {
    /// The server answered, but with status >= 400 or a body that
    /// `is_success` rejected.
    Rejected { status: u16, body: Payload },

    /// Something went wrong before a decoded body was available.
    Error(PipelineError),
}

impl Failure {
    /// The decoded body, when the failure came from a real response.
    pub fn body(&self) -> Option<&Payload> {
        match self {
            Failure::Rejected { body, .. } => Some(body),
            Failure::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Failure::Rejected { .. } => None,
            Failure::Error(err) => Some(err),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error().is_some_and(PipelineError::is_cancelled)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Rejected { status, body } => write!(f, "HTTP {status}: {body}"),
            Failure::Error(err) => write!(f, "{err}"),
        }
    }
}

impl From<PipelineError> for Failure {
    fn from(err: PipelineError) -> Self {
        Failure::Error(err)
    }
}
