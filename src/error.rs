//! Error taxonomy for the matching pipeline.
//!
//! [`MatchError`] is what library callers see. Its variants keep client
//! mistakes (`InvalidRequest`) apart from dependency failures
//! (`ProviderFailure`) so the HTTP layer can answer 400 vs 502.

use std::time::Duration;

use thiserror::Error;

/// Failure of the external embedding collaborator, or a response from it
/// that breaks the adapter contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderFailure {
    #[error("embedding call timed out after {0:?}")]
    Timeout(Duration),

    #[error("embedding transport error: {0}")]
    Transport(String),

    #[error("embedding provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("embedding count mismatch: sent {expected} texts, received {actual} vectors")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider failure: {0}")]
    ProviderFailure(#[from] ProviderFailure),

    #[error("degenerate vector: {what} has zero norm, similarity is undefined")]
    DegenerateVector { what: String },

    #[error("shape mismatch: candidate {index} has dimension {actual}, query has {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

impl MatchError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Stable machine-readable kind, used as the `code` field of error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ProviderFailure(_) => "provider_failure",
            Self::DegenerateVector { .. } => "degenerate_vector",
            Self::ShapeMismatch { .. } => "shape_mismatch",
        }
    }

    /// True when the caller should fix the request rather than retry.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}
