//! Error types for the Crocial orchestration layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every screen and gateway in the application.
///
/// The taxonomy distinguishes failures the caller can act on differently:
/// local validation never reaches the network, auth failures invalidate the
/// session, network failures are always safe to retry, remote rejections and
/// empty results are terminal for the request that produced them.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrocialError {
    /// Bad local input, caught before any request is dispatched
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or rejected credentials/session
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transient transport failure (timeout, unreachable, connect)
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    /// The remote service explicitly rejected the request, or returned a
    /// body that does not match its documented shape
    #[error("Remote rejection ({}): {message}", .status.map(|s| s.to_string()).unwrap_or_else(|| "no status".to_string()))]
    Remote { status: Option<u16>, message: String },

    /// The call succeeded but produced no usable output
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrocialError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a retryable Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a Remote rejection with an HTTP status
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a Remote rejection for a malformed response body
    pub fn bad_shape(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an EmptyResult error
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::EmptyResult(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is an Auth error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is a Remote rejection
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Check if this is an EmptyResult error
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult(_))
    }

    /// Whether re-issuing the same request could plausibly succeed.
    ///
    /// Validation, auth, and remote rejections are not retryable without
    /// changing the request; transient network failures are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CrocialError {
    fn from(err: serde_json::Error) -> Self {
        Self::Remote {
            status: None,
            message: format!("response shape mismatch: {err}"),
        }
    }
}

impl From<String> for CrocialError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, CrocialError>`.
pub type Result<T> = std::result::Result<T, CrocialError>;
