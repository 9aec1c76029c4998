//! Error taxonomy shared by every protocol adapter.
//!
//! Adapters never surface raw transport errors. Every failure is classified into
//! an [`ErrorKind`] and carries the name of the operation that produced it plus
//! the upstream's own message when one was available.
//!
//! ```
//! use solsdk::{Error, ErrorKind};
//!
//! let err = Error::new(ErrorKind::NotFound, "jupiter.price", "no price for mint");
//! assert!(err.kind().is_not_found());
//! assert_eq!(err.to_string(), "jupiter.price: not found: no price for mint");
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of a failed operation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The upstream has no such resource.
    #[display("not found")]
    NotFound,
    /// A caller-supplied value was rejected before any network call.
    #[display("invalid argument")]
    InvalidArgument,
    /// The upstream rejected the request (4xx other than 404/408/429).
    #[display("invalid request")]
    InvalidRequest,
    /// The upstream throttled the request.
    #[display("rate limited")]
    RateLimited,
    /// Network error, timeout or 5xx.
    #[display("upstream unavailable")]
    UpstreamUnavailable,
    /// Operation called before the adapter was initialized.
    #[display("invalid state")]
    InvalidState,
    /// Anything else, including malformed upstream bodies.
    #[display("unknown")]
    Unknown,
}

impl ErrorKind {
    /// Maps an HTTP status code to a kind.
    ///
    /// Only meaningful for non-success statuses.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            429 => Self::RateLimited,
            408 => Self::UpstreamUnavailable,
            400..=499 => Self::InvalidRequest,
            500..=599 => Self::UpstreamUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Maps a JSON-RPC error code to a kind.
    pub fn from_rpc_code(code: i64) -> Self {
        match code {
            -32600 | -32602 => Self::InvalidRequest,
            -32005 | 429 => Self::RateLimited,
            _ => Self::Unknown,
        }
    }

    /// Whether a transport-level retry may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable | Self::RateLimited)
    }
}

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation}: {kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    operation: Cow<'static, str>,
    message: String,
}

impl Error {
    /// Creates a new error.
    pub fn new(
        kind: ErrorKind,
        operation: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`ErrorKind::InvalidArgument`].
    pub fn invalid_argument(
        operation: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::InvalidArgument, operation, message)
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(operation: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, operation, message)
    }

    /// Shorthand for [`ErrorKind::InvalidState`].
    pub fn invalid_state(
        operation: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::InvalidState, operation, message)
    }

    /// Shorthand for [`ErrorKind::Unknown`], used for malformed upstream bodies.
    pub fn malformed(operation: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, operation, message)
    }

    /// Classifies a reqwest failure.
    pub fn from_reqwest(operation: impl Into<Cow<'static, str>>, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() {
            ErrorKind::UpstreamUnavailable
        } else if let Some(status) = err.status() {
            ErrorKind::from_status(status.as_u16())
        } else if err.is_decode() {
            ErrorKind::Unknown
        } else if err.is_request() || err.is_body() {
            ErrorKind::UpstreamUnavailable
        } else {
            ErrorKind::Unknown
        };
        Self::new(kind, operation, err.to_string())
    }

    /// Returns the classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the operation that failed, e.g. `"kamino.reserves"`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
