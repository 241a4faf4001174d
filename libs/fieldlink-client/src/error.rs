//! Error types for the API client.

use serde::Serialize;
use thiserror::Error;

/// A classified call error.
///
/// This is the only error a facade call returns. Transport failures and
/// non-2xx responses are mapped into one of these variants by the response
/// pipeline before they reach calling code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The call exceeded its client timeout.
    #[error("{message}")]
    Timeout { message: String },

    /// A protected endpoint answered 401. The stored token has been cleared;
    /// the caller decides whether to navigate to `redirect_to`.
    #[error("{message}")]
    SessionExpired { message: String, redirect_to: String },

    /// A public endpoint answered 401, which points at a backend
    /// misconfiguration rather than an expired session. The stored token is
    /// left untouched.
    #[error("{message}")]
    AuthMisconfigured { message: String },

    /// The backend answered 500.
    #[error("{message}")]
    Server { message: String },

    /// The backend rejected the call with its own message.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// Anything else: connection failures, unreadable responses.
    #[error("{message}")]
    Network { status: Option<u16>, message: String },

    /// The outgoing request could not be built.
    #[error("invalid request: {0}")]
    Request(String),
}

impl ApiError {
    /// Human-readable message, meant to be displayed verbatim.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Timeout { message }
            | ApiError::SessionExpired { message, .. }
            | ApiError::AuthMisconfigured { message }
            | ApiError::Server { message }
            | ApiError::Backend { message, .. }
            | ApiError::Network { message, .. } => message,
            ApiError::Request(message) => message,
        }
    }

    /// HTTP status of the failed call, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::SessionExpired { .. } | ApiError::AuthMisconfigured { .. } => Some(401),
            ApiError::Server { .. } => Some(500),
            ApiError::Backend { status, .. } | ApiError::Network { status, .. } => *status,
            ApiError::Timeout { .. } | ApiError::Request(_) => None,
        }
    }

    /// Whether this error means the user has to log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    /// The `{ success: false, message, status }` view of this error.
    pub fn classified(&self) -> ClassifiedError {
        ClassifiedError {
            success: false,
            message: self.message().to_string(),
            status: self.status(),
        }
    }
}

/// Wire shape of a classified error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedError {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Serialize for ApiError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.classified().serialize(serializer)
    }
}

/// Errors from the session persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid JSON object.
    #[error("session store serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors from environment selection.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The name is not one of `development`, `testing`, `production`.
    #[error("invalid environment: {0}")]
    Invalid(String),

    /// The override could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}
