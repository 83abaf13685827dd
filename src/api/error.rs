//! Error types for backend calls.

use thiserror::Error;

/// Shown when the backend cannot be reached at all.
pub const UNREACHABLE: &str = "Unable to reach the server. Please try again.";

/// Failure of a single backend request.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response: DNS, connect, TLS or body transfer failed.
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered 401.
    #[error("authentication rejected by backend")]
    Unauthorized {
        /// Message from the response body, if any.
        message: Option<String>,
    },

    /// Any other 4xx: validation or business rule failure.
    #[error("request rejected with status {status}")]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// 5xx.
    #[error("backend error with status {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// A 2xx whose body was not the JSON we expected.
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// HTTP status, when the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field the backend put in its error body.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message }
            | Self::Rejected { message, .. }
            | Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Inline text for a view. Validation errors show the backend's own
    /// message; everything else falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Transport(_) => UNREACHABLE.to_string(),
            Self::Unauthorized { .. } => "Your session has ended. Please sign in again.".to_string(),
            Self::Rejected { message, .. } => message.clone().unwrap_or_else(|| fallback.to_string()),
            _ => fallback.to_string(),
        }
    }
}
