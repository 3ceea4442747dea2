use std::fmt;
use thiserror::Error;

/// Normalized non-success HTTP response: status plus the server's message, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Self { status, message }
    }

    /// 401 and 403 both invalidate the stored session.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => f.write_str(m),
            None => write!(f, "Request failed with status {}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

/// Errors surfaced by the portal client and its flows
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("{0}")]
    Api(ApiError),

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Transport { message: String },

    #[error("Unexpected response from server: {message}")]
    Decode { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },
}

impl PortalError {
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api(ApiError::new(status, message))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_failure())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// Give an API error without a server message a flow-specific text.
    pub fn with_fallback(self, fallback: &str) -> Self {
        match self {
            Self::Api(ApiError {
                status,
                message: None,
            }) => Self::Api(ApiError {
                status,
                message: Some(fallback.to_string()),
            }),
            other => other,
        }
    }
}

impl From<ApiError> for PortalError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}
