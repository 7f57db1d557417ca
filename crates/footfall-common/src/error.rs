//! Error types and utilities for Footfall

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for Footfall operations
pub type Result<T> = std::result::Result<T, FootfallError>;

/// Main error type for Footfall operations
#[derive(Error, Debug)]
pub enum FootfallError {
    /// Network or HTTP failure while reaching the data provider
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider rejected the credential
    #[error("Auth error: {message}")]
    Auth {
        message: String,
        status_code: Option<u16>,
    },

    /// The provider answered, but not in the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider answered with query errors and no data
    #[error("Query rejected by provider: {message}")]
    Query { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors outside of provider responses
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FootfallError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new transport error with an HTTP status code
    pub fn transport_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            message: msg.into(),
            status_code: Some(status),
            source: None,
        }
    }

    /// Create a new transport error with source
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new auth error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth {
            message: msg.into(),
            status_code: None,
        }
    }

    /// Create a new auth error with an HTTP status code
    pub fn auth_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Auth {
            message: msg.into(),
            status_code: Some(status),
        }
    }

    /// Create a new malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
            path: None,
            source: None,
        }
    }

    /// Create a new malformed response error pointing at a JSON path
    pub fn malformed_at(msg: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a new malformed response error with source
    pub fn malformed_with_source(
        msg: impl Into<String>,
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::MalformedResponse {
            message: msg.into(),
            path: Some(path.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query {
            message: msg.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// HTTP status carried by transport and auth errors
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status_code, .. } | Self::Auth { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether a request that failed with this error may succeed when retried.
    ///
    /// Only transport failures without a status (timeouts, refused
    /// connections), throttling and server errors qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status_code, .. } => match status_code {
                None => true,
                Some(status) => *status == 429 || *status >= 500,
            },
            _ => false,
        }
    }

    /// Whether the caller should ask for a different credential
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Convert from reqwest::Error to FootfallError
impl From<reqwest::Error> for FootfallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::transport_with_source("Connection failed", err)
        } else if let Some(status) = err.status() {
            let status_code = status.as_u16();
            Self::Transport {
                message: format!("HTTP error: {status_code}"),
                status_code: Some(status_code),
                source: Some(Box::new(err)),
            }
        } else {
            Self::transport_with_source("Network request failed", err)
        }
    }
}

/// Recover an owned error from one shared between waiters of a single run.
///
/// The variant, message, status and path survive. Boxed sources stay with the
/// shared original; I/O and serialization errors become generic errors that
/// point at it.
impl From<Arc<FootfallError>> for FootfallError {
    fn from(shared: Arc<FootfallError>) -> Self {
        let shared = match Arc::try_unwrap(shared) {
            Ok(owned) => return owned,
            Err(shared) => shared,
        };

        match shared.as_ref() {
            Self::Transport {
                message,
                status_code,
                ..
            } => Self::Transport {
                message: message.clone(),
                status_code: *status_code,
                source: None,
            },
            Self::Auth {
                message,
                status_code,
            } => Self::Auth {
                message: message.clone(),
                status_code: *status_code,
            },
            Self::MalformedResponse { message, path, .. } => Self::MalformedResponse {
                message: message.clone(),
                path: path.clone(),
                source: None,
            },
            Self::Query { message } => Self::query(message.clone()),
            Self::Config { message, .. } => Self::config(message.clone()),
            Self::Validation { message, field } => Self::Validation {
                message: message.clone(),
                field: field.clone(),
            },
            Self::Generic { message, .. } => Self::new(message.clone()),
            Self::Io(_) | Self::Serialization(_) => Self::Generic {
                message: shared.to_string(),
                source: Some(Box::new(Arc::clone(&shared))),
            },
        }
    }
}
