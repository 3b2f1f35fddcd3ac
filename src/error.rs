use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification of a failed HTTP exchange with the PixelLab API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Authentication,
    InsufficientCredits,
    ValidationRejected,
    RateLimited,
    Server,
    Connection,
}

impl TransportErrorKind {
    /// Map an HTTP status to its kind and the short user-facing meaning.
    pub fn from_status(status: u16) -> (Self, &'static str) {
        match status {
            401 | 403 => (
                TransportErrorKind::Authentication,
                "authentication failed, check PIXELLAB_API_KEY",
            ),
            402 => (
                TransportErrorKind::InsufficientCredits,
                "insufficient credits, top up your PixelLab balance",
            ),
            422 => (
                TransportErrorKind::ValidationRejected,
                "validation error, the API rejected the request parameters",
            ),
            429 | 529 => (
                TransportErrorKind::RateLimited,
                "rate limited, wait before sending more requests",
            ),
            _ => (TransportErrorKind::Server, "unexpected response from the API"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Authentication => "authentication",
            TransportErrorKind::InsufficientCredits => "insufficient_credits",
            TransportErrorKind::ValidationRejected => "validation_rejected",
            TransportErrorKind::RateLimited => "rate_limited",
            TransportErrorKind::Server => "server",
            TransportErrorKind::Connection => "connection",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PixelLabError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("Validation error: {field}: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("{}", transport_message(.status, .message))]
    TransportError {
        status: Option<u16>,
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("File error: {path}: {message}")]
    FileIoError { path: String, message: String },

    #[error("Index out of range: pick {index} but only {available} variations were returned")]
    IndexOutOfRange { index: usize, available: usize },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, message),
        None => format!("Connection error: {}", message),
    }
}

impl PixelLabError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PixelLabError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn file_io(path: impl AsRef<std::path::Path>, err: impl fmt::Display) -> Self {
        PixelLabError::FileIoError {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Stable tag written to the `error_kind` field of the JSON report.
    pub fn kind(&self) -> &'static str {
        match self {
            PixelLabError::ConfigError(_) => "configuration",
            PixelLabError::UnknownSubcommand(_) => "unknown_subcommand",
            PixelLabError::ValidationError { .. } => "validation",
            PixelLabError::TransportError { kind, .. } => kind.as_str(),
            PixelLabError::DecodeError(_) => "decode",
            PixelLabError::FileIoError { .. } => "file_io",
            PixelLabError::IndexOutOfRange { .. } => "index_out_of_range",
        }
    }
}

pub type Result<T> = std::result::Result<T, PixelLabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(
            TransportErrorKind::from_status(402).0,
            TransportErrorKind::InsufficientCredits
        );
        assert_eq!(
            TransportErrorKind::from_status(401).0,
            TransportErrorKind::Authentication
        );
        assert_eq!(
            TransportErrorKind::from_status(403).0,
            TransportErrorKind::Authentication
        );
        assert_eq!(
            TransportErrorKind::from_status(529).0,
            TransportErrorKind::RateLimited
        );
        assert_eq!(
            TransportErrorKind::from_status(500).0,
            TransportErrorKind::Server
        );
    }

    #[test]
    fn test_display_messages() {
        let err = PixelLabError::TransportError {
            status: Some(402),
            kind: TransportErrorKind::InsufficientCredits,
            message: "insufficient credits".into(),
        };
        assert_eq!(err.to_string(), "HTTP 402: insufficient credits");
        assert_eq!(err.kind(), "insufficient_credits");

        let err = PixelLabError::validation("width", "must be at least 16");
        assert_eq!(err.to_string(), "Validation error: width: must be at least 16");
        assert_eq!(err.kind(), "validation");
    }
}
