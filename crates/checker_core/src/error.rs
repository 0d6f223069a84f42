use std::fmt;

use thiserror::Error;

/// Message delivered when the attempt ceiling is reached.
pub const TIMEOUT_MESSAGE: &str = "Processing timeout. Please try again.";

/// Reason used when the backend reports `error` without an explanation.
pub const BACKEND_FALLBACK_MESSAGE: &str = "Processing failed";

/// Terminal failure of a submission flow, or a local rejection before one starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Backend(String),
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout { attempts: u32 },
    #[error("a submission is already in progress")]
    Busy,
    #[error("submission cancelled")]
    Cancelled,
}

/// Local input problems, detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("nothing to check: enter a claim or a URL, or attach an image")]
    EmptyInput,
    #[error("Please select an image file (got {mime_type})")]
    NotAnImage { mime_type: String },
    #[error("File size must be less than 5MB (got {size} bytes, max {max})")]
    FileTooLarge { size: u64, max: u64 },
}

/// A network or HTTP failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn http_status(code: u16) -> Self {
        Self::new(TransportKind::HttpStatus(code), format!("API error: {code}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::InvalidUrl => write!(f, "invalid url"),
            TransportKind::InvalidRequest => write!(f, "invalid request"),
            TransportKind::HttpStatus(code) => write!(f, "http status {code}"),
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            TransportKind::Decode => write!(f, "malformed response"),
            TransportKind::Network => write!(f, "network error"),
        }
    }
}
