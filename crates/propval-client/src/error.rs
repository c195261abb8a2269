//! Transport error taxonomy for calls to the valuation service

use thiserror::Error;
use tonic::{Code, Status};

/// Coarse classification of a [`TransportError`], used by callers that only need to
/// branch on the kind (retry policy, protocol mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Server unreachable or down
    Unavailable,
    /// The per-call deadline elapsed before a response arrived
    DeadlineExceeded,
    /// The remote side rejected the request as semantically invalid
    InvalidArgument,
    /// Any other remote or local failure
    Internal,
}

impl ErrorKind {
    /// Machine-readable code, in gRPC upper-snake-case convention.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Failure of a single call to the valuation service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server unreachable or down
    #[error("{}", .message.as_deref().unwrap_or("valuation service is unavailable"))]
    Unavailable {
        /// Optional detail from the transport
        message: Option<String>,
    },
    /// Deadline exceeded
    #[error("{}", .message.as_deref().unwrap_or("deadline exceeded"))]
    DeadlineExceeded {
        /// Optional detail from the transport
        message: Option<String>,
    },
    /// Rejected by the remote side
    #[error("{}", .message.as_deref().unwrap_or("invalid argument"))]
    InvalidArgument {
        /// Rejection reason reported by the service
        message: Option<String>,
    },
    /// Everything else
    #[error("{}", .message.as_deref().unwrap_or("internal error"))]
    Internal {
        /// Optional detail from the transport
        message: Option<String>,
    },
}

impl TransportError {
    /// Creates an `Unavailable` error with a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        TransportError::Unavailable {
            message: Some(message.into()),
        }
    }

    /// Creates a `DeadlineExceeded` error with a message.
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        TransportError::DeadlineExceeded {
            message: Some(message.into()),
        }
    }

    /// Creates an `InvalidArgument` error with a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TransportError::InvalidArgument {
            message: Some(message.into()),
        }
    }

    /// Creates an `Internal` error with a message.
    pub fn internal(message: impl Into<String>) -> Self {
        TransportError::Internal {
            message: Some(message.into()),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::Unavailable { .. } => ErrorKind::Unavailable,
            TransportError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            TransportError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            TransportError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Optional human-readable detail.
    pub fn message(&self) -> Option<&str> {
        match self {
            TransportError::Unavailable { message }
            | TransportError::DeadlineExceeded { message }
            | TransportError::InvalidArgument { message }
            | TransportError::Internal { message } => message.as_deref(),
        }
    }

    /// True for the only retried kind, `Unavailable`.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TransportError::Unavailable { .. })
    }
}

impl From<Status> for TransportError {
    fn from(status: Status) -> Self {
        let message = if status.message().is_empty() {
            None
        } else {
            Some(status.message().to_string())
        };
        match status.code() {
            Code::Unavailable => TransportError::Unavailable { message },
            Code::DeadlineExceeded => TransportError::DeadlineExceeded { message },
            Code::InvalidArgument => TransportError::InvalidArgument { message },
            _ => TransportError::Internal { message },
        }
    }
}

/// Result type alias using TransportError as the error type.
pub type Result<T> = std::result::Result<T, TransportError>;
