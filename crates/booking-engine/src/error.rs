//! Error types for remote calls and booking orchestration.

use thiserror::Error;

use slot_engine::SlotError;

/// Message fragments the backend uses when a slot was claimed concurrently.
const CONFLICT_MARKERS: &[&str] = &["unavailable", "already booked", "buffer period"];

/// Failures reported by a [`crate::BookingBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the backend's error text when it sent one.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint does not exist on this backend (404/405/501).
    #[error("Unsupported endpoint: {0}")]
    Unsupported(String),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The human-readable reason, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            RemoteError::Transport(m)
            | RemoteError::Unsupported(m)
            | RemoteError::Decode(m)
            | RemoteError::Status { message: m, .. } => m,
        }
    }
}

/// How a failure should be surfaced to the person booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recoverable; the user can pick another time or fill in a field.
    Warning,
    Error,
}

/// Orchestration-level failures. Always carry a user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// A pre-flight check failed; no remote call was made.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the booking because the time was claimed.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Format(#[from] SlotError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookingError {
    pub fn severity(&self) -> Severity {
        match self {
            BookingError::Validation(_) | BookingError::Conflict(_) => Severity::Warning,
            BookingError::Transport(_) | BookingError::Format(_) | BookingError::Config(_) => {
                Severity::Error
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, BookingError::Conflict(_))
    }
}

impl From<RemoteError> for BookingError {
    fn from(err: RemoteError) -> Self {
        classify_failure(err.message())
    }
}

/// Sort a remote failure message into conflict or transport.
pub fn classify_failure(message: &str) -> BookingError {
    let lowered = message.to_ascii_lowercase();
    if CONFLICT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        BookingError::Conflict(message.to_string())
    } else {
        BookingError::Transport(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
