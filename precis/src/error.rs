//! Error types for the session engines and their collaborators.

use precis_ipc::Phase;
use thiserror::Error;

/// Rejected session configuration. Raised once, at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{} duration must be greater than zero", .phase.label())]
    NonPositiveDuration { phase: Phase },

    #[error("focus debounce must be greater than zero")]
    NonPositiveDebounce,

    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("could not build HTTP client: {0}")]
    HttpClient(String),
}

/// Input the orchestrator refuses to send.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter at least {min} characters to summarize.")]
    TextTooShort { min: usize },

    #[error("{field} must be a whole number, got {value:?}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

/// A failed round trip to the summarization service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Non-success status. The message is the service's `detail` when it sent
    /// one, otherwise the status line.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Could not reach the summarization service: {0}")]
    Unreachable(String),

    #[error("The summarization service sent an unreadable response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert permission was not granted")]
    PermissionDenied,

    #[error("alert channel unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session has shut down")]
    Closed,
}
