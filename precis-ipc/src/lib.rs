//! Inter-process communication between precis and precisctl
//!
//! We use Unix domain sockets for local IPC - one JSON command per line,
//! answered by one JSON response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that precisctl can send to precis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Skip,
    Status,
    Submit(SubmitParams),
    ClearRequest,
    FocusLost,
    FocusGained,
    Dismiss,
    SetFocusAlerts(bool),
    GetNotes,
    SetNotes(String),
    ClearNotes,
}

/// Raw summarization parameters as typed by the user.
///
/// Numeric fields stay strings on the wire; precis validates and coerces them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitParams {
    pub text: String,
    pub min_length: String,
    pub max_length: String,
    pub num_beams: String,
    pub extractive_k: String,
}

/// Responses from precis back to precisctl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Status(SessionStatus),
    Notes(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub timer: TimerStatus,
    pub request: RequestStatus,
    pub focus: FocusStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub phase: Phase,
    pub remaining: u64, // seconds
    pub total: u64,     // seconds
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn other(self) -> Self {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatus {
    pub state: RequestState,
    pub request_id: Option<u64>,
    pub abstractive_summary: Option<String>,
    pub extractive_summary: Option<String>,
    /// Generation parameters the service reports having used, as it sent them.
    pub used_generation_params: Option<serde_json::Value>,
    pub note: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusStatus {
    pub enabled: bool,
    pub away_count: u32,
    pub banner_visible: bool,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused - is precis running?")]
    ConnectionRefused,

    #[error("precis closed the connection without answering")]
    NoResponse,
}

pub const SOCKET_PATH: &str = "/tmp/precis.sock";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_command_keeps_numeric_fields_as_text() {
        let cmd = Command::Submit(SubmitParams {
            text: "some long enough text".to_string(),
            min_length: "40".to_string(),
            max_length: "abc".to_string(),
            num_beams: "6".to_string(),
            extractive_k: "2".to_string(),
        });
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"max_length\":\"abc\""));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn phase_other_alternates() {
        assert_eq!(Phase::Work.other(), Phase::Break);
        assert_eq!(Phase::Break.other(), Phase::Work);
    }
}
