//! Lifecycle of the one outstanding summarization request.
//!
//! The orchestrator never talks to the network itself. `submit` hands back
//! the identifier and payload to send; whoever sends it reports the outcome
//! through `resolve`. Only the outcome for the current identifier is kept.

use precis_ipc::{RequestState, SubmitParams};
use tracing::{debug, info, warn};

use crate::error::{TransportError, ValidationError};
use crate::summarizer::{SummarizeRequest, Summary};

/// Shortest accepted source text, counted in characters after trimming.
pub const MIN_TEXT_CHARS: usize = 10;

pub type RequestId = u64;

/// What `resolve` did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Succeeded,
    Failed,
    /// A newer submit or a reset superseded this request.
    Stale,
}

pub fn validate(raw: &SubmitParams) -> Result<SummarizeRequest, ValidationError> {
    if raw.text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(ValidationError::TextTooShort {
            min: MIN_TEXT_CHARS,
        });
    }
    Ok(SummarizeRequest {
        text: raw.text.clone(),
        min_length: coerce("min_length", &raw.min_length)?,
        max_length: coerce("max_length", &raw.max_length)?,
        num_beams: coerce("num_beams", &raw.num_beams)?,
        extractive_k: coerce("extractive_k", &raw.extractive_k)?,
    })
}

/// Accepts `"40"`, `" 40 "` and `"40.0"`; anything else is not a whole number.
fn coerce(field: &'static str, value: &str) -> Result<u32, ValidationError> {
    let trimmed = value.trim();
    let whole = match trimmed.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64),
    };
    let n = whole.ok_or_else(|| ValidationError::NotAnInteger {
        field,
        value: value.to_string(),
    })?;
    if n <= 0 {
        return Err(ValidationError::NotPositive { field });
    }
    u32::try_from(n).map_err(|_| ValidationError::NotAnInteger {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct RequestOrchestrator {
    state: RequestState,
    params: Option<SummarizeRequest>,
    result: Option<Summary>,
    error: Option<String>,
    last_issued: RequestId,
    /// The request whose response is still wanted.
    awaiting: Option<RequestId>,
}

impl Default for RequestOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self {
            state: RequestState::Idle,
            params: None,
            result: None,
            error: None,
            last_issued: 0,
            awaiting: None,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn params(&self) -> Option<&SummarizeRequest> {
        self.params.as_ref()
    }

    pub fn result(&self) -> Option<&Summary> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == RequestState::InFlight
    }

    /// Identifier of the request currently in flight.
    pub fn in_flight(&self) -> Option<RequestId> {
        self.awaiting
    }

    /// Validate and, if valid, issue a new request that supersedes any
    /// request still in flight. Returns what must be sent.
    pub fn submit(&mut self, raw: &SubmitParams) -> Option<(RequestId, SummarizeRequest)> {
        self.state = RequestState::Validating;
        self.result = None;
        self.error = None;
        self.params = None;
        if let Some(previous) = self.awaiting.take() {
            debug!(request_id = previous, "Superseding in-flight request");
        }

        match validate(raw) {
            Err(e) => {
                info!(error = %e, "Summarize request rejected");
                self.state = RequestState::Failed;
                self.error = Some(e.to_string());
                None
            }
            Ok(request) => {
                self.last_issued += 1;
                let id = self.last_issued;
                self.awaiting = Some(id);
                self.params = Some(request.clone());
                self.state = RequestState::InFlight;
                info!(
                    request_id = id,
                    chars = request.text.chars().count(),
                    "Summarize request issued"
                );
                Some((id, request))
            }
        }
    }

    pub fn resolve(
        &mut self,
        id: RequestId,
        outcome: Result<Summary, TransportError>,
    ) -> Resolution {
        if self.awaiting != Some(id) {
            debug!(request_id = id, current = ?self.awaiting, "Discarding stale response");
            return Resolution::Stale;
        }
        self.awaiting = None;
        match outcome {
            Ok(summary) => {
                info!(request_id = id, "Summarize request succeeded");
                self.state = RequestState::Succeeded;
                self.result = Some(summary);
                self.error = None;
                Resolution::Succeeded
            }
            Err(e) => {
                warn!(request_id = id, error = %e, "Summarize request failed");
                self.state = RequestState::Failed;
                self.result = None;
                self.error = Some(e.to_string());
                Resolution::Failed
            }
        }
    }

    /// Back to Idle. A request still in flight is left to finish and then
    /// discarded.
    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
        self.params = None;
        self.result = None;
        self.error = None;
        self.awaiting = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> SubmitParams {
        SubmitParams {
            text: text.to_string(),
            min_length: "40".to_string(),
            max_length: "160".to_string(),
            num_beams: "6".to_string(),
            extractive_k: "2".to_string(),
        }
    }

    fn summary(tag: &str) -> Summary {
        Summary {
            abstractive: format!("{tag} abstractive"),
            extractive: format!("{tag} extractive"),
            ..Summary::default()
        }
    }

    const TEXT: &str = "The quick brown fox jumps over the lazy dog.";

    #[test]
    fn short_text_fails_without_issuing_an_id() {
        let mut req = RequestOrchestrator::new();
        assert_eq!(req.submit(&raw("hello")), None);
        assert_eq!(req.state(), RequestState::Failed);
        assert!(req.error_message().unwrap().contains("at least 10 characters"));
        assert_eq!(req.in_flight(), None);

        // The first valid request still gets the first identifier.
        let (id, _) = req.submit(&raw(TEXT)).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn whitespace_padding_does_not_count_towards_length() {
        assert_eq!(
            validate(&raw("   short    \n\n")),
            Err(ValidationError::TextTooShort { min: MIN_TEXT_CHARS })
        );
        assert!(validate(&raw("  exactly10!  ")).is_ok());
    }

    #[test]
    fn numeric_fields_must_be_positive_whole_numbers() {
        let mut params = raw(TEXT);
        params.num_beams = "four".to_string();
        assert!(matches!(
            validate(&params),
            Err(ValidationError::NotAnInteger { field: "num_beams", .. })
        ));

        params.num_beams = "4.5".to_string();
        assert!(validate(&params).is_err());

        params.num_beams = "0".to_string();
        assert_eq!(
            validate(&params),
            Err(ValidationError::NotPositive { field: "num_beams" })
        );

        params.num_beams = " 4.0 ".to_string();
        assert_eq!(validate(&params).unwrap().num_beams, 4);
    }

    #[test]
    fn valid_submit_goes_in_flight_and_clears_previous_outcome() {
        let mut req = RequestOrchestrator::new();
        let (first, _) = req.submit(&raw(TEXT)).unwrap();
        req.resolve(first, Ok(summary("a")));
        assert!(req.result().is_some());

        let (second, sent) = req.submit(&raw(TEXT)).unwrap();
        assert!(second > first);
        assert_eq!(sent.min_length, 40);
        assert_eq!(req.state(), RequestState::InFlight);
        assert!(req.is_loading());
        assert!(req.result().is_none());
        assert!(req.error_message().is_none());
    }

    #[test]
    fn last_submit_wins_in_either_resolution_order() {
        for b_first in [false, true] {
            let mut req = RequestOrchestrator::new();
            let (a, _) = req.submit(&raw(TEXT)).unwrap();
            let (b, _) = req.submit(&raw(TEXT)).unwrap();

            if b_first {
                assert_eq!(req.resolve(b, Ok(summary("b"))), Resolution::Succeeded);
                assert_eq!(
                    req.resolve(a, Err(TransportError::Unreachable("down".into()))),
                    Resolution::Stale
                );
            } else {
                assert_eq!(req.resolve(a, Ok(summary("a"))), Resolution::Stale);
                assert_eq!(req.resolve(b, Ok(summary("b"))), Resolution::Succeeded);
            }

            assert_eq!(req.state(), RequestState::Succeeded);
            assert_eq!(req.result().unwrap().abstractive, "b abstractive");
            assert!(req.error_message().is_none());
            assert!(!req.is_loading());
        }
    }

    #[test]
    fn failure_message_comes_from_transport_error() {
        let mut req = RequestOrchestrator::new();
        let (id, _) = req.submit(&raw(TEXT)).unwrap();
        let outcome = Err(TransportError::Rejected {
            status: 400,
            message: "bad input".to_string(),
        });
        assert_eq!(req.resolve(id, outcome), Resolution::Failed);
        assert_eq!(req.error_message(), Some("bad input"));
        assert!(req.result().is_none());
    }

    #[test]
    fn reset_discards_the_pending_response() {
        let mut req = RequestOrchestrator::new();
        let (id, _) = req.submit(&raw(TEXT)).unwrap();
        req.reset();
        assert_eq!(req.state(), RequestState::Idle);
        assert!(req.params().is_none());
        assert_eq!(req.resolve(id, Ok(summary("late"))), Resolution::Stale);
        assert_eq!(req.state(), RequestState::Idle);
        assert!(req.result().is_none());
    }

    #[test]
    fn rejected_resubmit_supersedes_the_request_in_flight() {
        let mut req = RequestOrchestrator::new();
        let (id, _) = req.submit(&raw(TEXT)).unwrap();
        assert_eq!(req.submit(&raw("tiny")), None);
        assert_eq!(req.resolve(id, Ok(summary("late"))), Resolution::Stale);
        assert_eq!(req.state(), RequestState::Failed);
    }
}
