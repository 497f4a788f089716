//! Session actor - owns the timer, request and focus engines.
//!
//! All mutation happens inside one task. User commands arrive over a bounded
//! channel with a oneshot for the resulting view; ticks, debounced banner
//! clears and request resolutions arrive over an internal channel fed by
//! tasks the actor spawns. Each event is applied whole before the next is
//! looked at, and the consolidated [`SessionView`] is republished after every
//! one of them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use precis_ipc::{
    FocusStatus, Phase, RequestState, RequestStatus, SessionStatus, SubmitParams, TimerStatus,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;
use tracing::{debug, info};

use crate::alert::AlertChannel;
use crate::error::{SessionError, TransportError};
use crate::focus::{ClearToken, FocusMonitor};
use crate::request::{RequestId, RequestOrchestrator, Resolution};
use crate::summarizer::{SummarizeRequest, Summarizer, Summary};
use crate::timer::{PhaseDurations, Ticker, TimerEngine, TimerEvent};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub durations: PhaseDurations,
    pub auto_start: bool,
    pub notify_on_phase_end: bool,
    pub focus_enabled: bool,
    pub focus_debounce: Duration,
    pub focus_message: String,
    pub tick_period: Duration,
}

impl SessionSettings {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            durations,
            auto_start: false,
            notify_on_phase_end: true,
            focus_enabled: true,
            focus_debounce: Duration::from_millis(300),
            focus_message: "Focus: stay on the summarizer".to_string(),
            tick_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Pause,
    ResetTimer,
    Skip,
    Submit(SubmitParams),
    ClearRequest,
    FocusLost,
    FocusGained,
    Dismiss,
    SetFocusAlerts(bool),
}

#[derive(Debug)]
struct Dispatch {
    command: SessionCommand,
    respond_to: oneshot::Sender<SessionView>,
}

#[derive(Debug)]
enum InternalEvent {
    Tick { generation: u64 },
    BannerClearDue(ClearToken),
    Resolved {
        id: RequestId,
        outcome: Result<Summary, TransportError>,
    },
}

/// Everything presentation needs, as one consistent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub timer: TimerStatus,
    pub progress: f64,
    pub work_secs: u64,
    pub break_secs: u64,
    pub request_state: RequestState,
    pub request_id: Option<RequestId>,
    pub params: Option<SummarizeRequest>,
    pub summary: Option<Summary>,
    pub error: Option<String>,
    pub discarded_responses: u64,
    pub focus: FocusStatus,
    pub last_away_at: Option<DateTime<Local>>,
}

impl SessionView {
    pub fn is_loading(&self) -> bool {
        self.request_state == RequestState::InFlight
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            timer: self.timer.clone(),
            request: RequestStatus {
                state: self.request_state,
                request_id: self.request_id,
                abstractive_summary: self.summary.as_ref().map(|s| s.abstractive.clone()),
                extractive_summary: self.summary.as_ref().map(|s| s.extractive.clone()),
                used_generation_params: self.summary.as_ref().and_then(|s| s.used_params.clone()),
                note: self.summary.as_ref().and_then(|s| s.note.clone()),
                error: self.error.clone(),
            },
            focus: self.focus.clone(),
        }
    }
}

pub struct SessionController {
    commands: mpsc::Receiver<Dispatch>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    view_tx: watch::Sender<SessionView>,

    timer: TimerEngine,
    requests: RequestOrchestrator,
    focus: FocusMonitor,

    summarizer: Arc<dyn Summarizer>,
    ticker: Option<Ticker>,
    ticker_generation: u64,
    tick_period: Duration,
    notify_on_phase_end: bool,
    discarded_responses: u64,
}

/// Build the session and start its actor task. Must be called from within a
/// tokio runtime.
pub fn spawn_session(
    settings: SessionSettings,
    summarizer: Arc<dyn Summarizer>,
    alerts: Box<dyn AlertChannel>,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();

    let mut timer = TimerEngine::new(settings.durations);
    if settings.auto_start {
        timer.start();
    }
    let focus = FocusMonitor::new(
        settings.focus_enabled,
        settings.focus_debounce,
        settings.focus_message,
        alerts,
    );

    let requests = RequestOrchestrator::new();
    let (view_tx, view_rx) = watch::channel(snapshot(&timer, &requests, &focus, 0));

    let mut controller = SessionController {
        commands: command_rx,
        internal_rx,
        internal_tx,
        view_tx,
        timer,
        requests,
        focus,
        summarizer,
        ticker: None,
        ticker_generation: 0,
        tick_period: settings.tick_period,
        notify_on_phase_end: settings.notify_on_phase_end,
        discarded_responses: 0,
    };
    controller.sync_ticker();

    tokio::spawn(controller.run());
    SessionHandle {
        sender: command_tx,
        view: view_rx,
    }
}

fn snapshot(
    timer: &TimerEngine,
    requests: &RequestOrchestrator,
    focus: &FocusMonitor,
    discarded_responses: u64,
) -> SessionView {
    let durations = timer.durations();
    SessionView {
        timer: timer.status(),
        progress: timer.progress(),
        work_secs: durations.of(Phase::Work),
        break_secs: durations.of(Phase::Break),
        request_state: requests.state(),
        request_id: requests.in_flight(),
        params: requests.params().cloned(),
        summary: requests.result().cloned(),
        error: requests.error_message().map(str::to_string),
        discarded_responses,
        focus: focus.status(),
        last_away_at: focus.last_away_at(),
    }
}

impl SessionController {
    /// Processes events until every [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        info!(
            work_secs = self.timer.durations().of(Phase::Work),
            break_secs = self.timer.durations().of(Phase::Break),
            "Session started"
        );
        loop {
            tokio::select! {
                dispatch = self.commands.recv() => {
                    let Some(Dispatch { command, respond_to }) = dispatch else {
                        break;
                    };
                    self.handle_command(command);
                    let view = self.publish();
                    // The caller may have stopped waiting.
                    let _ = respond_to.send(view);
                }
                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event);
                    self.publish();
                }
            }
        }
        self.ticker = None;
        info!(away_count = self.focus.away_count(), "Session stopped");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        debug!(?command, "Session command");
        match command {
            SessionCommand::Start => {
                if let Some(event) = self.timer.start() {
                    self.log_timer(event);
                }
            }
            SessionCommand::Pause => {
                if let Some(event) = self.timer.pause() {
                    self.log_timer(event);
                }
            }
            SessionCommand::ResetTimer => {
                let event = self.timer.reset();
                self.log_timer(event);
            }
            SessionCommand::Skip => {
                let event = self.timer.skip();
                self.log_timer(event);
            }
            SessionCommand::Submit(raw) => self.submit(&raw),
            SessionCommand::ClearRequest => self.requests.reset(),
            SessionCommand::FocusLost => {
                self.focus.on_focus_lost();
            }
            SessionCommand::FocusGained => self.focus_gained(),
            SessionCommand::Dismiss => self.focus.dismiss(),
            SessionCommand::SetFocusAlerts(enabled) => {
                info!(enabled, "Focus alerts toggled");
                self.focus.set_enabled(enabled);
            }
        }
        self.sync_ticker();
    }

    fn handle_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::Tick { generation } => {
                if self.ticker.as_ref().map(Ticker::generation) != Some(generation) {
                    debug!(generation, "Tick from released ticker");
                    return;
                }
                if let Some(event) = self.timer.on_tick() {
                    self.log_timer(event);
                    if let TimerEvent::PhaseCompleted { finished, next } = event {
                        self.announce_phase_end(finished, next);
                    }
                }
                self.sync_ticker();
            }
            InternalEvent::BannerClearDue(token) => {
                if self.focus.on_clear_due(token) {
                    debug!("Focus banner cleared");
                }
            }
            InternalEvent::Resolved { id, outcome } => {
                if self.requests.resolve(id, outcome) == Resolution::Stale {
                    self.discarded_responses += 1;
                }
            }
        }
    }

    fn submit(&mut self, raw: &SubmitParams) {
        let Some((id, request)) = self.requests.submit(raw) else {
            return;
        };
        let summarizer = Arc::clone(&self.summarizer);
        let results = self.internal_tx.clone();
        tokio::spawn(async move {
            let outcome = summarizer.summarize(&request).await;
            // The session may have shut down meanwhile.
            let _ = results.send(InternalEvent::Resolved { id, outcome });
        });
    }

    fn focus_gained(&mut self) {
        let Some(token) = self.focus.on_focus_gained() else {
            return;
        };
        let delay = self.focus.debounce();
        let events = self.internal_tx.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = events.send(InternalEvent::BannerClearDue(token));
        });
    }

    /// Keep exactly one ticker alive while the timer runs, none otherwise.
    fn sync_ticker(&mut self) {
        match (self.timer.is_running(), self.ticker.is_some()) {
            (true, false) => {
                self.ticker_generation += 1;
                self.ticker = Some(Ticker::spawn(
                    self.ticker_generation,
                    self.tick_period,
                    self.internal_tx.clone(),
                    |generation| InternalEvent::Tick { generation },
                ));
            }
            (false, true) => {
                self.ticker = None;
            }
            _ => {}
        }
    }

    fn announce_phase_end(&self, finished: Phase, next: Phase) {
        if !self.notify_on_phase_end {
            return;
        }
        let title = format!("{} phase complete", finished.label());
        let body = format!("{} phase is ready when you are.", next.label());
        self.focus.notify(&title, &body);
    }

    fn log_timer(&self, event: TimerEvent) {
        match event {
            TimerEvent::PhaseCompleted { finished, next } => {
                info!(finished = finished.label(), next = next.label(), "Phase completed")
            }
            other => info!(event = ?other, "Timer"),
        }
    }

    fn view(&self) -> SessionView {
        snapshot(&self.timer, &self.requests, &self.focus, self.discarded_responses)
    }

    fn publish(&self) -> SessionView {
        let view = self.view();
        self.view_tx.send_replace(view.clone());
        view
    }
}

/// Cheap-to-clone client for the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<Dispatch>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Apply one command and return the view right after it.
    pub async fn send(&self, command: SessionCommand) -> Result<SessionView, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Dispatch {
                command,
                respond_to: tx,
            })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn start(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::Start).await
    }

    pub async fn pause(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn reset_timer(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::ResetTimer).await
    }

    pub async fn skip(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::Skip).await
    }

    pub async fn submit(&self, params: SubmitParams) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::Submit(params)).await
    }

    pub async fn clear_request(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::ClearRequest).await
    }

    pub async fn focus_lost(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::FocusLost).await
    }

    pub async fn focus_gained(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::FocusGained).await
    }

    pub async fn dismiss(&self) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::Dismiss).await
    }

    pub async fn set_focus_alerts(&self, enabled: bool) -> Result<SessionView, SessionError> {
        self.send(SessionCommand::SetFocusAlerts(enabled)).await
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
