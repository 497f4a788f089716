//! Work/break countdown engine.
//!
//! The engine is a plain state machine: it owns no clock. The session feeds it
//! one `on_tick()` per second while it is running (see [`Ticker`]).

use std::time::Duration;

use precis_ipc::{Phase, TimerStatus};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::ConfigError;

/// Phase lengths in seconds, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations {
    work_secs: u64,
    break_secs: u64,
}

impl PhaseDurations {
    pub fn from_secs(work_secs: u64, break_secs: u64) -> Result<Self, ConfigError> {
        if work_secs == 0 {
            return Err(ConfigError::NonPositiveDuration { phase: Phase::Work });
        }
        if break_secs == 0 {
            return Err(ConfigError::NonPositiveDuration { phase: Phase::Break });
        }
        Ok(Self {
            work_secs,
            break_secs,
        })
    }

    pub fn from_minutes(work_minutes: u64, break_minutes: u64) -> Result<Self, ConfigError> {
        Self::from_secs(
            work_minutes.saturating_mul(60),
            break_minutes.saturating_mul(60),
        )
    }

    pub fn of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::Break => self.break_secs,
        }
    }
}

/// What a transition did, for logging and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started { phase: Phase },
    Paused { remaining: u64 },
    Reset { phase: Phase },
    Skipped { from: Phase, to: Phase },
    PhaseCompleted { finished: Phase, next: Phase },
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    durations: PhaseDurations,
    phase: Phase,
    remaining: u64,
    running: bool,
}

impl TimerEngine {
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            durations,
            phase: Phase::Work,
            remaining: durations.of(Phase::Work),
            running: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    pub fn total(&self) -> u64 {
        self.durations.of(self.phase)
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self) -> f64 {
        let total = self.total() as f64;
        if total > 0.0 {
            (1.0 - self.remaining as f64 / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            phase: self.phase,
            remaining: self.remaining,
            total: self.total(),
            running: self.running,
        }
    }

    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        self.running = true;
        Some(TimerEvent::Started { phase: self.phase })
    }

    pub fn pause(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(TimerEvent::Paused {
            remaining: self.remaining,
        })
    }

    pub fn reset(&mut self) -> TimerEvent {
        self.running = false;
        self.remaining = self.total();
        TimerEvent::Reset { phase: self.phase }
    }

    pub fn skip(&mut self) -> TimerEvent {
        let from = self.phase;
        self.switch_phase();
        TimerEvent::Skipped {
            from,
            to: self.phase,
        }
    }

    /// One second elapsed. Ignored while paused.
    pub fn on_tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }
        let finished = self.phase;
        self.switch_phase();
        Some(TimerEvent::PhaseCompleted {
            finished,
            next: self.phase,
        })
    }

    fn switch_phase(&mut self) {
        self.running = false;
        self.phase = self.phase.other();
        self.remaining = self.total();
    }
}

/// `mm:ss`, minutes unbounded.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// The session's clock source: a one-second interval task.
///
/// Every pulse carries the ticker's generation so pulses still queued after
/// the ticker was released can be told apart. Dropping the ticker stops it.
#[derive(Debug)]
pub struct Ticker {
    generation: u64,
    task: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn<T, F>(
        generation: u64,
        period: Duration,
        sender: mpsc::UnboundedSender<T>,
        pulse: F,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn(u64) -> T + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if sender.send(pulse(generation)).is_err() {
                    break;
                }
            }
        });
        Self { generation, task }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.task.abort();
    }
}
