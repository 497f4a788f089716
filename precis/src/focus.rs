//! Away-from-task detection.
//!
//! Focus loss shows a banner immediately and bumps the away counter. Focus
//! regain only schedules the banner to hide after a debounce delay; the
//! session delivers that delay back as [`FocusMonitor::on_clear_due`] with the
//! token it was given. Any later focus event invalidates outstanding tokens.

use std::time::Duration;

use chrono::{DateTime, Local};
use precis_ipc::FocusStatus;
use tracing::{debug, info};

use crate::alert::AlertChannel;

pub const ALERT_TITLE: &str = "Focus mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permission {
    NotRequested,
    Granted,
    Denied,
}

/// Identifies one scheduled banner clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearToken(u64);

pub struct FocusMonitor {
    enabled: bool,
    away_count: u32,
    banner_visible: bool,
    last_away_at: Option<DateTime<Local>>,
    generation: u64,
    debounce: Duration,
    message: String,
    permission: Permission,
    channel: Box<dyn AlertChannel>,
}

impl FocusMonitor {
    pub fn new(
        enabled: bool,
        debounce: Duration,
        message: impl Into<String>,
        channel: Box<dyn AlertChannel>,
    ) -> Self {
        let mut monitor = Self {
            enabled,
            away_count: 0,
            banner_visible: false,
            last_away_at: None,
            generation: 0,
            debounce,
            message: message.into(),
            permission: Permission::NotRequested,
            channel,
        };
        if enabled {
            monitor.request_permission_once();
        }
        monitor
    }

    pub fn away_count(&self) -> u32 {
        self.away_count
    }

    pub fn banner_visible(&self) -> bool {
        self.banner_visible
    }

    pub fn last_away_at(&self) -> Option<DateTime<Local>> {
        self.last_away_at
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn status(&self) -> FocusStatus {
        FocusStatus {
            enabled: self.enabled,
            away_count: self.away_count,
            banner_visible: self.banner_visible,
        }
    }

    /// Returns false when the monitor is disabled and the event was dropped.
    pub fn on_focus_lost(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.away_count = self.away_count.saturating_add(1);
        self.banner_visible = true;
        self.last_away_at = Some(Local::now());
        self.generation += 1;
        info!(away_count = self.away_count, "Focus lost");
        let message = self.message.clone();
        self.notify(ALERT_TITLE, &message);
        true
    }

    /// Returns the token to deliver back after [`Self::debounce`], if the
    /// banner needs hiding.
    pub fn on_focus_gained(&mut self) -> Option<ClearToken> {
        if !self.enabled || !self.banner_visible {
            return None;
        }
        self.generation += 1;
        Some(ClearToken(self.generation))
    }

    pub fn on_clear_due(&mut self, token: ClearToken) -> bool {
        if token.0 != self.generation || !self.banner_visible {
            debug!(?token, current = self.generation, "Superseded banner clear");
            return false;
        }
        self.banner_visible = false;
        true
    }

    pub fn dismiss(&mut self) {
        self.banner_visible = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.request_permission_once();
        } else {
            self.banner_visible = false;
            self.generation += 1;
        }
    }

    /// Raise a passive alert if permission was granted. Failures are dropped.
    pub fn notify(&self, title: &str, body: &str) {
        if self.permission != Permission::Granted {
            return;
        }
        if let Err(e) = self.channel.raise(title, body) {
            debug!(error = %e, "Alert not shown");
        }
    }

    fn request_permission_once(&mut self) {
        if self.permission != Permission::NotRequested {
            return;
        }
        self.permission = match self.channel.request_permission() {
            Ok(()) => Permission::Granted,
            Err(e) => {
                debug!(error = %e, "Desktop alerts unavailable");
                Permission::Denied
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlertError;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorded {
        permission_requests: u32,
        raised: Vec<(String, String)>,
    }

    struct FakeChannel {
        grant: bool,
        fail_raise: bool,
        log: Arc<Mutex<Recorded>>,
    }

    impl AlertChannel for FakeChannel {
        fn request_permission(&mut self) -> Result<(), AlertError> {
            self.log.lock().unwrap().permission_requests += 1;
            if self.grant {
                Ok(())
            } else {
                Err(AlertError::PermissionDenied)
            }
        }

        fn raise(&self, title: &str, body: &str) -> Result<(), AlertError> {
            if self.fail_raise {
                return Err(AlertError::Unavailable("no daemon".to_string()));
            }
            self.log
                .lock()
                .unwrap()
                .raised
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn monitor(enabled: bool, grant: bool) -> (FocusMonitor, Arc<Mutex<Recorded>>) {
        let log = Arc::new(Mutex::new(Recorded::default()));
        let channel = FakeChannel {
            grant,
            fail_raise: false,
            log: log.clone(),
        };
        let monitor = FocusMonitor::new(
            enabled,
            Duration::from_millis(300),
            "stay on task",
            Box::new(channel),
        );
        (monitor, log)
    }

    #[test]
    fn focus_loss_counts_and_shows_banner() {
        let (mut m, log) = monitor(true, true);
        assert!(m.on_focus_lost());
        assert_eq!(m.away_count(), 1);
        assert!(m.banner_visible());
        assert!(m.last_away_at().is_some());
        assert_eq!(
            log.lock().unwrap().raised,
            vec![(ALERT_TITLE.to_string(), "stay on task".to_string())]
        );
    }

    #[test]
    fn burst_of_losses_counts_each_one() {
        let (mut m, _) = monitor(true, true);
        m.on_focus_lost();
        m.on_focus_gained();
        m.on_focus_lost();
        m.on_focus_gained();
        m.on_focus_lost();
        assert_eq!(m.away_count(), 3);
    }

    #[test]
    fn clear_only_applies_for_latest_regain() {
        let (mut m, _) = monitor(true, true);
        m.on_focus_lost();
        let stale = m.on_focus_gained().unwrap();
        m.on_focus_lost();
        assert!(!m.on_clear_due(stale));
        assert!(m.banner_visible());

        let fresh = m.on_focus_gained().unwrap();
        assert!(m.on_clear_due(fresh));
        assert!(!m.banner_visible());
    }

    #[test]
    fn dismiss_hides_immediately_and_keeps_count() {
        let (mut m, _) = monitor(true, true);
        m.on_focus_lost();
        m.on_focus_lost();
        m.dismiss();
        assert!(!m.banner_visible());
        assert_eq!(m.away_count(), 2);
        assert_eq!(m.on_focus_gained(), None);
    }

    #[test]
    fn permission_is_requested_once() {
        let (mut m, log) = monitor(true, true);
        m.set_enabled(false);
        m.set_enabled(true);
        assert_eq!(log.lock().unwrap().permission_requests, 1);
    }

    #[test]
    fn disabled_monitor_ignores_events_and_never_asks() {
        let (mut m, log) = monitor(false, true);
        assert!(!m.on_focus_lost());
        assert_eq!(m.away_count(), 0);
        assert!(!m.banner_visible());
        assert_eq!(log.lock().unwrap().permission_requests, 0);
    }

    #[test]
    fn denied_permission_still_tracks_focus() {
        let (mut m, log) = monitor(true, false);
        m.on_focus_lost();
        assert_eq!(m.away_count(), 1);
        assert!(m.banner_visible());
        assert!(log.lock().unwrap().raised.is_empty());
    }

    #[test]
    fn failing_channel_is_ignored() {
        let log = Arc::new(Mutex::new(Recorded::default()));
        let channel = FakeChannel {
            grant: true,
            fail_raise: true,
            log,
        };
        let mut m = FocusMonitor::new(true, Duration::from_millis(300), "x", Box::new(channel));
        assert!(m.on_focus_lost());
        assert!(m.banner_visible());
    }
}
