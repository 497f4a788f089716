//! Passive desktop alerts.
//!
//! Alerts are best effort: callers log failures and move on.

use crate::error::AlertError;

pub trait AlertChannel: Send {
    /// Ask once whether alerts may be shown. Must not block on the user.
    fn request_permission(&mut self) -> Result<(), AlertError>;

    fn raise(&self, title: &str, body: &str) -> Result<(), AlertError>;
}

/// Desktop notifications through the platform notification daemon.
#[derive(Debug, Clone)]
pub struct DesktopAlert {
    appname: String,
}

impl DesktopAlert {
    pub fn new(appname: impl Into<String>) -> Self {
        Self {
            appname: appname.into(),
        }
    }
}

impl Default for DesktopAlert {
    fn default() -> Self {
        Self::new("precis")
    }
}

impl AlertChannel for DesktopAlert {
    #[cfg(all(unix, not(target_os = "macos")))]
    fn request_permission(&mut self) -> Result<(), AlertError> {
        // No permission prompt on freedesktop; a reachable daemon is the grant.
        notify_rust::get_server_information()
            .map(|_| ())
            .map_err(|e| AlertError::Unavailable(e.to_string()))
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn request_permission(&mut self) -> Result<(), AlertError> {
        Ok(())
    }

    fn raise(&self, title: &str, body: &str) -> Result<(), AlertError> {
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .appname(&self.appname)
            .show()
            .map(|_| ())
            .map_err(|e| AlertError::Unavailable(e.to_string()))
    }
}

/// Used when desktop alerts are switched off in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAlert;

impl AlertChannel for SilentAlert {
    fn request_permission(&mut self) -> Result<(), AlertError> {
        Err(AlertError::PermissionDenied)
    }

    fn raise(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
        Err(AlertError::PermissionDenied)
    }
}
