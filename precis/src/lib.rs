//! precis - a summarizer session with a work/break timer and an away-from-task
//! monitor.
//!
//! The three engines ([`timer`], [`request`], [`focus`]) are plain state
//! machines. [`session`] runs them inside one actor task and publishes a
//! consolidated view; everything else here is an outer layer around it.

pub mod alert;
pub mod config;
pub mod error;
pub mod focus;
pub mod ipc;
pub mod logging;
pub mod notes;
pub mod request;
pub mod session;
pub mod summarizer;
pub mod timer;

pub use session::{spawn_session, SessionCommand, SessionHandle, SessionSettings, SessionView};
