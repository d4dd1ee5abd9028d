//! Admission control core for asynchronous socket servers.
//!
//! Bounds how many accept operations and how many active requests a server
//! permits at once. [`ServerSettings`] carries the validated limits, the
//! [`AdmissionGate`]s enforce them, and [`net::Listener`] shows the two
//! gates wired into an accept pipeline.

pub mod config;
pub mod net;
pub mod observability;
pub mod throttle;

pub use config::{ServerSettings, SettingsError};
pub use net::Listener;
pub use throttle::{AdmissionGate, AdmissionPermit};
