//! Server settings: limits, timeouts, and gate construction.
//!
//! All integer limits must be strictly positive. Setters reject bad values
//! at the point of assignment; `validate()` re-checks everything because
//! deserialization writes fields directly and bypasses the setters.

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::socket::ConfigurableSocket;
use crate::throttle::AdmissionGate;

/// Default number of asynchronous accepts kept in flight.
pub const DEFAULT_MAX_OUTSTANDING_ACCEPTS: u16 = 16;
/// Default OS listen-queue depth requested at bind time.
pub const DEFAULT_MAX_CONNECTION_BACKLOG: u16 = 64;
/// Default cap on concurrently processed requests.
pub const DEFAULT_MAX_ACTIVE_REQUESTS: u16 = 64;
/// Default per-read buffer size in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: u16 = 1024;

/// Sentinel for `max_active_requests` meaning "no request-level limit".
pub const UNBOUNDED: u16 = u16::MAX;

/// A settings field holds a value its invariant forbids.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    InvalidField { field: &'static str },
}

impl SettingsError {
    fn invalid(field: &'static str) -> Self {
        Self::InvalidField { field }
    }
}

/// Validated, immutable-after-validation server configuration.
///
/// Lifecycle: construct with defaults, adjust fields through the setters
/// (or deserialize from a config document), call [`validate`](Self::validate)
/// once, then treat as read-only for the server's lifetime. Servers must not
/// observe changes after start.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    /// Keep this many asynchronous accept calls in flight so that
    /// connection acceptance never becomes the bottleneck.
    max_outstanding_accepts: u16,

    /// Listen-queue depth the OS is asked to maintain for connections not
    /// yet accepted. Platforms may clamp large values on their own.
    max_connection_backlog: u16,

    /// Cap on simultaneously processed requests. [`UNBOUNDED`] disables
    /// request-level admission control.
    max_active_requests: u16,

    /// Buffer size used for each read operation, in bytes.
    read_buffer_size: u16,

    /// Socket send timeout in milliseconds; 0 leaves the platform default.
    send_timeout_ms: u64,

    /// Socket receive timeout in milliseconds; 0 leaves the platform default.
    receive_timeout_ms: u64,

    /// Grace period for closing a socket, in milliseconds; 0 leaves the
    /// platform default.
    socket_close_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_outstanding_accepts: DEFAULT_MAX_OUTSTANDING_ACCEPTS,
            max_connection_backlog: DEFAULT_MAX_CONNECTION_BACKLOG,
            max_active_requests: DEFAULT_MAX_ACTIVE_REQUESTS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            send_timeout_ms: 0,
            receive_timeout_ms: 0,
            socket_close_timeout_ms: 0,
        }
    }
}

impl ServerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_outstanding_accepts(&self) -> u16 {
        self.max_outstanding_accepts
    }

    pub fn set_max_outstanding_accepts(&mut self, value: u16) -> Result<(), SettingsError> {
        if value == 0 {
            return Err(SettingsError::invalid("max_outstanding_accepts"));
        }
        self.max_outstanding_accepts = value;
        Ok(())
    }

    pub fn max_connection_backlog(&self) -> u16 {
        self.max_connection_backlog
    }

    pub fn set_max_connection_backlog(&mut self, value: u16) -> Result<(), SettingsError> {
        if value == 0 {
            return Err(SettingsError::invalid("max_connection_backlog"));
        }
        self.max_connection_backlog = value;
        Ok(())
    }

    pub fn max_active_requests(&self) -> u16 {
        self.max_active_requests
    }

    pub fn set_max_active_requests(&mut self, value: u16) -> Result<(), SettingsError> {
        if value == 0 {
            return Err(SettingsError::invalid("max_active_requests"));
        }
        self.max_active_requests = value;
        Ok(())
    }

    pub fn read_buffer_size(&self) -> u16 {
        self.read_buffer_size
    }

    pub fn set_read_buffer_size(&mut self, value: u16) -> Result<(), SettingsError> {
        if value == 0 {
            return Err(SettingsError::invalid("read_buffer_size"));
        }
        self.read_buffer_size = value;
        Ok(())
    }

    /// Send timeout, or `None` when the platform default applies.
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_ms > 0).then(|| Duration::from_millis(self.send_timeout_ms))
    }

    pub fn set_send_timeout_ms(&mut self, value: u64) {
        self.send_timeout_ms = value;
    }

    /// Receive timeout, or `None` when the platform default applies.
    pub fn receive_timeout(&self) -> Option<Duration> {
        (self.receive_timeout_ms > 0).then(|| Duration::from_millis(self.receive_timeout_ms))
    }

    pub fn set_receive_timeout_ms(&mut self, value: u64) {
        self.receive_timeout_ms = value;
    }

    /// Socket close grace period, or `None` when the platform default applies.
    pub fn socket_close_timeout(&self) -> Option<Duration> {
        (self.socket_close_timeout_ms > 0)
            .then(|| Duration::from_millis(self.socket_close_timeout_ms))
    }

    pub fn set_socket_close_timeout_ms(&mut self, value: u64) {
        self.socket_close_timeout_ms = value;
    }

    /// Whether the request pipeline is subject to admission control.
    ///
    /// True exactly when `max_active_requests` is finite, i.e. strictly
    /// below [`UNBOUNDED`]. Not independently settable.
    pub fn is_throttled(&self) -> bool {
        self.max_active_requests > 0 && self.max_active_requests < UNBOUNDED
    }

    /// Re-check every positive-integer invariant.
    ///
    /// Deserialization writes fields without going through the setters, so
    /// this must be called before the owning server starts. The error names
    /// the offending field; nothing is ever clamped or silently defaulted.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_outstanding_accepts == 0 {
            return Err(SettingsError::invalid("max_outstanding_accepts"));
        }
        if self.max_connection_backlog == 0 {
            return Err(SettingsError::invalid("max_connection_backlog"));
        }
        if self.max_active_requests == 0 {
            return Err(SettingsError::invalid("max_active_requests"));
        }
        if self.read_buffer_size == 0 {
            return Err(SettingsError::invalid("read_buffer_size"));
        }
        Ok(())
    }

    /// Apply receive/send timeouts to one connection.
    ///
    /// Each timeout is applied independently and only when configured to a
    /// nonzero value; otherwise the platform default is left untouched.
    /// This is the only place settings touch a live connection.
    pub fn configure_socket<S: ConfigurableSocket>(&self, socket: &S) -> io::Result<()> {
        if let Some(timeout) = self.receive_timeout() {
            socket.set_receive_timeout(timeout)?;
        }
        if let Some(timeout) = self.send_timeout() {
            socket.set_send_timeout(timeout)?;
        }
        Ok(())
    }

    /// Gate for the accept pipeline: always bounded.
    ///
    /// An unthrottled accept pipeline can starve the process of file
    /// descriptors and memory, so there is no unbounded variant here.
    pub fn create_accept_gate(&self) -> AdmissionGate {
        AdmissionGate::bounded(usize::from(self.max_outstanding_accepts))
    }

    /// Gate for the request pipeline: bounded while throttled, otherwise a
    /// pass-through. Operators opt out of request-level admission control by
    /// setting `max_active_requests` to [`UNBOUNDED`].
    pub fn create_request_gate(&self) -> AdmissionGate {
        if self.is_throttled() {
            AdmissionGate::bounded(usize::from(self.max_active_requests))
        } else {
            AdmissionGate::unbounded()
        }
    }
}
