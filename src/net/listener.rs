//! TCP accept pipeline wired to the admission gates.
//!
//! # Responsibilities
//! - Bind with the configured connection backlog
//! - Hold an accept-gate permit for every in-flight accept
//! - Admit accepted connections through the request gate before hand-off
//! - Apply per-connection timeouts before request processing sees the socket
//!
//! # Design Decisions
//! - Binding validates settings first; a server with an invalid limit
//!   refuses to start
//! - The accept gate and request gate are independent: enough accepts stay
//!   outstanding to keep up with the kernel queue while request processing
//!   is capped separately
//! - Request admission is represented by a permit the caller holds for the
//!   life of the request; dropping it (even on panic) frees the slot

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::{ServerSettings, SettingsError};
use crate::throttle::{AdmissionGate, AdmissionPermit};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Settings failed validation; the server must not start.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
    /// Failed to bind or listen on the address.
    #[error("failed to bind: {0}")]
    Bind(std::io::Error),
    /// Failed to accept a connection.
    #[error("failed to accept: {0}")]
    Accept(std::io::Error),
    /// Failed to apply per-connection timeouts.
    #[error("failed to configure socket: {0}")]
    Configure(std::io::Error),
}

/// An accepted connection admitted to the request pipeline.
#[derive(Debug)]
pub struct Inbound {
    pub stream: TcpStream,
    pub peer_addr: SocketAddr,
    /// Request-pipeline slot; hold for the duration of request processing.
    pub permit: AdmissionPermit,
}

/// A TCP listener whose accept and request pipelines are both admission
/// controlled.
///
/// Callers run [`accept`](Self::accept) from as many tasks as they want
/// accepts outstanding; the accept gate caps how many of those are in
/// flight at once, and the request gate caps how many accepted connections
/// are simultaneously handed to request processing.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    settings: ServerSettings,
    accept_gate: AdmissionGate,
    request_gate: AdmissionGate,
}

impl Listener {
    /// Validate settings and bind, requesting the configured backlog.
    pub fn bind(addr: SocketAddr, settings: ServerSettings) -> Result<Self, ListenerError> {
        settings.validate()?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;
        let inner = socket
            .listen(u32::from(settings.max_connection_backlog()))
            .map_err(ListenerError::Bind)?;

        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %local_addr,
            max_outstanding_accepts = settings.max_outstanding_accepts(),
            max_connection_backlog = settings.max_connection_backlog(),
            throttled = settings.is_throttled(),
            "listener bound"
        );

        let accept_gate = settings.create_accept_gate();
        let request_gate = settings.create_request_gate();
        Ok(Self {
            inner,
            settings,
            accept_gate,
            request_gate,
        })
    }

    /// Accept one connection and admit it to the request pipeline.
    ///
    /// Waits for an accept-gate permit before issuing the accept and
    /// releases it as soon as the accept completes; then waits for a
    /// request-gate permit, applies the configured socket timeouts, and
    /// returns the connection with its permit.
    pub async fn accept(&self) -> Result<Inbound, ListenerError> {
        let accept_permit = self.accept_gate.acquire().await;
        let (stream, peer_addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        // The accept has completed; free its slot before queueing for
        // request admission so other accepts can stay outstanding.
        drop(accept_permit);

        let permit = self.request_gate.acquire().await;
        let stream = self.apply_timeouts(stream)?;

        tracing::debug!(
            peer_addr = %peer_addr,
            accept_slots = ?self.accept_gate.available(),
            request_slots = ?self.request_gate.available(),
            "connection admitted"
        );

        Ok(Inbound {
            stream,
            peer_addr,
            permit,
        })
    }

    // Timeout options live on the std handle, so round-trip through it.
    fn apply_timeouts(&self, stream: TcpStream) -> Result<TcpStream, ListenerError> {
        if self.settings.receive_timeout().is_none() && self.settings.send_timeout().is_none() {
            return Ok(stream);
        }
        let std_stream = stream.into_std().map_err(ListenerError::Configure)?;
        self.settings
            .configure_socket(&std_stream)
            .map_err(ListenerError::Configure)?;
        TcpStream::from_std(std_stream).map_err(ListenerError::Configure)
    }

    /// The local address this listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Settings this listener was started with.
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Accept-gate slots currently free.
    pub fn available_accept_slots(&self) -> usize {
        // The accept gate is always bounded.
        self.accept_gate.available().unwrap_or(usize::MAX)
    }

    /// Request-gate slots currently free, or `None` when unthrottled.
    pub fn available_request_slots(&self) -> Option<usize> {
        self.request_gate.available()
    }
}
