//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept gate → accept → request gate)
//!     → socket.rs (per-connection timeouts via ConfigurableSocket)
//!     → Hand off to request processing (outside this crate)
//! ```
//!
//! # Design Decisions
//! - Accept and request concurrency are governed by independent gates
//! - Transport read/write handling is out of scope; this layer stops at
//!   admission and socket configuration

pub mod listener;
pub mod socket;

pub use listener::{Inbound, Listener, ListenerError};
pub use socket::ConfigurableSocket;
