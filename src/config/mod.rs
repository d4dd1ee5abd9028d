//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → ServerSettings::validate() (invariant checks)
//!     → ServerSettings (validated, read-only from here on)
//!     → gates + socket configuration derived from it
//! ```
//!
//! # Design Decisions
//! - Settings are mutable only before the owning server starts; a server
//!   never observes a change after start
//! - Setters fail fast; validate() re-checks everything because the
//!   deserialization path writes fields directly
//! - Validation errors name the offending field and are never clamped

pub mod loader;
pub mod settings;

pub use loader::{load_settings, parse_settings, ConfigError};
pub use settings::{ServerSettings, SettingsError};
