//! Confgate Telemetry - logging setup for the confgate broker.
//!
//! Every other crate only emits through `tracing` macros; the binary calls
//! [`setup_logging`] once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use confgate_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), confgate_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("teloxide=warn");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, setup_default_logging, setup_logging};
