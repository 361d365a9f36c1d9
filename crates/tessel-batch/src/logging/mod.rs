//! Logging utilities.
//!
//! The backend reports through the `log` facade only. Hosts that do not bring
//! their own logger can call [`init_logging`] early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
