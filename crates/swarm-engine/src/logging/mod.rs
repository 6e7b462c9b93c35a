//! Logging utilities.
//!
//! Everything in the engine reports through the `log` facade; this module only
//! installs the `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
