//! # regview Utilities
//!
//! Shared logging and configuration for regview.
//!
//! This crate provides common functionality used across the regview workspace:
//! logging built on `tracing` and the environment-driven view configuration.

pub mod config;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigError, HexCase, ViewConfig};
pub use logging::{init_logging, init_logging_for_tui, init_logging_with_level, LogFormat, LogGuard, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
