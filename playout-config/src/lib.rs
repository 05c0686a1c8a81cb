//! Configuration for the playout engine.
//!
//! [`SchedulingConfig`] is read from a TOML or JSON file, inline JSON in the
//! environment, or a default file in the working directory, and converts to
//! the core's [`BuilderSettings`](playout_core::BuilderSettings).
//! [`logging::init_tracing`] installs the process-wide subscriber.

pub mod error;
pub mod logging;
pub mod scheduling;

use std::path::PathBuf;

pub use error::ConfigError;
pub use logging::{LoggingConfig, init_tracing};
pub use scheduling::{SchedulingConfig, SchedulingConfigSource};

/// Loads `.env` from the working directory or its parents, returning the
/// file that was read.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}
