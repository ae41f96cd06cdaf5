//! Error types for running a dinner.

use thiserror::Error;

/// Errors raised while configuring or running a dinner.
#[derive(Debug, Error)]
pub enum TableError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for [`TableConfig`](crate::TableConfig).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The monitor rejected a call. Cancelled waits are handled by the
    /// philosophers and never surface here.
    #[error("Monitor error: {0}")]
    Monitor(#[from] dining_monitor::MonitorError),

    /// A philosopher thread panicked.
    #[error("Philosopher {id} panicked")]
    PhilosopherPanicked {
        /// The philosopher's id.
        id: usize,
    },
}
