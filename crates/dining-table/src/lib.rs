//! # Dining Table
//!
//! Runs philosophers against a [`dining_monitor::Monitor`]: loads the
//! table configuration, spawns one thread per philosopher, and reports
//! what each of them managed to do.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dining_table::{Dinner, TableConfig};
//!
//! let config = TableConfig::load("dinner.json")?;
//! let report = Dinner::new(config)?.run()?;
//! println!("{report}");
//! # Ok::<(), dining_table::TableError>(())
//! ```

mod config;
mod dinner;
mod error;
mod report;

pub use config::{DinnerConfig, TableConfig};
pub use dinner::Dinner;
pub use error::TableError;
pub use report::{DinnerReport, PhilosopherReport};

// Re-export monitor types for convenience
pub use dining_monitor::{Monitor, MonitorConfig, MonitorStatus, Phase};

/// Result type for dinner operations.
pub type Result<T> = std::result::Result<T, TableError>;
