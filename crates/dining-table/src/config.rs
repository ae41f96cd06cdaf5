//! Configuration types for a dinner.

use std::path::Path;

use dining_monitor::MonitorConfig;
use serde::{Deserialize, Serialize};

use crate::{Result, TableError};

/// Configuration for a whole dinner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of philosophers (and chopsticks) at the table.
    pub philosophers: usize,

    /// Monitor configuration.
    pub monitor: MonitorConfig,

    /// Philosopher behaviour.
    pub dinner: DinnerConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            philosophers: 4,
            monitor: MonitorConfig::default(),
            dinner: DinnerConfig::default(),
        }
    }
}

impl TableConfig {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`TableError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.philosophers == 0 {
            return Err(TableError::Config(
                "philosophers must be at least 1".to_string(),
            ));
        }
        let p = self.dinner.talk_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(TableError::Config(format!(
                "dinner.talk_probability must be within 0.0..=1.0, got {p}"
            )));
        }
        if self.dinner.deadline_ms == Some(0) {
            return Err(TableError::Config(
                "dinner.deadline_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What each philosopher does during the dinner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DinnerConfig {
    /// Think/eat/talk rounds per philosopher.
    pub rounds: usize,

    /// Upper bound of a random thinking pause, in milliseconds.
    pub think_ms: u64,

    /// Upper bound of a random eating pause, in milliseconds.
    pub eat_ms: u64,

    /// Upper bound of a random talking pause, in milliseconds.
    pub talk_ms: u64,

    /// Chance of asking to talk after each meal.
    pub talk_probability: f64,

    /// Seed for the pauses and talk decisions. Random when unset.
    pub seed: Option<u64>,

    /// Interrupt everyone still at the table after this long.
    pub deadline_ms: Option<u64>,
}

impl Default for DinnerConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            think_ms: 20,
            eat_ms: 20,
            talk_ms: 10,
            talk_probability: 0.5,
            seed: None,
            deadline_ms: None,
        }
    }
}
