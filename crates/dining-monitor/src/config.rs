//! Monitor configuration.

use serde::{Deserialize, Serialize};

/// Default number of denied admissions tolerated before promotion.
pub const DEFAULT_STARVE_LIMIT: u32 = 2;

/// Configuration for [`Monitor`](crate::Monitor).
///
/// # Example
///
/// ```rust
/// use dining_monitor::MonitorConfig;
///
/// let config = MonitorConfig::new().with_starve_limit(4);
/// assert_eq!(config.starve_limit, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// A philosopher whose starve counter exceeds this value is promoted
    /// to `Starving`.
    pub starve_limit: u32,
}

impl MonitorConfig {
    /// Creates a config with the default starvation limit of 2.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            starve_limit: DEFAULT_STARVE_LIMIT,
        }
    }

    /// Sets the starvation limit.
    #[must_use]
    pub const fn with_starve_limit(mut self, limit: u32) -> Self {
        self.starve_limit = limit;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        assert_eq!(MonitorConfig::default().starve_limit, 2);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::new());

        let config: MonitorConfig = serde_json::from_str(r#"{"starve_limit": 7}"#).unwrap();
        assert_eq!(config.starve_limit, 7);
    }
}
