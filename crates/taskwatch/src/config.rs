//! Monitor configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{WdtError, WdtResult};
use crate::registry::TaskTable;

/// Shortest task timeout accepted by default.
pub const DEFAULT_MIN_TIMEOUT_MS: u32 = 10;

/// Longest task timeout accepted by default (one hour).
pub const DEFAULT_MAX_TIMEOUT_MS: u32 = 3_600_000;

/// Configuration for a [`LivenessMonitor`](crate::LivenessMonitor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Minimum spacing between hardware refreshes (milliseconds).
    pub kick_period_ms: u32,
    /// How long report paths wait for the statistics lock.
    pub lock_timeout: Duration,
    /// Lower bound for task timeouts (milliseconds).
    pub min_timeout_ms: u32,
    /// Upper bound for task timeouts (milliseconds).
    pub max_timeout_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            kick_period_ms: 10,
            lock_timeout: Duration::from_millis(5),
            min_timeout_ms: DEFAULT_MIN_TIMEOUT_MS,
            max_timeout_ms: DEFAULT_MAX_TIMEOUT_MS,
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> WdtResult<()> {
        if self.kick_period_ms == 0 {
            return Err(WdtError::invalid_configuration(
                "kick_period_ms must be greater than 0",
            ));
        }
        if self.lock_timeout.is_zero() {
            return Err(WdtError::invalid_configuration(
                "lock_timeout must be greater than 0",
            ));
        }
        if self.min_timeout_ms == 0 {
            return Err(WdtError::invalid_configuration(
                "min_timeout_ms must be greater than 0",
            ));
        }
        if self.min_timeout_ms > self.max_timeout_ms {
            return Err(WdtError::invalid_configuration(format!(
                "min_timeout_ms ({}) exceeds max_timeout_ms ({})",
                self.min_timeout_ms, self.max_timeout_ms
            )));
        }
        Ok(())
    }

    /// Check a task table against this configuration.
    ///
    /// Names must be non-empty and unique, and every timeout must lie in
    /// `[min_timeout_ms, max_timeout_ms]`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTaskTable` for an empty table, `InvalidConfiguration`
    /// naming the first offending task otherwise.
    pub fn validate_table(&self, table: &TaskTable) -> WdtResult<()> {
        if table.is_empty() {
            return Err(WdtError::EmptyTaskTable);
        }

        let mut seen = HashSet::with_capacity(table.len());
        for (id, task) in table.iter() {
            if task.name.is_empty() {
                return Err(WdtError::invalid_configuration(format!(
                    "{id} has an empty name"
                )));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(WdtError::invalid_configuration(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
            if !(self.min_timeout_ms..=self.max_timeout_ms).contains(&task.timeout_ms) {
                return Err(WdtError::invalid_configuration(format!(
                    "task '{}' timeout {}ms outside [{}, {}]",
                    task.name, task.timeout_ms, self.min_timeout_ms, self.max_timeout_ms
                )));
            }
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }
}

/// Builder for `MonitorConfig`.
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Set the minimum spacing between refreshes in milliseconds.
    #[must_use]
    pub fn kick_period_ms(mut self, ms: u32) -> Self {
        self.config.kick_period_ms = ms;
        self
    }

    /// Set the statistics lock timeout.
    #[must_use]
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Set the accepted task timeout range in milliseconds.
    #[must_use]
    pub fn timeout_range_ms(mut self, min_ms: u32, max_ms: u32) -> Self {
        self.config.min_timeout_ms = min_ms;
        self.config.max_timeout_ms = max_ms;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WdtResult<MonitorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
