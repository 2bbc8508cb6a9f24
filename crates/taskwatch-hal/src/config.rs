//! Configuration types for the simulated hardware timer.

use crate::error::{TimerError, TimerResult};

/// Shortest refresh window accepted, in milliseconds.
pub const MIN_WINDOW_MS: u32 = 1;

/// Longest refresh window accepted, in milliseconds.
pub const MAX_WINDOW_MS: u32 = 60_000;

/// Hardware timer configuration.
///
/// Contains only primitive types and requires no heap allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TimerConfig {
    /// Refresh window in milliseconds. The timer expires when it is not
    /// kicked for longer than this.
    ///
    /// Default: 100ms.
    pub window_ms: u32,

    /// Whether the peripheral raises an early-warning interrupt before the
    /// reset. When false, the pre-reset hook is never invoked.
    ///
    /// Default: true.
    pub pre_reset_interrupt: bool,
}

impl TimerConfig {
    /// Create a new configuration with the specified refresh window.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_ms` is outside
    /// [`MIN_WINDOW_MS`]..=[`MAX_WINDOW_MS`].
    pub fn new(window_ms: u32) -> TimerResult<Self> {
        let config = Self {
            window_ms,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> TimerConfigBuilder {
        TimerConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> TimerResult<()> {
        if !(MIN_WINDOW_MS..=MAX_WINDOW_MS).contains(&self.window_ms) {
            return Err(TimerError::invalid_configuration(
                "window_ms must be between 1 and 60000",
            ));
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            window_ms: 100,
            pre_reset_interrupt: true,
        }
    }
}

/// Builder for `TimerConfig`.
#[derive(Debug, Default)]
pub struct TimerConfigBuilder {
    config: TimerConfig,
}

impl TimerConfigBuilder {
    /// Set the refresh window in milliseconds.
    #[must_use]
    pub fn window_ms(mut self, ms: u32) -> Self {
        self.config.window_ms = ms;
        self
    }

    /// Enable or disable the early-warning interrupt.
    #[must_use]
    pub fn pre_reset_interrupt(mut self, enabled: bool) -> Self {
        self.config.pre_reset_interrupt = enabled;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> TimerResult<TimerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TimerConfig::default();
        assert_eq!(config.window_ms, 100);
        assert!(config.pre_reset_interrupt);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_bounds() {
        assert!(TimerConfig::new(0).is_err());
        assert!(TimerConfig::new(MAX_WINDOW_MS + 1).is_err());
        assert!(TimerConfig::new(MIN_WINDOW_MS).is_ok());
        assert!(TimerConfig::new(MAX_WINDOW_MS).is_ok());
    }

    #[test]
    fn test_config_builder() {
        let result = TimerConfig::builder()
            .window_ms(250)
            .pre_reset_interrupt(false)
            .build();
        assert_eq!(
            result,
            Ok(TimerConfig {
                window_ms: 250,
                pre_reset_interrupt: false,
            })
        );
    }
}
