//! Error types for hardware timer operations.

use alloc::string::String;

/// Errors reported by a [`HardwareTimer`](crate::HardwareTimer) driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer has not been initialized.
    NotInitialized,
    /// The timer is already initialized.
    AlreadyInitialized,
    /// The timer is not running, so it cannot be kicked.
    NotRunning,
    /// The timer window elapsed without a kick; the reset is pending.
    Expired,
    /// Peripheral or register access failed.
    HardwareError(String),
    /// Invalid configuration.
    InvalidConfiguration(String),
    /// State transition not allowed.
    InvalidTransition {
        /// Current state.
        from: &'static str,
        /// Attempted target state.
        to: &'static str,
    },
}

impl TimerError {
    /// Create a hardware error.
    #[must_use]
    pub fn hardware_error(msg: impl Into<String>) -> Self {
        Self::HardwareError(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an invalid transition error.
    #[must_use]
    pub fn invalid_transition(from: &'static str, to: &'static str) -> Self {
        Self::InvalidTransition { from, to }
    }
}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "Timer is not initialized"),
            Self::AlreadyInitialized => write!(f, "Timer is already initialized"),
            Self::NotRunning => write!(f, "Timer is not running"),
            Self::Expired => write!(f, "Timer window expired"),
            Self::HardwareError(msg) => write!(f, "Hardware error: {msg}"),
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {msg}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "Invalid state transition: {from} -> {to}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}

/// A specialized `Result` type for hardware timer operations.
pub type TimerResult<T> = core::result::Result<T, TimerError>;
