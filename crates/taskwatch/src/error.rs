//! Error types for the liveness monitor.
//!
//! Every fallible monitor operation returns [`WdtError`]. Errors are grouped
//! into a small [`ErrorKind`] taxonomy so callers can branch on the class of
//! failure without matching every variant.

use std::fmt;
use std::time::Duration;

use taskwatch_hal::TimerError;
use thiserror::Error;

/// Hardware timer primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerOp {
    /// Peripheral bring-up.
    Init,
    /// Peripheral shutdown.
    Deinit,
    /// Countdown start.
    Start,
    /// Countdown refresh.
    Kick,
}

impl fmt::Display for TimerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerOp::Init => "init",
            TimerOp::Deinit => "deinit",
            TimerOp::Start => "start",
            TimerOp::Kick => "kick",
        };
        f.write_str(name)
    }
}

/// Coarse classification of [`WdtError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bring-up failed or the monitor is in the wrong lifecycle state.
    Init,
    /// An operation that needs a running monitor was called before `start`.
    NotStarted,
    /// Task identifier outside the registered table.
    Range,
    /// The statistics lock was not acquired in time.
    Lock,
    /// Configuration rejected by validation.
    Config,
    /// The hardware timer refused a refresh.
    Hardware,
}

/// Errors that can occur during monitor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WdtError {
    /// The monitor has not been initialized.
    #[error("Monitor is not initialized")]
    NotInitialized,

    /// `init` was called on an initialized monitor.
    #[error("Monitor is already initialized")]
    AlreadyInitialized,

    /// The task table has no entries.
    #[error("Task table is empty")]
    EmptyTaskTable,

    /// A hardware timer primitive failed.
    #[error("Hardware timer {op} failed: {source}")]
    Timer {
        /// Primitive that failed.
        op: TimerOp,
        /// Error reported by the timer.
        source: TimerError,
    },

    /// `poll` was called before `start`.
    #[error("Monitor has not been started")]
    NotStarted,

    /// Task identifier out of range.
    #[error("Task id {id} out of range ({count} tasks registered)")]
    OutOfRange {
        /// Offending identifier.
        id: usize,
        /// Number of registered tasks.
        count: usize,
    },

    /// The statistics lock was busy for longer than the configured timeout.
    #[error("Statistics lock not acquired within {0:?}")]
    LockTimeout(Duration),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl WdtError {
    /// Create a timer error for the given primitive.
    #[must_use]
    pub fn timer(op: TimerOp, source: TimerError) -> Self {
        Self::Timer { op, source }
    }

    /// Create an out-of-range error.
    #[must_use]
    pub fn out_of_range(id: usize, count: usize) -> Self {
        Self::OutOfRange { id, count }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            WdtError::NotInitialized | WdtError::AlreadyInitialized | WdtError::EmptyTaskTable => {
                ErrorKind::Init
            }
            WdtError::Timer {
                op: TimerOp::Kick, ..
            } => ErrorKind::Hardware,
            WdtError::Timer { .. } => ErrorKind::Init,
            WdtError::NotStarted => ErrorKind::NotStarted,
            WdtError::OutOfRange { .. } => ErrorKind::Range,
            WdtError::LockTimeout(_) => ErrorKind::Lock,
            WdtError::InvalidConfiguration(_) => ErrorKind::Config,
        }
    }
}

/// A specialized `Result` type for monitor operations.
pub type WdtResult<T> = std::result::Result<T, WdtError>;
