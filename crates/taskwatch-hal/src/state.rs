//! Timer state machine and metrics.
//!
//! All transitions are compare-and-swap on a single atomic, so the state can
//! be shared between the poll context (which kicks) and the context that
//! observes the expiry.

use portable_atomic::{AtomicU32, Ordering};

use crate::error::TimerError;

/// Hardware timer operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum TimerStatus {
    /// Peripheral not configured.
    #[default]
    Uninitialized = 0,
    /// Peripheral configured, countdown not running.
    Initialized = 1,
    /// Countdown running; kicks reload it.
    Running = 2,
    /// Countdown reached zero; the system reset is pending.
    Expired = 3,
}

impl TimerStatus {
    /// Convert from raw u32 value.
    #[must_use]
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Initialized),
            2 => Some(Self::Running),
            3 => Some(Self::Expired),
            _ => None,
        }
    }

    /// Convert to raw u32 value.
    #[must_use]
    pub fn to_raw(self) -> u32 {
        self as u32
    }

    /// Terminal states cannot be left without `deinit()`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Get the status as a string slice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Initialized => "Initialized",
            Self::Running => "Running",
            Self::Expired => "Expired",
        }
    }
}

impl core::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Atomic timer state with transition counters.
///
/// # Real-Time Safety
///
/// Lock-free, allocation-free, bounded.
///
/// # Transitions
///
/// ```text
/// Uninitialized ──init()──► Initialized ──start()──► Running ──expire()──► Expired
///       ▲                                              │ ▲
///       │                                     start()  └─┘ (restart)
///       └────────────── deinit() from any other state ─────────────────────┘
/// ```
#[derive(Debug)]
#[repr(C)]
pub struct TimerState {
    status: AtomicU32,
    start_count: AtomicU32,
    kick_count: AtomicU32,
    expiry_count: AtomicU32,
}

impl TimerState {
    /// Create a new state in the `Uninitialized` status.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: AtomicU32::new(TimerStatus::Uninitialized as u32),
            start_count: AtomicU32::new(0),
            kick_count: AtomicU32::new(0),
            expiry_count: AtomicU32::new(0),
        }
    }

    /// Get the current status.
    #[must_use]
    pub fn status(&self) -> TimerStatus {
        let raw = self.status.load(Ordering::Acquire);
        TimerStatus::from_raw(raw).unwrap_or_default()
    }

    fn transition(&self, from: TimerStatus, to: TimerStatus) -> Result<(), TimerError> {
        self.status
            .compare_exchange(from.to_raw(), to.to_raw(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| {
                let current = TimerStatus::from_raw(current).unwrap_or_default();
                TimerError::invalid_transition(current.as_str(), to.as_str())
            })
    }

    /// `Uninitialized` → `Initialized`.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyInitialized`] from any other state.
    pub fn init(&self) -> Result<(), TimerError> {
        self.transition(TimerStatus::Uninitialized, TimerStatus::Initialized)
            .map_err(|_| TimerError::AlreadyInitialized)
    }

    /// Any initialized state → `Uninitialized`.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotInitialized`] if already uninitialized.
    pub fn deinit(&self) -> Result<(), TimerError> {
        let previous = self
            .status
            .swap(TimerStatus::Uninitialized.to_raw(), Ordering::AcqRel);
        if previous == TimerStatus::Uninitialized.to_raw() {
            Err(TimerError::NotInitialized)
        } else {
            Ok(())
        }
    }

    /// `Initialized` → `Running`, or a restart of `Running`.
    ///
    /// # Errors
    ///
    /// Returns an error from `Uninitialized` or `Expired`.
    pub fn start(&self) -> Result<(), TimerError> {
        match self.status() {
            TimerStatus::Uninitialized => Err(TimerError::NotInitialized),
            TimerStatus::Expired => Err(TimerError::Expired),
            TimerStatus::Running => {
                self.start_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            TimerStatus::Initialized => {
                self.transition(TimerStatus::Initialized, TimerStatus::Running)?;
                self.start_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Record a kick (`Running` only).
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Expired`] after expiry, [`TimerError::NotRunning`]
    /// before `start()`.
    pub fn kick(&self) -> Result<(), TimerError> {
        match self.status() {
            TimerStatus::Running => {
                self.kick_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            TimerStatus::Expired => Err(TimerError::Expired),
            TimerStatus::Initialized => Err(TimerError::NotRunning),
            TimerStatus::Uninitialized => Err(TimerError::NotInitialized),
        }
    }

    /// `Running` → `Expired`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not running.
    pub fn expire(&self) -> Result<(), TimerError> {
        self.transition(TimerStatus::Running, TimerStatus::Expired)?;
        self.expiry_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Snapshot of the transition counters.
    #[must_use]
    pub fn metrics(&self) -> TimerMetrics {
        TimerMetrics {
            start_count: self.start_count.load(Ordering::Acquire),
            kick_count: self.kick_count.load(Ordering::Acquire),
            expiry_count: self.expiry_count.load(Ordering::Acquire),
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter snapshot for a hardware timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerMetrics {
    /// Number of successful `start()` calls, restarts included.
    pub start_count: u32,
    /// Number of accepted kicks.
    pub kick_count: u32,
    /// Number of expiries.
    pub expiry_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_raw_roundtrip() {
        for status in [
            TimerStatus::Uninitialized,
            TimerStatus::Initialized,
            TimerStatus::Running,
            TimerStatus::Expired,
        ] {
            assert_eq!(TimerStatus::from_raw(status.to_raw()), Some(status));
        }
        assert_eq!(TimerStatus::from_raw(42), None);
    }

    #[test]
    fn test_forward_transitions() -> Result<(), TimerError> {
        let state = TimerState::new();
        assert_eq!(state.status(), TimerStatus::Uninitialized);

        state.init()?;
        assert_eq!(state.status(), TimerStatus::Initialized);
        assert_eq!(state.kick(), Err(TimerError::NotRunning));

        state.start()?;
        state.kick()?;
        state.kick()?;
        assert_eq!(state.status(), TimerStatus::Running);
        assert_eq!(state.metrics().kick_count, 2);
        Ok(())
    }

    #[test]
    fn test_double_init_rejected() -> Result<(), TimerError> {
        let state = TimerState::new();
        state.init()?;
        assert_eq!(state.init(), Err(TimerError::AlreadyInitialized));
        Ok(())
    }

    #[test]
    fn test_restart_while_running() -> Result<(), TimerError> {
        let state = TimerState::new();
        state.init()?;
        state.start()?;
        state.start()?;
        assert_eq!(state.status(), TimerStatus::Running);
        assert_eq!(state.metrics().start_count, 2);
        Ok(())
    }

    #[test]
    fn test_expiry_is_terminal_until_deinit() -> Result<(), TimerError> {
        let state = TimerState::new();
        state.init()?;
        state.start()?;
        state.expire()?;

        assert!(state.status().is_terminal());
        assert_eq!(state.kick(), Err(TimerError::Expired));
        assert_eq!(state.start(), Err(TimerError::Expired));
        assert!(state.expire().is_err());
        assert_eq!(state.metrics().expiry_count, 1);

        state.deinit()?;
        assert_eq!(state.status(), TimerStatus::Uninitialized);
        assert_eq!(state.deinit(), Err(TimerError::NotInitialized));
        Ok(())
    }
}
