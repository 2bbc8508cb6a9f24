//! Simulated hardware timer.
//!
//! `SoftwareTimer` behaves like an independent watchdog peripheral: it has
//! its own refresh window, tracks the last kick against a [`TickSource`] and
//! expires when that window is exceeded. It stands in for real hardware on
//! hosts, in simulation and in tests.

use portable_atomic::{AtomicU32, Ordering};

use crate::clock::TickSource;
use crate::config::TimerConfig;
use crate::error::{TimerError, TimerResult};
use crate::state::{TimerMetrics, TimerState, TimerStatus};
use crate::timer::{HardwareTimer, PreResetHook};

/// Software-based hardware timer.
///
/// Expiry is detected by [`check_expiry`](Self::check_expiry), which plays
/// the role of the peripheral's countdown interrupt. On the first detected
/// expiry the pre-reset hook runs (if registered and the config enables the
/// early-warning interrupt).
///
/// # Example
///
/// ```rust
/// use taskwatch_hal::{HardwareTimer, ManualTick, SoftwareTimer, TimerConfig};
///
/// let clock = ManualTick::new(0);
/// let mut timer = SoftwareTimer::new(TimerConfig::default(), &clock);
///
/// timer.init().expect("init");
/// timer.start().expect("start");
/// timer.kick().expect("kick");
/// assert!(!timer.check_expiry());
/// ```
pub struct SoftwareTimer<C> {
    config: TimerConfig,
    clock: C,
    state: TimerState,
    last_kick_ms: AtomicU32,
    pre_reset: Option<PreResetHook>,
}

impl<C: TickSource> SoftwareTimer<C> {
    /// Create a new software timer reading time from `clock`.
    #[must_use]
    pub fn new(config: TimerConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            state: TimerState::new(),
            last_kick_ms: AtomicU32::new(0),
            pre_reset: None,
        }
    }

    /// Create a new software timer with a refresh window in milliseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the window is outside the valid range.
    pub fn with_window(window_ms: u32, clock: C) -> TimerResult<Self> {
        let config = TimerConfig::new(window_ms)?;
        Ok(Self::new(config, clock))
    }

    /// Evaluate the countdown.
    ///
    /// Returns `true` if the timer is expired, either previously or as a
    /// result of this check.
    pub fn check_expiry(&self) -> bool {
        match self.state.status() {
            TimerStatus::Expired => true,
            TimerStatus::Running => {
                let since_kick = self
                    .clock
                    .now_ms()
                    .wrapping_sub(self.last_kick_ms.load(Ordering::Acquire));
                if since_kick <= self.config.window_ms {
                    return false;
                }
                // Only the caller that wins the transition runs the hook.
                if self.state.expire().is_ok() {
                    self.fire_pre_reset();
                }
                true
            }
            TimerStatus::Uninitialized | TimerStatus::Initialized => false,
        }
    }

    fn fire_pre_reset(&self) {
        if !self.config.pre_reset_interrupt {
            return;
        }
        if let Some(hook) = &self.pre_reset {
            hook();
        }
    }

    /// Milliseconds since the last kick (or start), `None` unless running or
    /// expired.
    #[must_use]
    pub fn time_since_last_kick_ms(&self) -> Option<u32> {
        match self.state.status() {
            TimerStatus::Running | TimerStatus::Expired => Some(
                self.clock
                    .now_ms()
                    .wrapping_sub(self.last_kick_ms.load(Ordering::Acquire)),
            ),
            TimerStatus::Uninitialized | TimerStatus::Initialized => None,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    /// Transition counters.
    #[must_use]
    pub fn metrics(&self) -> TimerMetrics {
        self.state.metrics()
    }

    /// Timer configuration.
    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Whether a pre-reset hook is registered.
    #[must_use]
    pub fn has_pre_reset_hook(&self) -> bool {
        self.pre_reset.is_some()
    }
}

impl<C: TickSource> HardwareTimer for SoftwareTimer<C> {
    fn init(&mut self) -> TimerResult<()> {
        self.state.init()
    }

    fn deinit(&mut self) -> TimerResult<()> {
        self.state.deinit()?;
        self.last_kick_ms.store(0, Ordering::Release);
        Ok(())
    }

    fn start(&self) -> TimerResult<()> {
        self.state.start()?;
        self.last_kick_ms
            .store(self.clock.now_ms(), Ordering::Release);
        Ok(())
    }

    fn kick(&self) -> TimerResult<()> {
        // A kick that arrives after the window is too late to save the system.
        if self.check_expiry() {
            return Err(TimerError::Expired);
        }
        self.state.kick()?;
        self.last_kick_ms
            .store(self.clock.now_ms(), Ordering::Release);
        Ok(())
    }

    fn set_pre_reset_hook(&mut self, hook: Option<PreResetHook>) {
        self.pre_reset = hook;
    }
}

impl<C: core::fmt::Debug> core::fmt::Debug for SoftwareTimer<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SoftwareTimer")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("state", &self.state)
            .field("last_kick_ms", &self.last_kick_ms)
            .field("pre_reset", &self.pre_reset.is_some())
            .finish()
    }
}
