//! Hardware timer trait definition.

use alloc::sync::Arc;

use crate::error::TimerResult;

/// Last-gasp callback run by the timer's early-warning interrupt, shortly
/// before the hardware resets the system.
///
/// Typical use is persisting diagnostic data to non-volatile memory. It runs
/// in interrupt context on real hardware: keep it short and non-blocking.
pub type PreResetHook = Arc<dyn Fn() + Send + Sync>;

/// Contract of a physical watchdog timer driver.
///
/// Once started, the peripheral resets the system unless `kick()` is called
/// within its refresh window.
///
/// # Calling Contexts
///
/// - `init()`, `deinit()`, `start()`: normal task context
/// - `kick()`: any context, including interrupt context
///
/// # Real-Time Safety
///
/// `kick()` must not allocate or block.
pub trait HardwareTimer: Send + Sync {
    /// Configure the peripheral.
    ///
    /// # Errors
    ///
    /// Returns an error if the peripheral is already configured or cannot be
    /// accessed.
    fn init(&mut self) -> TimerResult<()>;

    /// Release the peripheral.
    ///
    /// # Errors
    ///
    /// Returns an error if the peripheral was never configured or refuses to
    /// stop.
    fn deinit(&mut self) -> TimerResult<()>;

    /// Start (or restart) the countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the peripheral is not configured or has already
    /// expired.
    fn start(&self) -> TimerResult<()>;

    /// Reload the countdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the countdown is not running.
    fn kick(&self) -> TimerResult<()>;

    /// Register the early-warning callback.
    ///
    /// Peripherals without an early-warning interrupt ignore it.
    fn set_pre_reset_hook(&mut self, _hook: Option<PreResetHook>) {}
}
