//! Millisecond tick sources.
//!
//! A tick source is a monotonic `u32` millisecond counter that wraps at
//! 2^32. Readers compute intervals with `wrapping_sub`, never with plain
//! subtraction.

use alloc::sync::Arc;
use portable_atomic::{AtomicU32, Ordering};

/// Monotonic millisecond counter.
///
/// # Real-Time Safety
///
/// `now_ms()` must be O(1), non-blocking and callable from interrupt
/// context.
pub trait TickSource: Send + Sync {
    /// Current tick in milliseconds. Wraps at `u32::MAX`.
    fn now_ms(&self) -> u32;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

impl<T: TickSource + ?Sized> TickSource for Arc<T> {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Manually driven tick source.
///
/// Time only moves when [`set`](Self::set) or [`advance`](Self::advance) is
/// called. Used for simulation and deterministic tests, and on targets where
/// a timer interrupt bumps the counter.
#[derive(Debug, Default)]
pub struct ManualTick {
    now: AtomicU32,
}

impl ManualTick {
    /// Create a tick source starting at `start_ms`.
    #[must_use]
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: AtomicU32::new(start_ms),
        }
    }

    /// Set the current tick.
    pub fn set(&self, now_ms: u32) {
        self.now.store(now_ms, Ordering::Release);
    }

    /// Advance the tick by `delta_ms`, wrapping at `u32::MAX`.
    pub fn advance(&self, delta_ms: u32) {
        self.now.fetch_add(delta_ms, Ordering::AcqRel);
    }
}

impl TickSource for ManualTick {
    fn now_ms(&self) -> u32 {
        self.now.load(Ordering::Acquire)
    }
}

/// Tick source backed by [`std::time::Instant`].
///
/// Counts milliseconds since construction, truncated to `u32`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct SystemTick {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemTick {
    /// Create a tick source whose zero is "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemTick {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TickSource for SystemTick {
    fn now_ms(&self) -> u32 {
        let millis = self.origin.elapsed().as_millis() & u128::from(u32::MAX);
        u32::try_from(millis).unwrap_or_default()
    }
}
