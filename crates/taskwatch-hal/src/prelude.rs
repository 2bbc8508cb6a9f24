//! Prelude for taskwatch-hal.
//!
//! Re-exports the most commonly used types.
//!
//! # Example
//!
//! ```rust
//! use taskwatch_hal::prelude::*;
//!
//! let clock = ManualTick::new(0);
//! let mut timer = SoftwareTimer::new(TimerConfig::default(), &clock);
//! timer.init().expect("Failed to init");
//! timer.start().expect("Failed to start");
//! timer.kick().expect("Failed to kick");
//! ```

#[cfg(feature = "std")]
pub use crate::clock::SystemTick;
pub use crate::clock::{ManualTick, TickSource};
pub use crate::config::{TimerConfig, TimerConfigBuilder};
pub use crate::error::{TimerError, TimerResult};
pub use crate::software_impl::SoftwareTimer;
pub use crate::state::{TimerMetrics, TimerState, TimerStatus};
pub use crate::timer::{HardwareTimer, PreResetHook};
