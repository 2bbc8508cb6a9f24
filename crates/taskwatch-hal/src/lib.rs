//! # taskwatch-hal
//!
//! Platform seams for the taskwatch liveness monitor.
//!
//! This crate is `#![no_std]`-compatible and provides:
//! - [`HardwareTimer`], the init/start/kick contract of a physical watchdog
//! - [`TickSource`], a wrapping millisecond tick counter
//! - [`SoftwareTimer`], a simulated hardware timer for hosts and tests
//! - an atomic state machine for timer status
//!
//! ## Real-Time Safety
//!
//! - **No heap allocations** after construction
//! - **No blocking operations** in `kick()` or `now_ms()`
//! - **Atomic state transitions**, so `kick()` may run from interrupt context
//!
//! ## Timer State Machine
//!
//! ```text
//! Uninitialized ──init()──► Initialized ──start()──► Running ◄─┐
//!       ▲                                               │   │  │ kick()
//!       │                                   expiry      │   └──┘
//!       │                                               ▼
//!       └──────────────────deinit()────────────────── Expired
//! ```
//!
//! ## Wraparound
//!
//! Tick values are `u32` milliseconds and wrap at 2^32. All elapsed-time
//! arithmetic uses [`u32::wrapping_sub`], which is correct across a wrap as
//! long as the real interval is below 2^32 ms.
//!
//! ## Example
//!
//! ```rust
//! use taskwatch_hal::prelude::*;
//!
//! let clock = ManualTick::new(0);
//! let config = TimerConfig::new(50).expect("valid window");
//! let mut timer = SoftwareTimer::new(config, &clock);
//!
//! timer.init().expect("init");
//! timer.start().expect("start");
//!
//! clock.advance(40);
//! timer.kick().expect("kick");
//! assert!(!timer.check_expiry());
//!
//! clock.advance(51);
//! assert!(timer.check_expiry());
//! assert_eq!(timer.status(), TimerStatus::Expired);
//! ```

#![no_std]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod clock;
pub mod config;
pub mod error;
pub mod prelude;
pub mod software_impl;
pub mod state;
pub mod timer;

#[cfg(feature = "std")]
pub use clock::SystemTick;
pub use clock::{ManualTick, TickSource};
pub use config::TimerConfig;
pub use error::{TimerError, TimerResult};
pub use software_impl::SoftwareTimer;
pub use state::{TimerMetrics, TimerState, TimerStatus};
pub use timer::{HardwareTimer, PreResetHook};
