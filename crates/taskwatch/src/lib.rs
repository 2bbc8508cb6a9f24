//! # taskwatch
//!
//! Supervisory liveness monitor for embedded and real-time systems.
//!
//! A fixed set of tasks report liveness on their own schedules. A single
//! high-priority loop polls the monitor, which refreshes ("kicks") the
//! hardware watchdog only while every enabled task is within its deadline.
//! The first missed deadline latches the monitor invalid and refreshes stop
//! until the next `start`, so the hardware watchdog resets the system.
//!
//! ## Safety Guarantees
//!
//! - **No heap allocations** after construction in `report` and `poll`
//! - **Bounded waits**: `report` waits at most the configured lock timeout,
//!   `poll` never blocks
//! - **Statistics never gate refreshes**: the recorder only observes
//!
//! ## Architecture
//!
//! - [`monitor`] - deadline tracking, validity latch and refresh gating
//! - [`registry`] - task table, task ids and per-task runtime state
//! - [`recorder`] - pluggable statistics sink (`StatsRecorder`, `NoopRecorder`)
//! - [`stats`] - per-task interval statistics
//! - [`trace`] - fixed-depth trace of reporting tasks
//! - [`config`] - monitor configuration and table validation
//! - [`error`] - monitor error types
//!
//! Hardware access goes through [`taskwatch_hal`], re-exported here as
//! [`hal`].
//!
//! ## Example
//!
//! ```rust
//! use taskwatch::prelude::*;
//!
//! let clock = ManualTick::new(0);
//! let timer = SoftwareTimer::new(TimerConfig::default(), &clock);
//! let table = TaskTable::new(vec![
//!     TaskConfig::new("control", 100),
//!     TaskConfig::new("telemetry", 5_000).default_enabled(false),
//! ]);
//!
//! let mut monitor = LivenessMonitor::builder(table, timer, &clock)
//!     .build()
//!     .expect("valid configuration");
//! monitor.init().expect("init");
//! monitor.start().expect("start");
//!
//! // control misses its 100ms deadline
//! clock.advance(101);
//! let outcome = monitor.poll().expect("poll");
//! assert!(!outcome.valid);
//! assert!(!outcome.kicked);
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod monitor;
pub mod recorder;
pub mod registry;
pub mod stats;
pub mod trace;

pub mod prelude;

pub use taskwatch_hal as hal;

pub use config::{MonitorConfig, MonitorConfigBuilder};
pub use error::{ErrorKind, TimerOp, WdtError, WdtResult};
pub use monitor::{LivenessMonitor, MonitorBuilder, PollOutcome, Violation};
pub use recorder::{NoopRecorder, Recorder, StatsRecorder};
pub use registry::{TaskConfig, TaskId, TaskTable};
pub use stats::TaskStats;
pub use trace::{TRACE_DEPTH, TraceBuffer};
