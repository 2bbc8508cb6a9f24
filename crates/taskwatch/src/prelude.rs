//! Prelude for taskwatch.
//!
//! This module re-exports the most commonly used types, including the
//! hardware timer and tick source traits.
//!
//! # Example
//!
//! ```rust
//! use taskwatch::prelude::*;
//!
//! let table = TaskTable::new(vec![TaskConfig::new("control", 100)]);
//! let config = MonitorConfig::default();
//! assert!(config.validate_table(&table).is_ok());
//! ```

pub use crate::config::{MonitorConfig, MonitorConfigBuilder};
pub use crate::error::{ErrorKind, TimerOp, WdtError, WdtResult};
pub use crate::monitor::{LivenessMonitor, MonitorBuilder, PollOutcome, Violation};
pub use crate::recorder::{NoopRecorder, Recorder, StatsRecorder};
pub use crate::registry::{TaskConfig, TaskId, TaskTable};
pub use crate::stats::TaskStats;
pub use crate::trace::TraceBuffer;

pub use taskwatch_hal::SystemTick;
pub use taskwatch_hal::{
    HardwareTimer, ManualTick, PreResetHook, SoftwareTimer, TickSource, TimerConfig, TimerError,
    TimerStatus,
};
