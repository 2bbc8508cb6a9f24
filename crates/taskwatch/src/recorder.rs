//! Statistics recorders.
//!
//! The monitor feeds every report into a [`Recorder`] while holding the
//! statistics lock. Two implementations are provided: [`StatsRecorder`]
//! keeps per-task interval statistics and a [`TraceBuffer`], and
//! [`NoopRecorder`] discards everything. The recorder never influences the
//! refresh decision.

use std::fmt;

use crate::registry::{TaskId, TaskTable};
use crate::stats::TaskStats;
use crate::trace::TraceBuffer;

/// Sink for report events.
///
/// All methods run under the monitor's statistics lock and must not block.
pub trait Recorder: Send + fmt::Debug {
    /// Create a recorder sized for `task_count` tasks.
    fn with_task_count(task_count: usize) -> Self
    where
        Self: Sized;

    /// Record a report of `task` at `now_ms`; `previous_ms` is the task's
    /// prior report (or start) timestamp.
    fn record(&mut self, task: TaskId, now_ms: u32, previous_ms: u32);

    /// Begin a fresh report-count window for every task at `now_ms`.
    fn restart_windows(&mut self, now_ms: u32);

    /// Close every window that has lasted one task timeout.
    fn roll_windows(&mut self, table: &TaskTable, now_ms: u32);

    /// Discard accumulated statistics and trace.
    fn clear(&mut self);

    /// Statistics of one task, if kept.
    fn task_stats(&self, task: TaskId) -> Option<TaskStats>;

    /// Trace of recent reporters, if kept.
    fn trace(&self) -> Option<&TraceBuffer>;
}

/// Recorder that keeps interval statistics and a trace.
#[derive(Debug, Clone)]
pub struct StatsRecorder {
    stats: Vec<TaskStats>,
    window_start_ms: Vec<u32>,
    trace: TraceBuffer,
}

impl StatsRecorder {
    /// Statistics of every task, in id order.
    #[must_use]
    pub fn all_stats(&self) -> &[TaskStats] {
        &self.stats
    }
}

impl Recorder for StatsRecorder {
    fn with_task_count(task_count: usize) -> Self {
        Self {
            stats: vec![TaskStats::new(); task_count],
            window_start_ms: vec![0; task_count],
            trace: TraceBuffer::new(),
        }
    }

    fn record(&mut self, task: TaskId, now_ms: u32, previous_ms: u32) {
        if let Some(stats) = self.stats.get_mut(task.index()) {
            stats.record_interval(now_ms.wrapping_sub(previous_ms));
            self.trace.push(task);
        }
    }

    fn restart_windows(&mut self, now_ms: u32) {
        self.window_start_ms.fill(now_ms);
        self.stats.iter_mut().for_each(TaskStats::clear_window);
    }

    fn roll_windows(&mut self, table: &TaskTable, now_ms: u32) {
        let windows = self.stats.iter_mut().zip(self.window_start_ms.iter_mut());
        for ((stats, start), (_, task)) in windows.zip(table.iter()) {
            if now_ms.wrapping_sub(*start) >= task.timeout_ms {
                *start = now_ms;
                stats.clear_window();
            }
        }
    }

    fn clear(&mut self) {
        self.stats.iter_mut().for_each(TaskStats::reset);
        self.trace.clear();
    }

    fn task_stats(&self, task: TaskId) -> Option<TaskStats> {
        self.stats.get(task.index()).copied()
    }

    fn trace(&self) -> Option<&TraceBuffer> {
        Some(&self.trace)
    }
}

/// Recorder that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl Recorder for NoopRecorder {
    fn with_task_count(_task_count: usize) -> Self {
        Self
    }

    fn record(&mut self, _task: TaskId, _now_ms: u32, _previous_ms: u32) {}

    fn restart_windows(&mut self, _now_ms: u32) {}

    fn roll_windows(&mut self, _table: &TaskTable, _now_ms: u32) {}

    fn clear(&mut self) {}

    fn task_stats(&self, _task: TaskId) -> Option<TaskStats> {
        None
    }

    fn trace(&self) -> Option<&TraceBuffer> {
        None
    }
}
