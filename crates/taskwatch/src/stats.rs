//! Per-task report interval statistics.

use serde::{Deserialize, Serialize};

/// Inter-report interval statistics for a single task.
///
/// Values are derived from report timestamps and carry no authority over
/// the monitor's decision to refresh the hardware timer.
///
/// # RT Safety
///
/// All methods are RT-safe and perform no heap allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Number of recorded intervals.
    pub samples: u32,
    /// Sum of all recorded intervals (milliseconds).
    pub sum_ms: u64,
    /// Integer mean of the recorded intervals (milliseconds).
    pub avg_ms: u32,
    /// Shortest interval; `u32::MAX` until the first sample.
    pub min_ms: u32,
    /// Longest interval.
    pub max_ms: u32,
    /// Reports received in the current timeout window.
    pub reports_in_window: u32,
    /// Reports received since statistics were last cleared.
    pub total_reports: u64,
}

impl Default for TaskStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStats {
    /// Create empty statistics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: 0,
            sum_ms: 0,
            avg_ms: 0,
            min_ms: u32::MAX,
            max_ms: 0,
            reports_in_window: 0,
            total_reports: 0,
        }
    }

    /// Record one report that arrived `interval_ms` after the previous one.
    pub fn record_interval(&mut self, interval_ms: u32) {
        self.samples = self.samples.saturating_add(1);
        self.sum_ms = self.sum_ms.saturating_add(u64::from(interval_ms));
        self.avg_ms = self
            .sum_ms
            .checked_div(u64::from(self.samples))
            .and_then(|avg| u32::try_from(avg).ok())
            .unwrap_or(u32::MAX);
        self.min_ms = self.min_ms.min(interval_ms);
        self.max_ms = self.max_ms.max(interval_ms);
        self.reports_in_window = self.reports_in_window.saturating_add(1);
        self.total_reports = self.total_reports.saturating_add(1);
    }

    /// Shortest interval, `None` before the first sample.
    #[must_use]
    pub fn min_interval_ms(&self) -> Option<u32> {
        (self.samples > 0).then_some(self.min_ms)
    }

    /// Start a new report-count window.
    pub fn clear_window(&mut self) {
        self.reports_in_window = 0;
    }

    /// Clear everything.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = TaskStats::new();
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.avg_ms, 0);
        assert_eq!(stats.min_ms, u32::MAX);
        assert_eq!(stats.min_interval_ms(), None);
    }

    #[test]
    fn test_record_intervals() {
        let mut stats = TaskStats::new();
        for interval in [10, 20, 31] {
            stats.record_interval(interval);
        }

        assert_eq!(stats.samples, 3);
        assert_eq!(stats.sum_ms, 61);
        assert_eq!(stats.avg_ms, 20);
        assert_eq!(stats.min_interval_ms(), Some(10));
        assert_eq!(stats.max_ms, 31);
        assert_eq!(stats.reports_in_window, 3);
        assert_eq!(stats.total_reports, 3);
    }

    #[test]
    fn test_zero_interval_is_a_sample() {
        let mut stats = TaskStats::new();
        stats.record_interval(0);
        assert_eq!(stats.min_interval_ms(), Some(0));
        assert_eq!(stats.avg_ms, 0);
    }

    #[test]
    fn test_window_clear_keeps_timings() {
        let mut stats = TaskStats::new();
        stats.record_interval(5);
        stats.record_interval(7);
        stats.clear_window();

        assert_eq!(stats.reports_in_window, 0);
        assert_eq!(stats.total_reports, 2);
        assert_eq!(stats.max_ms, 7);

        stats.reset();
        assert_eq!(stats, TaskStats::new());
    }

    #[test]
    fn test_large_intervals_do_not_overflow() {
        let mut stats = TaskStats::new();
        for _ in 0..4 {
            stats.record_interval(u32::MAX);
        }
        assert_eq!(stats.avg_ms, u32::MAX);
        assert_eq!(stats.sum_ms, 4 * u64::from(u32::MAX));
    }
}
