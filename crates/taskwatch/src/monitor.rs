//! Liveness monitor.
//!
//! [`LivenessMonitor`] tracks the last report of every supervised task and,
//! on each [`poll`](LivenessMonitor::poll), decides whether the system is
//! still healthy enough to refresh the hardware timer. The first missed
//! deadline latches the monitor invalid; from then on refreshes are
//! withheld until [`start`](LivenessMonitor::start) is called again, and the
//! hardware timer is left to reset the system.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use taskwatch_hal::{HardwareTimer, PreResetHook, TickSource};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{TimerOp, WdtError, WdtResult};
use crate::recorder::{Recorder, StatsRecorder};
use crate::registry::{TaskConfig, TaskId, TaskState, TaskTable};
use crate::stats::TaskStats;

/// Packed `(task index << 32) | elapsed_ms` of the first violation.
const NO_VIOLATION: u64 = u64::MAX;

fn pack_violation(task: TaskId, elapsed_ms: u32) -> u64 {
    let index = u32::try_from(task.index()).unwrap_or(u32::MAX);
    (u64::from(index) << 32) | u64::from(elapsed_ms)
}

fn unpack_violation(packed: u64) -> Option<(TaskId, u32)> {
    if packed == NO_VIOLATION {
        return None;
    }
    let index = usize::try_from(packed >> 32).ok()?;
    let elapsed_ms = u32::try_from(packed & u64::from(u32::MAX)).ok()?;
    Some((TaskId::new(index), elapsed_ms))
}

/// Result of one [`poll`](LivenessMonitor::poll) cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    /// Whether every enabled task is within its deadline.
    pub valid: bool,
    /// Whether the hardware timer was refreshed in this cycle.
    pub kicked: bool,
}

/// The missed deadline that invalidated the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Task that missed its deadline.
    pub task: TaskId,
    /// Time since the task's last report when the miss was detected.
    pub elapsed_ms: u32,
    /// The task's configured timeout.
    pub timeout_ms: u32,
}

/// Supervisory liveness monitor.
///
/// Shared between reporting tasks and the poll loop through `Arc`. Bring-up
/// (`init`, `deinit`) needs exclusive access; everything else takes `&self`.
///
/// # RT Safety
///
/// The following methods are RT-safe (no allocations, bounded waits):
/// - `report()` waits at most `lock_timeout` for the statistics lock
/// - `poll()` never blocks; window maintenance is skipped if the lock is busy
/// - `is_valid()` and `get_enabled()` are single atomic loads
///
/// # Example
///
/// ```rust
/// use taskwatch::prelude::*;
///
/// let clock = ManualTick::new(0);
/// let timer = SoftwareTimer::new(TimerConfig::default(), &clock);
/// let table = TaskTable::new(vec![TaskConfig::new("control", 100)]);
///
/// let mut monitor = LivenessMonitor::builder(table, timer, &clock)
///     .build()
///     .expect("valid configuration");
/// monitor.init().expect("init");
/// monitor.start().expect("start");
///
/// clock.advance(50);
/// monitor.report(TaskId::new(0)).expect("report");
/// let outcome = monitor.poll().expect("poll");
/// assert!(outcome.valid);
/// assert!(outcome.kicked);
/// ```
pub struct LivenessMonitor<H, C, R = StatsRecorder> {
    table: TaskTable,
    config: MonitorConfig,
    timer: H,
    clock: C,
    tasks: Box<[TaskState]>,
    recorder: Mutex<R>,
    pre_reset: Option<PreResetHook>,
    initialized: bool,
    started: AtomicBool,
    valid: AtomicBool,
    last_kick_ms: AtomicU32,
    violation: AtomicU64,
    withheld_logged: AtomicBool,
}

impl<H, C> LivenessMonitor<H, C, StatsRecorder>
where
    H: HardwareTimer,
    C: TickSource,
{
    /// Start building a monitor over `timer` and `clock`.
    #[must_use]
    pub fn builder(table: TaskTable, timer: H, clock: C) -> MonitorBuilder<H, C> {
        MonitorBuilder {
            table,
            timer,
            clock,
            config: MonitorConfig::default(),
            pre_reset: None,
            recorder: PhantomData,
        }
    }
}

impl<H, C, R> LivenessMonitor<H, C, R>
where
    H: HardwareTimer,
    C: TickSource,
    R: Recorder,
{
    /// Bring up the monitor and the hardware timer.
    ///
    /// Hands the pre-reset hook to the timer, initializes it, resets every
    /// task to its default enablement and clears the recorder.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized`, `EmptyTaskTable`, or a timer error; the
    /// monitor stays uninitialized on failure.
    pub fn init(&mut self) -> WdtResult<()> {
        if self.initialized {
            return Err(WdtError::AlreadyInitialized);
        }
        if self.table.is_empty() {
            return Err(WdtError::EmptyTaskTable);
        }

        self.timer.set_pre_reset_hook(self.pre_reset.clone());
        self.timer
            .init()
            .map_err(|source| WdtError::timer(TimerOp::Init, source))?;

        let now = self.clock.now_ms();
        for (state, (_, task)) in self.tasks.iter().zip(self.table.iter()) {
            state.set_enabled(task.default_enabled, now);
        }
        self.recorder.get_mut().clear();
        self.started.store(false, Ordering::Release);
        self.valid.store(false, Ordering::Release);
        self.violation.store(NO_VIOLATION, Ordering::Release);
        self.initialized = true;

        info!(tasks = self.table.len(), "Liveness monitor initialized");
        Ok(())
    }

    /// Shut down the hardware timer and return to the uninitialized state.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or a timer error.
    pub fn deinit(&mut self) -> WdtResult<()> {
        self.ensure_initialized()?;
        self.timer
            .deinit()
            .map_err(|source| WdtError::timer(TimerOp::Deinit, source))?;

        self.initialized = false;
        self.started.store(false, Ordering::Release);
        self.valid.store(false, Ordering::Release);

        info!("Liveness monitor deinitialized");
        Ok(())
    }

    /// Whether `init` has succeeded (and `deinit` has not been called since).
    #[must_use]
    pub fn is_init(&self) -> bool {
        self.initialized
    }

    /// Start (or restart) supervision.
    ///
    /// Starts the hardware countdown, re-arms every task deadline and the
    /// kick period at the current tick, and sets the monitor valid. Each
    /// session begins with empty statistics and trace, so no interval spans
    /// a restart.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `LockTimeout` if the statistics lock is not
    /// acquired within `lock_timeout`, or a timer error; state is unchanged
    /// on failure.
    pub fn start(&self) -> WdtResult<()> {
        self.ensure_initialized()?;
        let mut recorder = self
            .recorder
            .try_lock_for(self.config.lock_timeout)
            .ok_or_else(|| {
                warn!(timeout = ?self.config.lock_timeout, "Statistics lock busy, start refused");
                WdtError::LockTimeout(self.config.lock_timeout)
            })?;
        self.timer
            .start()
            .map_err(|source| WdtError::timer(TimerOp::Start, source))?;

        let now = self.clock.now_ms();
        for state in self.tasks.iter() {
            state.rearm(now);
        }
        self.last_kick_ms.store(now, Ordering::Release);
        self.violation.store(NO_VIOLATION, Ordering::Release);
        self.withheld_logged.store(false, Ordering::Release);
        recorder.clear();
        recorder.restart_windows(now);
        drop(recorder);
        self.valid.store(true, Ordering::Release);
        self.started.store(true, Ordering::Release);

        info!(at_ms = now, "Liveness monitor started");
        Ok(())
    }

    /// Whether supervision is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether no enabled task has missed its deadline since `start`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Run one supervision cycle.
    ///
    /// Checks every enabled task's deadline, refreshes the hardware timer
    /// if the monitor is still valid and the kick period has elapsed, and
    /// rolls the statistics windows.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `NotStarted`, or a timer error if the
    /// refresh itself fails.
    pub fn poll(&self) -> WdtResult<PollOutcome> {
        self.ensure_initialized()?;
        if !self.is_started() {
            return Err(WdtError::NotStarted);
        }

        if self.is_valid() {
            self.check_deadlines();
        }
        self.roll_windows();
        let kicked = self.kick_if_due()?;

        Ok(PollOutcome {
            valid: self.is_valid(),
            kicked,
        })
    }

    fn check_deadlines(&self) {
        for ((id, task), state) in self.table.iter().zip(self.tasks.iter()) {
            if !state.is_enabled() {
                continue;
            }
            // Timestamp first: a report landing after this load is never
            // newer than the tick read below.
            let last = state.last_report_ms();
            let elapsed = self.clock.now_ms().wrapping_sub(last);
            if elapsed > task.timeout_ms {
                self.trip(id, task, elapsed);
                return;
            }
        }
    }

    fn trip(&self, id: TaskId, task: &TaskConfig, elapsed_ms: u32) {
        self.valid.store(false, Ordering::Release);
        if self
            .violation
            .compare_exchange(
                NO_VIOLATION,
                pack_violation(id, elapsed_ms),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            error!(
                task = %task.name,
                elapsed_ms,
                timeout_ms = task.timeout_ms,
                "Task missed its deadline, withholding watchdog refresh"
            );
        }
    }

    fn kick_if_due(&self) -> WdtResult<bool> {
        if !self.is_valid() {
            if !self.withheld_logged.swap(true, Ordering::AcqRel) {
                debug!("Watchdog refresh withheld");
            }
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let since_kick = now.wrapping_sub(self.last_kick_ms.load(Ordering::Acquire));
        if since_kick < self.config.kick_period_ms {
            return Ok(false);
        }

        self.timer
            .kick()
            .map_err(|source| WdtError::timer(TimerOp::Kick, source))?;
        self.last_kick_ms.store(now, Ordering::Release);
        Ok(true)
    }

    fn roll_windows(&self) {
        if let Some(mut recorder) = self.recorder.try_lock() {
            recorder.roll_windows(&self.table, self.clock.now_ms());
        }
    }

    /// Report that `task` is alive.
    ///
    /// The tick is read and the timestamp written under the statistics lock.
    /// If the lock cannot be taken within `lock_timeout` the timestamp is
    /// still refreshed and `LockTimeout` is returned; the report counts for
    /// supervision but not for statistics.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `OutOfRange` or `LockTimeout`.
    pub fn report(&self, task: TaskId) -> WdtResult<()> {
        let state = self.task_state(task)?;

        if let Some(mut recorder) = self.recorder.try_lock_for(self.config.lock_timeout) {
            let now = self.clock.now_ms();
            let previous = state.touch(now);
            recorder.record(task, now, previous);
            return Ok(());
        }

        state.touch(self.clock.now_ms());
        warn!(
            task = %task,
            timeout = ?self.config.lock_timeout,
            "Statistics lock busy, report not recorded"
        );
        Err(WdtError::LockTimeout(self.config.lock_timeout))
    }

    /// Enable or disable supervision of `task`.
    ///
    /// The task's deadline is re-armed at the current tick either way.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized`, `OutOfRange` or `LockTimeout`; the task is
    /// unchanged on error.
    pub fn set_enabled(&self, task: TaskId, enabled: bool) -> WdtResult<()> {
        let state = self.task_state(task)?;
        let _guard = self
            .recorder
            .try_lock_for(self.config.lock_timeout)
            .ok_or(WdtError::LockTimeout(self.config.lock_timeout))?;

        state.set_enabled(enabled, self.clock.now_ms());
        debug!(task = %task, enabled, "Task supervision changed");
        Ok(())
    }

    /// Whether `task` is supervised.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `OutOfRange`.
    pub fn get_enabled(&self, task: TaskId) -> WdtResult<bool> {
        Ok(self.task_state(task)?.is_enabled())
    }

    /// Milliseconds since `task` last reported (or was re-armed).
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `OutOfRange`.
    pub fn time_since_report_ms(&self, task: TaskId) -> WdtResult<u32> {
        let last = self.task_state(task)?.last_report_ms();
        Ok(self.clock.now_ms().wrapping_sub(last))
    }

    /// Look up a task by its configured name.
    #[must_use]
    pub fn task_id(&self, name: &str) -> Option<TaskId> {
        self.table.find(name)
    }

    /// The missed deadline that invalidated the monitor, if any.
    #[must_use]
    pub fn first_violation(&self) -> Option<Violation> {
        let (id, elapsed_ms) = unpack_violation(self.violation.load(Ordering::Acquire))?;
        let task = self.table.get(id)?;
        Some(Violation {
            task: id,
            elapsed_ms,
            timeout_ms: task.timeout_ms,
        })
    }

    /// Statistics for `task`; `None` when the recorder keeps none.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` or `LockTimeout`.
    pub fn stats(&self, task: TaskId) -> WdtResult<Option<TaskStats>> {
        self.table.config(task)?;
        self.inspect(|recorder| recorder.task_stats(task))
    }

    /// Recent reporters, most recent first; empty when no trace is kept.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout`.
    pub fn trace(&self) -> WdtResult<Vec<TaskId>> {
        self.inspect(|recorder| {
            recorder
                .trace()
                .map(crate::trace::TraceBuffer::to_vec)
                .unwrap_or_default()
        })
    }

    /// Run `f` with the recorder locked.
    ///
    /// Reports issued meanwhile wait at most `lock_timeout` and then proceed
    /// without recording.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock is not acquired in time.
    pub fn inspect<T>(&self, f: impl FnOnce(&R) -> T) -> WdtResult<T> {
        let recorder = self
            .recorder
            .try_lock_for(self.config.lock_timeout)
            .ok_or(WdtError::LockTimeout(self.config.lock_timeout))?;
        Ok(f(&*recorder))
    }

    /// Discard accumulated statistics and trace.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock is not acquired in time.
    pub fn reset_stats(&self) -> WdtResult<()> {
        let mut recorder = self
            .recorder
            .try_lock_for(self.config.lock_timeout)
            .ok_or(WdtError::LockTimeout(self.config.lock_timeout))?;
        recorder.clear();
        Ok(())
    }

    fn ensure_initialized(&self) -> WdtResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(WdtError::NotInitialized)
        }
    }

    fn task_state(&self, task: TaskId) -> WdtResult<&TaskState> {
        self.ensure_initialized()?;
        self.tasks
            .get(task.index())
            .ok_or_else(|| WdtError::out_of_range(task.index(), self.tasks.len()))
    }
}

impl<H, C, R> LivenessMonitor<H, C, R> {
    /// Registered tasks.
    #[must_use]
    pub fn table(&self) -> &TaskTable {
        &self.table
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.table.len()
    }

    /// Monitor configuration.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The underlying hardware timer.
    #[must_use]
    pub fn timer(&self) -> &H {
        &self.timer
    }

    /// The tick source.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<H, C, R> fmt::Debug for LivenessMonitor<H, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessMonitor")
            .field("table", &self.table)
            .field("config", &self.config)
            .field("initialized", &self.initialized)
            .field("started", &self.started.load(Ordering::Relaxed))
            .field("valid", &self.valid.load(Ordering::Relaxed))
            .field("pre_reset", &self.pre_reset.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`LivenessMonitor`].
pub struct MonitorBuilder<H, C, R = StatsRecorder> {
    table: TaskTable,
    timer: H,
    clock: C,
    config: MonitorConfig,
    pre_reset: Option<PreResetHook>,
    recorder: PhantomData<fn() -> R>,
}

impl<H, C, R> MonitorBuilder<H, C, R>
where
    H: HardwareTimer,
    C: TickSource,
    R: Recorder,
{
    /// Set the monitor configuration.
    #[must_use]
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a hook the hardware timer runs just before it resets the
    /// system. Only peripherals with an early-warning interrupt honour it.
    #[must_use]
    pub fn pre_reset_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.pre_reset = Some(Arc::new(hook));
        self
    }

    /// Select the statistics recorder.
    #[must_use]
    pub fn recorder<R2: Recorder>(self) -> MonitorBuilder<H, C, R2> {
        MonitorBuilder {
            table: self.table,
            timer: self.timer,
            clock: self.clock,
            config: self.config,
            pre_reset: self.pre_reset,
            recorder: PhantomData,
        }
    }

    /// Validate the configuration and task table and build the monitor.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTaskTable` or `InvalidConfiguration`.
    pub fn build(self) -> WdtResult<LivenessMonitor<H, C, R>> {
        self.config.validate()?;
        self.config.validate_table(&self.table)?;

        let now = self.clock.now_ms();
        let tasks = self
            .table
            .iter()
            .map(|(_, task)| TaskState::new(task.default_enabled, now))
            .collect();

        Ok(LivenessMonitor {
            recorder: Mutex::new(R::with_task_count(self.table.len())),
            tasks,
            table: self.table,
            config: self.config,
            timer: self.timer,
            clock: self.clock,
            pre_reset: self.pre_reset,
            initialized: false,
            started: AtomicBool::new(false),
            valid: AtomicBool::new(false),
            last_kick_ms: AtomicU32::new(now),
            violation: AtomicU64::new(NO_VIOLATION),
            withheld_logged: AtomicBool::new(false),
        })
    }
}

impl<H, C, R> fmt::Debug for MonitorBuilder<H, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorBuilder")
            .field("table", &self.table)
            .field("config", &self.config)
            .field("pre_reset", &self.pre_reset.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::NoopRecorder;
    use std::sync::atomic::AtomicUsize;
    use taskwatch_hal::{ManualTick, SoftwareTimer, TimerConfig, TimerError, TimerResult};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    /// Timer that counts kicks and can be told to fail.
    #[derive(Default)]
    struct CountingTimer {
        kicks: AtomicUsize,
        fail_kick: AtomicBool,
        fail_init: bool,
        hook: Option<PreResetHook>,
    }

    impl CountingTimer {
        fn kicks(&self) -> usize {
            self.kicks.load(Ordering::SeqCst)
        }
    }

    impl HardwareTimer for CountingTimer {
        fn init(&mut self) -> TimerResult<()> {
            if self.fail_init {
                return Err(TimerError::hardware_error("no clock"));
            }
            Ok(())
        }

        fn deinit(&mut self) -> TimerResult<()> {
            Ok(())
        }

        fn start(&self) -> TimerResult<()> {
            Ok(())
        }

        fn kick(&self) -> TimerResult<()> {
            if self.fail_kick.load(Ordering::SeqCst) {
                return Err(TimerError::NotRunning);
            }
            self.kicks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn set_pre_reset_hook(&mut self, hook: Option<PreResetHook>) {
            self.hook = hook;
        }
    }

    fn table() -> TaskTable {
        TaskTable::new(vec![
            TaskConfig::new("control", 100),
            TaskConfig::new("comms", 5_000).default_enabled(false),
        ])
    }

    fn started(
        clock: &ManualTick,
    ) -> WdtResult<LivenessMonitor<CountingTimer, &ManualTick>> {
        let mut monitor =
            LivenessMonitor::builder(table(), CountingTimer::default(), clock).build()?;
        monitor.init()?;
        monitor.start()?;
        Ok(monitor)
    }

    #[test]
    fn test_lifecycle_guards() -> TestResult {
        let clock = ManualTick::new(0);
        let mut monitor =
            LivenessMonitor::builder(table(), CountingTimer::default(), &clock).build()?;

        assert!(!monitor.is_init());
        assert_eq!(monitor.start(), Err(WdtError::NotInitialized));
        assert_eq!(monitor.poll(), Err(WdtError::NotInitialized));
        assert_eq!(monitor.report(TaskId::new(0)), Err(WdtError::NotInitialized));
        assert_eq!(monitor.deinit(), Err(WdtError::NotInitialized));

        monitor.init()?;
        assert_eq!(monitor.init(), Err(WdtError::AlreadyInitialized));
        assert_eq!(monitor.poll(), Err(WdtError::NotStarted));
        assert!(!monitor.is_valid());

        monitor.start()?;
        assert!(monitor.is_started());
        assert!(monitor.is_valid());

        monitor.deinit()?;
        assert!(!monitor.is_init());
        assert!(!monitor.is_started());
        Ok(())
    }

    #[test]
    fn test_report_before_start_is_accepted() -> TestResult {
        let clock = ManualTick::new(0);
        let mut monitor =
            LivenessMonitor::builder(table(), CountingTimer::default(), &clock).build()?;
        monitor.init()?;
        monitor.report(TaskId::new(0))?;
        Ok(())
    }

    #[test]
    fn test_failed_timer_init_leaves_monitor_uninitialized() -> TestResult {
        let clock = ManualTick::new(0);
        let timer = CountingTimer {
            fail_init: true,
            ..CountingTimer::default()
        };
        let mut monitor = LivenessMonitor::builder(table(), timer, &clock).build()?;

        let err = monitor.init().err().ok_or("init should fail")?;
        assert_eq!(err.kind(), crate::ErrorKind::Init);
        assert!(!monitor.is_init());
        Ok(())
    }

    #[test]
    fn test_out_of_range() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        let bad = TaskId::new(2);
        assert_eq!(monitor.report(bad), Err(WdtError::out_of_range(2, 2)));
        assert_eq!(monitor.set_enabled(bad, true), Err(WdtError::out_of_range(2, 2)));
        assert_eq!(monitor.get_enabled(bad), Err(WdtError::out_of_range(2, 2)));
        assert!(monitor.stats(bad).is_err());
        Ok(())
    }

    #[test]
    fn test_kick_period_is_respected() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;

        assert!(!monitor.poll()?.kicked);
        clock.advance(9);
        assert!(!monitor.poll()?.kicked);
        clock.advance(1);
        assert!(monitor.poll()?.kicked);
        assert!(!monitor.poll()?.kicked);
        assert_eq!(monitor.timer().kicks(), 1);
        Ok(())
    }

    #[test]
    fn test_violation_latches_and_stops_kicks() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;

        clock.advance(101);
        let outcome = monitor.poll()?;
        assert_eq!(outcome, PollOutcome { valid: false, kicked: false });

        let violation = monitor.first_violation().ok_or("expected violation")?;
        assert_eq!(violation.task, TaskId::new(0));
        assert_eq!(violation.elapsed_ms, 101);
        assert_eq!(violation.timeout_ms, 100);

        monitor.report(TaskId::new(0))?;
        for _ in 0..10 {
            clock.advance(50);
            assert!(!monitor.poll()?.valid);
        }
        assert_eq!(monitor.timer().kicks(), 0);
        Ok(())
    }

    #[test]
    fn test_restart_clears_latch() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        clock.advance(200);
        assert!(!monitor.poll()?.valid);

        monitor.start()?;
        assert!(monitor.is_valid());
        assert_eq!(monitor.first_violation(), None);
        clock.advance(10);
        assert_eq!(monitor.poll()?, PollOutcome { valid: true, kicked: true });
        Ok(())
    }

    #[test]
    fn test_each_session_records_its_own_violation() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        clock.advance(101);
        assert!(!monitor.poll()?.valid);

        monitor.start()?;
        clock.advance(150);
        assert!(!monitor.poll()?.valid);
        let violation = monitor.first_violation().ok_or("expected violation")?;
        assert_eq!(violation.task, TaskId::new(0));
        assert_eq!(violation.elapsed_ms, 150);
        Ok(())
    }

    #[test]
    fn test_violation_packing() {
        assert_eq!(unpack_violation(NO_VIOLATION), None);
        assert_eq!(
            unpack_violation(pack_violation(TaskId::new(3), 0)),
            Some((TaskId::new(3), 0))
        );
        assert_eq!(
            unpack_violation(pack_violation(TaskId::new(0), u32::MAX)),
            Some((TaskId::new(0), u32::MAX))
        );
    }

    #[test]
    fn test_restart_starts_fresh_statistics() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        let control = TaskId::new(0);
        clock.advance(10);
        monitor.report(control)?;
        clock.advance(5);
        monitor.report(control)?;

        clock.advance(100);
        monitor.start()?;
        assert_eq!(monitor.stats(control)?, Some(TaskStats::new()));
        assert!(monitor.trace()?.is_empty());

        clock.advance(40);
        monitor.report(control)?;
        let stats = monitor.stats(control)?.ok_or("stats kept")?;
        assert_eq!((stats.samples, stats.min_ms, stats.max_ms), (1, 40, 40));
        Ok(())
    }

    #[test]
    fn test_failed_kick_is_hardware_error() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        monitor.timer().fail_kick.store(true, Ordering::SeqCst);

        clock.advance(10);
        let err = monitor.poll().err().ok_or("kick should fail")?;
        assert_eq!(err.kind(), crate::ErrorKind::Hardware);

        monitor.timer().fail_kick.store(false, Ordering::SeqCst);
        assert!(monitor.poll()?.kicked);
        Ok(())
    }

    #[test]
    fn test_disabled_task_never_trips() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        let comms = monitor.task_id("comms").ok_or("comms")?;
        assert!(!monitor.get_enabled(comms)?);

        for _ in 0..100 {
            clock.advance(90);
            monitor.report(TaskId::new(0))?;
            assert!(monitor.poll()?.valid);
        }
        Ok(())
    }

    #[test]
    fn test_stats_follow_reports() -> TestResult {
        let clock = ManualTick::new(0);
        let monitor = started(&clock)?;
        let control = TaskId::new(0);

        for step in [10, 30, 20] {
            clock.advance(step);
            monitor.report(control)?;
        }

        let stats = monitor.stats(control)?.ok_or("stats kept")?;
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.min_ms, 10);
        assert_eq!(stats.max_ms, 30);
        assert_eq!(stats.avg_ms, 20);
        assert_eq!(monitor.trace()?, vec![control; 3]);

        monitor.reset_stats()?;
        assert_eq!(monitor.stats(control)?, Some(TaskStats::new()));
        assert!(monitor.trace()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_noop_recorder() -> TestResult {
        let clock = ManualTick::new(0);
        let mut monitor = LivenessMonitor::builder(table(), CountingTimer::default(), &clock)
            .recorder::<NoopRecorder>()
            .build()?;
        monitor.init()?;
        monitor.start()?;
        monitor.report(TaskId::new(0))?;
        assert_eq!(monitor.stats(TaskId::new(0))?, None);
        assert!(monitor.trace()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_builder_validates_table() {
        let clock = ManualTick::new(0);
        let result = LivenessMonitor::builder(
            TaskTable::default(),
            CountingTimer::default(),
            &clock,
        )
        .build();
        assert!(matches!(result, Err(WdtError::EmptyTaskTable)));

        let result = LivenessMonitor::builder(
            TaskTable::new(vec![TaskConfig::new("x", 5)]),
            CountingTimer::default(),
            &clock,
        )
        .build();
        assert!(matches!(result, Err(WdtError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_pre_reset_hook_reaches_timer() -> TestResult {
        let clock = ManualTick::new(0);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let timer = SoftwareTimer::new(TimerConfig::new(50)?, &clock);

        let mut monitor = LivenessMonitor::builder(table(), timer, &clock)
            .pre_reset_hook(move || flag.store(true, Ordering::SeqCst))
            .build()?;
        monitor.init()?;
        assert!(monitor.timer().has_pre_reset_hook());
        monitor.start()?;

        clock.advance(101);
        assert!(!monitor.poll()?.valid);
        clock.advance(50);
        assert!(monitor.timer().check_expiry());
        assert!(fired.load(Ordering::SeqCst));
        Ok(())
    }
}
