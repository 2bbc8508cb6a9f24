//! Simulation run.
//!
//! One reporter thread per task, a poll loop on the main thread and a
//! `SoftwareTimer` standing in for the watchdog peripheral. The run ends
//! after the configured duration or as soon as the simulated peripheral
//! expires.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use taskwatch::hal::{SoftwareTimer, SystemTick, TimerConfig, TimerStatus};
use taskwatch::{
    ErrorKind, LivenessMonitor, MonitorConfig, NoopRecorder, Recorder, StatsRecorder, TaskId,
    TaskStats, TaskTable,
};
use tracing::{debug, error, info, warn};

type SimMonitor<R> = LivenessMonitor<SoftwareTimer<SystemTick>, SystemTick, R>;

/// A task that stops reporting after some time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stall {
    /// Task name.
    pub task: String,
    /// Time after start at which reports stop.
    pub after_ms: u64,
}

impl FromStr for Stall {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (task, after) = s
            .split_once('@')
            .ok_or_else(|| format!("expected NAME@MS, got '{s}'"))?;
        if task.is_empty() {
            return Err("task name must not be empty".to_string());
        }
        let after_ms = after
            .parse()
            .map_err(|e| format!("invalid stall time '{after}': {e}"))?;
        Ok(Self {
            task: task.to_string(),
            after_ms,
        })
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub table: TaskTable,
    pub config: MonitorConfig,
    pub window_ms: u32,
    pub duration: Duration,
    pub poll_interval: Duration,
    pub stall: Option<Stall>,
    pub stats: bool,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub elapsed_ms: u128,
    pub valid: bool,
    pub reset: bool,
    pub kicks: u32,
    pub violation: Option<ViolationReport>,
    pub tasks: Vec<TaskReport>,
    pub trace: Vec<String>,
}

/// The deadline miss that stopped the refreshes.
#[derive(Debug, Clone, Serialize)]
pub struct ViolationReport {
    pub task: String,
    pub elapsed_ms: u32,
    pub timeout_ms: u32,
}

/// Per-task summary.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub timeout_ms: u32,
    pub enabled: bool,
    pub stats: Option<TaskStats>,
}

/// Built-in table used when no task file is given.
#[must_use]
pub fn demo_table() -> TaskTable {
    TaskTable::new(vec![
        taskwatch::TaskConfig::new("control", 100),
        taskwatch::TaskConfig::new("comms", 500).default_enabled(false),
        taskwatch::TaskConfig::new("logger", 1_500),
    ])
}

/// Run a simulation.
///
/// # Errors
///
/// Returns an error if the monitor cannot be built or brought up, or if a
/// stalled task is not in the table.
pub fn run(options: &SimOptions) -> Result<SimReport> {
    if options.stats {
        run_with::<StatsRecorder>(options)
    } else {
        run_with::<NoopRecorder>(options)
    }
}

fn run_with<R: Recorder + 'static>(options: &SimOptions) -> Result<SimReport> {
    let stalled = match &options.stall {
        Some(stall) => Some(
            options
                .table
                .find(&stall.task)
                .with_context(|| format!("stalled task '{}' is not configured", stall.task))?,
        ),
        None => None,
    };

    let clock = SystemTick::new();
    let timer_config = TimerConfig::builder()
        .window_ms(options.window_ms)
        .build()
        .context("invalid timer window")?;
    let timer = SoftwareTimer::new(timer_config, clock);

    let handle: Arc<OnceLock<Weak<SimMonitor<R>>>> = Arc::new(OnceLock::new());
    let hook_handle = Arc::clone(&handle);

    let mut monitor = LivenessMonitor::builder(options.table.clone(), timer, clock)
        .config(options.config.clone())
        .recorder::<R>()
        .pre_reset_hook(move || last_gasp(&hook_handle))
        .build()
        .context("failed to build monitor")?;
    monitor.init().context("failed to initialize monitor")?;

    let monitor = Arc::new(monitor);
    if handle.set(Arc::downgrade(&monitor)).is_err() {
        warn!("Pre-reset handle already set");
    }
    monitor.start().context("failed to start monitor")?;

    let stop = Arc::new(AtomicBool::new(false));
    let reporters = spawn_reporters(&monitor, &stop, stalled, options.stall.as_ref());

    let started = Instant::now();
    let mut reset = false;
    while started.elapsed() < options.duration {
        match monitor.poll() {
            Ok(outcome) if outcome.kicked => debug!("Watchdog refreshed"),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Hardware => {
                warn!(error = %e, "Watchdog refresh rejected");
            }
            Err(e) => {
                stop.store(true, Ordering::Release);
                return Err(e).context("poll failed");
            }
        }
        if monitor.timer().check_expiry() {
            info!("Simulated watchdog expired, system would reset now");
            reset = true;
            break;
        }
        thread::sleep(options.poll_interval);
    }
    let elapsed_ms = started.elapsed().as_millis();

    stop.store(true, Ordering::Release);
    for reporter in reporters {
        if reporter.join().is_err() {
            warn!("Reporter thread panicked");
        }
    }

    build_report(&monitor, elapsed_ms, reset)
}

fn spawn_reporters<R: Recorder + 'static>(
    monitor: &Arc<SimMonitor<R>>,
    stop: &Arc<AtomicBool>,
    stalled: Option<TaskId>,
    stall: Option<&Stall>,
) -> Vec<thread::JoinHandle<()>> {
    monitor
        .table()
        .iter()
        .map(|(id, task)| {
            let monitor = Arc::clone(monitor);
            let stop = Arc::clone(stop);
            let interval = Duration::from_millis(u64::from(task.timeout_ms / 4).max(1));
            let stall_after = stall
                .filter(|_| stalled == Some(id))
                .map(|s| Duration::from_millis(s.after_ms));
            let name = task.name.clone();

            thread::spawn(move || {
                let born = Instant::now();
                let mut announced = false;
                while !stop.load(Ordering::Acquire) {
                    if stall_after.is_some_and(|after| born.elapsed() >= after) {
                        if !announced {
                            info!(task = %name, "Task stalled");
                            announced = true;
                        }
                    } else if let Err(e) = monitor.report(id) {
                        warn!(task = %name, error = %e, "Report failed");
                    }
                    thread::sleep(interval);
                }
            })
        })
        .collect()
}

fn last_gasp<R: Recorder>(handle: &OnceLock<Weak<SimMonitor<R>>>) {
    let Some(monitor) = handle.get().and_then(Weak::upgrade) else {
        error!("Pre-reset: monitor gone");
        return;
    };
    match monitor.trace() {
        Ok(trace) => {
            let names: Vec<&str> = trace
                .iter()
                .filter_map(|id| monitor.table().get(*id))
                .map(|task| task.name.as_str())
                .collect();
            error!(trace = ?names, "Pre-reset: last reporters");
        }
        Err(e) => error!(error = %e, "Pre-reset: trace unavailable"),
    }
}

fn build_report<R: Recorder>(
    monitor: &SimMonitor<R>,
    elapsed_ms: u128,
    reset: bool,
) -> Result<SimReport> {
    let table = monitor.table();
    let name_of = |id: TaskId| {
        table
            .get(id)
            .map_or_else(|| id.to_string(), |task| task.name.clone())
    };

    let tasks = table
        .iter()
        .map(|(id, task)| {
            Ok(TaskReport {
                name: task.name.clone(),
                timeout_ms: task.timeout_ms,
                enabled: monitor.get_enabled(id)?,
                stats: monitor.stats(id)?,
            })
        })
        .collect::<Result<Vec<_>, taskwatch::WdtError>>()?;

    let violation = monitor.first_violation().map(|v| ViolationReport {
        task: name_of(v.task),
        elapsed_ms: v.elapsed_ms,
        timeout_ms: v.timeout_ms,
    });

    Ok(SimReport {
        elapsed_ms,
        valid: monitor.is_valid(),
        reset: reset || monitor.timer().status() == TimerStatus::Expired,
        kicks: monitor.timer().metrics().kick_count,
        violation,
        tasks,
        trace: monitor.trace()?.into_iter().map(name_of).collect(),
    })
}
