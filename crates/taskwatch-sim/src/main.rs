//! taskwatch-sim - liveness monitor simulator
//!
//! Runs the taskwatch monitor on the host against a simulated watchdog
//! peripheral, with one reporting thread per configured task.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod output;
mod sim;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use taskwatch::{MonitorConfig, TaskTable};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::sim::{SimOptions, Stall};

#[derive(Parser)]
#[command(name = "taskwatch-sim")]
#[command(about = "Simulate the taskwatch liveness monitor against a software watchdog")]
#[command(version)]
struct Cli {
    /// Output in JSON format for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Monitor configuration file (JSON)
    #[arg(long, global = true, env = "TASKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Task table file (JSON array); a built-in demo table is used otherwise
    #[arg(long, global = true, env = "TASKWATCH_TASKS")]
    tasks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run {
        /// How long to run, in milliseconds
        #[arg(short, long, default_value_t = 2_000)]
        duration_ms: u64,

        /// Poll loop period, in microseconds
        #[arg(long, default_value_t = 1_000)]
        poll_us: u64,

        /// Refresh window of the simulated peripheral, in milliseconds
        #[arg(long, default_value_t = 250)]
        window_ms: u32,

        /// Stop one task reporting after a delay (NAME@MS)
        #[arg(long)]
        stall: Option<Stall>,

        /// Run without statistics
        #[arg(long)]
        no_stats: bool,
    },

    /// Validate the task table against the monitor configuration
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("taskwatch={log_level},taskwatch_sim={log_level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::FAILURE
        }
    }
}

fn execute_command(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let table = load_table(cli.tasks.as_deref())?;

    match &cli.command {
        Commands::Check => {
            config
                .validate_table(&table)
                .context("task table rejected")?;
            output::print_table(&table, &config, cli.json);
            Ok(())
        }
        Commands::Run {
            duration_ms,
            poll_us,
            window_ms,
            stall,
            no_stats,
        } => {
            let options = SimOptions {
                table,
                config,
                window_ms: *window_ms,
                duration: Duration::from_millis(*duration_ms),
                poll_interval: Duration::from_micros(*poll_us),
                stall: stall.clone(),
                stats: !*no_stats,
            };
            let report = sim::run(&options)?;
            output::print_report(&report, cli.json);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let Some(path) = path else {
        return Ok(MonitorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: MonitorConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn load_table(path: Option<&Path>) -> Result<TaskTable> {
    let Some(path) = path else {
        return Ok(sim::demo_table());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read task table {}", path.display()))?;
    Ok(TaskTable::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_run_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["taskwatch-sim", "run"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(
            cli.command,
            Commands::Run {
                duration_ms: 2_000,
                poll_us: 1_000,
                window_ms: 250,
                stall: None,
                no_stats: false,
            }
        ));
        Ok(())
    }

    #[test]
    fn parse_run_with_stall_and_global_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "taskwatch-sim",
            "run",
            "--stall",
            "control@300",
            "--json",
            "-vv",
        ])?;
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let Commands::Run { stall, .. } = cli.command else {
            return Err("expected run".into());
        };
        assert_eq!(
            stall,
            Some(Stall {
                task: "control".to_string(),
                after_ms: 300
            })
        );
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_stall() {
        let result = Cli::try_parse_from(["taskwatch-sim", "run", "--stall", "control"]);
        assert!(result.is_err());
    }

    #[test]
    fn load_defaults_without_files() -> TestResult {
        assert_eq!(load_config(None)?, MonitorConfig::default());
        assert_eq!(load_table(None)?, sim::demo_table());
        Ok(())
    }

    #[test]
    fn load_files() -> TestResult {
        let mut tasks = tempfile::NamedTempFile::new()?;
        write!(tasks, r#"[{{"name": "control", "timeout_ms": 50}}]"#)?;
        let table = load_table(Some(tasks.path()))?;
        assert_eq!(table.len(), 1);

        let mut config = tempfile::NamedTempFile::new()?;
        write!(config, r#"{{"kick_period_ms": 0}}"#)?;
        assert!(load_config(Some(config.path())).is_err());
        Ok(())
    }
}
