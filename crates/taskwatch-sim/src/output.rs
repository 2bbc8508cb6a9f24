//! Output formatting for simulator results

use anyhow::Error;
use colored::Colorize;
use serde_json::json;
use taskwatch::{MonitorConfig, TaskTable};

use crate::sim::SimReport;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "chain": error.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    for cause in error.chain().skip(1) {
        eprintln!("  {} {}", "Caused by:".yellow(), cause);
    }
}

/// Print the validated task table
pub fn print_table(table: &TaskTable, config: &MonitorConfig, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "config": config,
            "tasks": table,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format task table as JSON: {e}"),
        }
        return;
    }

    println!("{}", "Task table OK".green().bold());
    println!("  kick period: {}ms", config.kick_period_ms);
    for (id, task) in table.iter() {
        let state = if task.default_enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!(
            "  {:>3} {:<16} {:>8}ms  {}",
            id.index(),
            task.name,
            task.timeout_ms,
            state
        );
    }
}

/// Print a simulation report in the specified format
pub fn print_report(report: &SimReport, json: bool) {
    if json {
        let output = json!({
            "success": true,
            "report": report,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format report as JSON: {e}"),
        }
        return;
    }

    let verdict = if report.valid {
        "HEALTHY".green().bold()
    } else {
        "DEADLINE MISSED".red().bold()
    };
    println!("{} after {}ms, {} refreshes", verdict, report.elapsed_ms, report.kicks);

    if let Some(violation) = &report.violation {
        println!(
            "  {} '{}' silent for {}ms (timeout {}ms)",
            "violation:".red(),
            violation.task,
            violation.elapsed_ms,
            violation.timeout_ms
        );
    }
    if report.reset {
        println!("  {}", "watchdog expired: system would reset".yellow());
    }

    println!();
    println!(
        "  {:<16} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "task".bold(),
        "reports",
        "min",
        "avg",
        "max",
        "window"
    );
    for task in &report.tasks {
        let name = if task.enabled {
            task.name.normal()
        } else {
            task.name.dimmed()
        };
        match task.stats {
            Some(stats) if stats.samples > 0 => println!(
                "  {:<16} {:>8} {:>6}ms {:>6}ms {:>6}ms {:>8}",
                name,
                stats.total_reports,
                stats.min_ms,
                stats.avg_ms,
                stats.max_ms,
                stats.reports_in_window
            ),
            Some(_) => println!("  {name:<16} {:>8}", 0),
            None => println!("  {name:<16} {:>8}", "-"),
        }
    }

    if !report.trace.is_empty() {
        println!();
        println!("  last reporters: {}", report.trace.join(", "));
    }
}
