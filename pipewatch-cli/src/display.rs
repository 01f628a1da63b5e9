//! Terminal formatting helpers

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use pipewatch_core::domain::alert::{AlertSeverity, AlertStatus};
use pipewatch_core::domain::pipeline::PipelineStatus;
use pipewatch_core::domain::run::RunStatus;

pub fn run_status(status: RunStatus) -> ColoredString {
    match status {
        RunStatus::Running => status.as_str().blue(),
        RunStatus::Success => status.as_str().green(),
        RunStatus::Failed => status.as_str().red(),
        RunStatus::Skipped => status.as_str().yellow(),
    }
}

pub fn pipeline_status(status: PipelineStatus) -> ColoredString {
    match status {
        PipelineStatus::Active => status.as_str().green(),
        PipelineStatus::Inactive => status.as_str().yellow(),
        PipelineStatus::Deprecated => status.as_str().dimmed(),
    }
}

pub fn alert_severity(severity: AlertSeverity) -> ColoredString {
    match severity {
        AlertSeverity::Critical => severity.as_str().red().bold(),
        AlertSeverity::Warning => severity.as_str().yellow(),
        AlertSeverity::Info => severity.as_str().cyan(),
    }
}

pub fn alert_status(status: AlertStatus) -> ColoredString {
    match status {
        AlertStatus::Active => status.as_str().red(),
        AlertStatus::Acknowledged => status.as_str().yellow(),
        AlertStatus::Resolved => status.as_str().green(),
    }
}

/// Success rate with a colour band: green at 95 and above, red below 80
pub fn success_rate(rate: Option<f64>) -> ColoredString {
    match rate {
        None => "n/a".dimmed(),
        Some(r) if r >= 95.0 => format!("{r:.1}%").green(),
        Some(r) if r >= 80.0 => format!("{r:.1}%").yellow(),
        Some(r) => format!("{r:.1}%").red(),
    }
}

/// Human-readable duration: `850ms`, `12.3s`, `4m 05s`
pub fn duration(ms: Option<i64>) -> String {
    let Some(ms) = ms else {
        return "-".to_string();
    };

    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1_000)
    }
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fixed-width bar scaled against `max`
pub fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}
