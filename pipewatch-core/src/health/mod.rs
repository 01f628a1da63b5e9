//! Health aggregation
//!
//! Pure derivation of dashboard metrics from raw run records: per-pipeline
//! rollups, fleet-wide statistics, and the latency and run-volume trends.
//!
//! Nothing in this module performs I/O or mutates its inputs. Every function
//! is total: empty inputs produce the documented null/zero defaults instead
//! of errors, so callers can hand over whatever snapshot the store returned.

pub mod rollup;
pub mod trend;

pub use rollup::{
    DashboardStats, DurationTotals, PipelineRollup, avg_duration_ms, dashboard_stats, group_by_pipeline,
    last_run, rollup, success_rate,
};
pub use trend::{
    LatencyPoint, LatencyTrend, VolumePoint, latency_trend, nearest_rank, run_volume_trend,
};

/// Number of hourly buckets in the latency trend
pub const LATENCY_WINDOW_HOURS: usize = 24;

/// Number of daily buckets in the run-volume trend
pub const VOLUME_WINDOW_DAYS: usize = 7;

/// Round a millisecond value to the nearest integer, halves upward
pub(crate) fn round_ms(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// `part / whole` as a percentage with one decimal, or `None` when `whole` is 0
pub(crate) fn percentage(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }

    let ratio = part as f64 / whole as f64;
    Some((ratio * 1000.0 + 0.5).floor() / 10.0)
}

/// Rounded arithmetic mean, or `None` for an empty sample
pub(crate) fn mean_ms(values: impl IntoIterator<Item = i64>) -> Option<i64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v as f64, count + 1));

    if count == 0 {
        None
    } else {
        Some(round_ms(sum / count as f64))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use crate::domain::run::{Run, RunStatus};

    pub fn run_at(
        pipeline_id: Uuid,
        status: RunStatus,
        started_at: DateTime<Utc>,
        duration_ms: Option<i64>,
    ) -> Run {
        Run {
            id: Uuid::new_v4(),
            pipeline_id,
            status,
            started_at,
            finished_at: duration_ms.map(|d| started_at + chrono::TimeDelta::milliseconds(d)),
            duration_ms,
            items_processed: None,
            error_message: None,
            created_at: started_at,
        }
    }
}
