//! Per-pipeline and fleet-wide rollups

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{mean_ms, percentage, round_ms};
use crate::domain::alert::{Alert, AlertStatus};
use crate::domain::pipeline::{Pipeline, PipelineStatus};
use crate::domain::run::{Run, RunStatus};

/// Health summary of a single pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRollup {
    /// Percentage of finished runs that succeeded, `None` without finished runs
    pub success_rate: Option<f64>,
    /// Mean duration over every run that reports one
    pub avg_duration_ms: Option<i64>,
    pub last_run: Option<Run>,
}

/// Fleet-wide dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_pipelines: u64,
    pub active_pipelines: u64,
    pub failed_runs_24h: u64,
    pub success_rate_7d: f64,
    pub avg_latency_ms: i64,
    pub active_alerts: u64,
}

/// Sum and count of successful run durations
///
/// The all-time dashboard latency is a mean over the whole history, which the
/// store can total up without handing every run over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationTotals {
    pub sum_ms: i64,
    pub count: i64,
}

impl DurationTotals {
    /// Totals over the successful runs in `runs` that report a duration
    pub fn of_successful(runs: &[Run]) -> Self {
        runs.iter()
            .filter(|r| r.status == RunStatus::Success)
            .filter_map(|r| r.duration_ms)
            .fold(Self::default(), |acc, d| Self {
                sum_ms: acc.sum_ms + d,
                count: acc.count + 1,
            })
    }

    /// Rounded mean, or `None` without samples
    pub fn mean_ms(&self) -> Option<i64> {
        if self.count <= 0 {
            None
        } else {
            Some(round_ms(self.sum_ms as f64 / self.count as f64))
        }
    }
}

/// Success percentage among finished runs (one decimal)
///
/// Running and skipped runs are left out of the denominator. Returns `None`
/// when nothing has finished; callers must not read that as 0% or 100%.
pub fn success_rate(runs: &[Run]) -> Option<f64> {
    let finished = runs
        .iter()
        .filter(|r| r.status.counts_as_finished())
        .count();
    let succeeded = runs
        .iter()
        .filter(|r| r.status == RunStatus::Success)
        .count();

    percentage(succeeded, finished)
}

/// Mean `duration_ms` over runs of any status that carry one
pub fn avg_duration_ms(runs: &[Run]) -> Option<i64> {
    mean_ms(runs.iter().filter_map(|r| r.duration_ms))
}

/// Most recently started run, ties broken by the greater id
pub fn last_run(runs: &[Run]) -> Option<&Run> {
    runs.iter().max_by(|a, b| {
        a.started_at
            .cmp(&b.started_at)
            .then_with(|| a.id.cmp(&b.id))
    })
}

/// Roll up the runs of one pipeline
pub fn rollup(runs: &[Run]) -> PipelineRollup {
    PipelineRollup {
        success_rate: success_rate(runs),
        avg_duration_ms: avg_duration_ms(runs),
        last_run: last_run(runs).cloned(),
    }
}

/// Partition a mixed run list by pipeline
pub fn group_by_pipeline(runs: Vec<Run>) -> HashMap<Uuid, Vec<Run>> {
    let mut grouped: HashMap<Uuid, Vec<Run>> = HashMap::new();

    for run in runs {
        grouped.entry(run.pipeline_id).or_default().push(run);
    }

    grouped
}

/// Compute the fleet dashboard as of `now`
///
/// Windows are half-open, `[now - span, now)`; `runs` must cover at least the
/// last 7 days; older runs are ignored. `latency` holds the
/// all-time totals of successful durations. Unlike the per-pipeline rate,
/// the 7-day success rate reports 100 when no run finished in the window so
/// that a new or idle installation does not show an undefined health score.
pub fn dashboard_stats(
    pipelines: &[Pipeline],
    runs: &[Run],
    latency: DurationTotals,
    alerts: &[Alert],
    now: DateTime<Utc>,
) -> DashboardStats {
    let day_ago = now - TimeDelta::hours(24);
    let week_ago = now - TimeDelta::days(7);

    let failed_runs_24h = runs
        .iter()
        .filter(|r| r.status == RunStatus::Failed && started_within(r, day_ago, now))
        .count() as u64;

    let last_week: Vec<Run> = runs
        .iter()
        .filter(|r| started_within(r, week_ago, now))
        .cloned()
        .collect();
    let success_rate_7d = success_rate(&last_week).unwrap_or(100.0);

    let avg_latency_ms = latency.mean_ms().unwrap_or(0);

    DashboardStats {
        total_pipelines: pipelines.len() as u64,
        active_pipelines: pipelines
            .iter()
            .filter(|p| p.status == PipelineStatus::Active)
            .count() as u64,
        failed_runs_24h,
        success_rate_7d,
        avg_latency_ms,
        active_alerts: alerts
            .iter()
            .filter(|a| a.status == AlertStatus::Active)
            .count() as u64,
    }
}

fn started_within(run: &Run, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    run.started_at >= start && run.started_at < end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::AlertSeverity;
    use crate::health::testing::run_at;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 30, 0).unwrap()
    }

    fn pipeline(status: PipelineStatus) -> Pipeline {
        Pipeline {
            id: Uuid::new_v4(),
            name: "Sales Events → Warehouse".to_string(),
            description: None,
            status,
            schedule: None,
            source: None,
            destination: None,
            item_unit: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn alert(status: AlertStatus) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            pipeline_id: None,
            pipeline_name: None,
            severity: AlertSeverity::Critical,
            message: "Run failed".to_string(),
            status,
            triggered_at: now(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_rollup_excludes_skipped_from_rate() {
        let pid = Uuid::new_v4();
        let t = now() - TimeDelta::hours(1);
        let runs = vec![
            run_at(pid, RunStatus::Success, t, Some(2000)),
            run_at(pid, RunStatus::Failed, t, Some(1000)),
            run_at(pid, RunStatus::Skipped, t, None),
        ];

        let rollup = rollup(&runs);
        assert_eq!(rollup.success_rate, Some(50.0));
        assert_eq!(rollup.avg_duration_ms, Some(1500));
    }

    #[test]
    fn test_rollup_of_nothing() {
        assert_eq!(rollup(&[]), PipelineRollup::default());
    }

    #[test]
    fn test_only_running_runs_has_no_rate() {
        let pid = Uuid::new_v4();
        let runs = vec![
            run_at(pid, RunStatus::Running, now(), None),
            run_at(pid, RunStatus::Skipped, now(), None),
        ];

        assert_eq!(success_rate(&runs), None);
        assert_eq!(avg_duration_ms(&runs), None);
    }

    #[test]
    fn test_failed_duration_counts_toward_average() {
        let pid = Uuid::new_v4();
        let runs = vec![
            run_at(pid, RunStatus::Failed, now(), Some(40_000)),
            run_at(pid, RunStatus::Running, now(), None),
        ];

        assert_eq!(avg_duration_ms(&runs), Some(40_000));
        assert_eq!(success_rate(&runs), Some(0.0));
    }

    #[test]
    fn test_last_run_is_latest_start() {
        let pid = Uuid::new_v4();
        let older = run_at(pid, RunStatus::Success, now() - TimeDelta::hours(3), Some(1));
        let newest = run_at(pid, RunStatus::Running, now() - TimeDelta::minutes(5), None);
        let middle = run_at(pid, RunStatus::Failed, now() - TimeDelta::hours(1), Some(1));
        let runs = vec![older, newest.clone(), middle];

        assert_eq!(last_run(&runs).map(|r| r.id), Some(newest.id));
    }

    #[test]
    fn test_last_run_tie_breaks_by_id() {
        let pid = Uuid::new_v4();
        let a = run_at(pid, RunStatus::Success, now(), Some(1));
        let b = run_at(pid, RunStatus::Success, now(), Some(1));
        let expected = a.id.max(b.id);

        assert_eq!(last_run(&[a.clone(), b.clone()]).map(|r| r.id), Some(expected));
        assert_eq!(last_run(&[b, a]).map(|r| r.id), Some(expected));
    }

    #[test]
    fn test_group_by_pipeline() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let runs = vec![
            run_at(p1, RunStatus::Success, now(), Some(1)),
            run_at(p2, RunStatus::Failed, now(), Some(1)),
            run_at(p1, RunStatus::Failed, now(), Some(1)),
        ];

        let grouped = group_by_pipeline(runs);
        assert_eq!(grouped[&p1].len(), 2);
        assert_eq!(grouped[&p2].len(), 1);
    }

    #[test]
    fn test_dashboard_windows() {
        let pid = Uuid::new_v4();
        let runs = vec![
            // inside 24h
            run_at(pid, RunStatus::Failed, now() - TimeDelta::hours(2), Some(500)),
            // exactly at window start: included
            run_at(pid, RunStatus::Failed, now() - TimeDelta::hours(24), None),
            // at `now`: excluded
            run_at(pid, RunStatus::Failed, now(), None),
            // 3 days ago: in 7d window only
            run_at(pid, RunStatus::Success, now() - TimeDelta::days(3), Some(3000)),
            run_at(pid, RunStatus::Success, now() - TimeDelta::days(3), Some(1000)),
            // 30 days ago: only all-time latency
            run_at(pid, RunStatus::Success, now() - TimeDelta::days(30), Some(5000)),
            run_at(pid, RunStatus::Skipped, now() - TimeDelta::hours(1), None),
        ];
        let pipelines = vec![
            pipeline(PipelineStatus::Active),
            pipeline(PipelineStatus::Active),
            pipeline(PipelineStatus::Deprecated),
        ];
        let alerts = vec![
            alert(AlertStatus::Active),
            alert(AlertStatus::Acknowledged),
            alert(AlertStatus::Resolved),
        ];

        let latency = DurationTotals::of_successful(&runs);
        let stats = dashboard_stats(&pipelines, &runs, latency, &alerts, now());
        assert_eq!(stats.total_pipelines, 3);
        assert_eq!(stats.active_pipelines, 2);
        assert_eq!(stats.failed_runs_24h, 2);
        // 2 success / 4 finished within [now-7d, now)
        assert_eq!(stats.success_rate_7d, 50.0);
        assert_eq!(stats.avg_latency_ms, 3000);
        assert_eq!(stats.active_alerts, 1);
    }

    #[test]
    fn test_dashboard_idle_defaults() {
        let pid = Uuid::new_v4();
        let runs = vec![run_at(pid, RunStatus::Skipped, now() - TimeDelta::hours(1), None)];

        let stats = dashboard_stats(&[], &runs, DurationTotals::of_successful(&runs), &[], now());
        assert_eq!(stats.success_rate_7d, 100.0);
        assert_eq!(stats.avg_latency_ms, 0);
        assert_eq!(stats.failed_runs_24h, 0);

        // the per-pipeline rate stays undefined for the same runs
        assert_eq!(success_rate(&runs), None);
    }

    #[test]
    fn test_duration_totals_count_successes_only() {
        let pid = Uuid::new_v4();
        let t = now() - TimeDelta::days(40);
        let runs = vec![
            run_at(pid, RunStatus::Success, t, Some(1000)),
            run_at(pid, RunStatus::Success, t, Some(2001)),
            run_at(pid, RunStatus::Success, t, None),
            run_at(pid, RunStatus::Failed, t, Some(90_000)),
        ];

        let totals = DurationTotals::of_successful(&runs);
        assert_eq!(totals, DurationTotals { sum_ms: 3001, count: 2 });
        assert_eq!(totals.mean_ms(), Some(1501));
        assert_eq!(DurationTotals::default().mean_ms(), None);

        // history older than the windows still drives the latency figure
        let stats = dashboard_stats(&[], &[], totals, &[], now());
        assert_eq!(stats.avg_latency_ms, 1501);
        assert_eq!(stats.success_rate_7d, 100.0);
    }

    fn status_strategy() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Running),
            Just(RunStatus::Success),
            Just(RunStatus::Failed),
            Just(RunStatus::Skipped),
        ]
    }

    /// A run status with a duration that fits it; running runs have none yet
    fn run_sample() -> impl Strategy<Value = (RunStatus, Option<i64>)> {
        (status_strategy(), prop::option::of(0i64..600_000)).prop_map(|(status, duration)| {
            match status {
                RunStatus::Running => (status, None),
                _ => (status, duration),
            }
        })
    }

    proptest! {
        #[test]
        fn prop_success_rate_bounds(
            samples in prop::collection::vec(run_sample(), 0..40)
        ) {
            let pid = Uuid::new_v4();
            let runs: Vec<Run> = samples
                .iter()
                .map(|(status, duration)| run_at(pid, *status, now(), *duration))
                .collect();
            let finished = runs.iter().filter(|r| r.status.counts_as_finished()).count();

            match success_rate(&runs) {
                Some(rate) => {
                    prop_assert!(finished > 0);
                    prop_assert!((0.0..=100.0).contains(&rate));
                }
                None => prop_assert_eq!(finished, 0),
            }
        }

        #[test]
        fn prop_avg_duration_matches_mean(
            samples in prop::collection::vec(run_sample(), 0..40)
        ) {
            let pid = Uuid::new_v4();
            let runs: Vec<Run> = samples
                .iter()
                .map(|(status, duration)| run_at(pid, *status, now(), *duration))
                .collect();
            prop_assert!(runs
                .iter()
                .all(|r| r.status != RunStatus::Running || r.duration_ms.is_none()));
            let durations: Vec<i64> = samples.iter().filter_map(|(_, d)| *d).collect();

            match avg_duration_ms(&runs) {
                Some(avg) => {
                    prop_assert!(!durations.is_empty());
                    let mean = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
                    prop_assert!((avg as f64 - mean).abs() <= 0.5);
                }
                None => prop_assert!(durations.is_empty()),
            }
        }
    }
}
