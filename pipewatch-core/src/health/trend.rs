//! Latency and run-volume trends
//!
//! Both trends are bucketed in a caller-supplied time zone: the server passes
//! local time so labels and calendar days match what operators see, tests
//! pass UTC or a fixed offset.

use chrono::{DateTime, Days, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LATENCY_WINDOW_HOURS, VOLUME_WINDOW_DAYS, mean_ms};
use crate::domain::run::{Run, RunStatus};

/// One hour of the latency chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyPoint {
    /// Hour of day, `HH:00`
    pub hour_label: String,
    pub avg_ms: i64,
    pub p95_ms: i64,
}

/// One calendar day of the run-volume chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePoint {
    /// e.g. `Mon, Jan 2`
    pub day_label: String,
    pub success: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl VolumePoint {
    pub fn total(&self) -> u64 {
        self.success + self.failed + self.skipped
    }
}

/// Hourly latency buckets, oldest first
///
/// Always yields exactly [`LATENCY_WINDOW_HOURS`] points; empty hours are
/// zero-filled. Clone the iterator to walk the series again.
#[derive(Debug, Clone)]
pub struct LatencyTrend<'a, Tz: TimeZone> {
    runs: &'a [Run],
    first_hour: DateTime<Tz>,
    next: usize,
}

/// Latency trend over the 24 hours ending with the hour containing `now`
///
/// Bucket `k` covers `[h - (23 - k) hours, h - (22 - k) hours)` where `h` is
/// `now` truncated to the hour in `now`'s time zone.
pub fn latency_trend<'a, Tz: TimeZone>(
    runs: &'a [Run],
    now: &DateTime<Tz>,
) -> LatencyTrend<'a, Tz> {
    let first_hour = truncate_to_hour(now) - TimeDelta::hours(LATENCY_WINDOW_HOURS as i64 - 1);

    LatencyTrend {
        runs,
        first_hour,
        next: 0,
    }
}

impl<Tz: TimeZone> Iterator for LatencyTrend<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    type Item = LatencyPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= LATENCY_WINDOW_HOURS {
            return None;
        }

        let start = self.first_hour.clone() + TimeDelta::hours(self.next as i64);
        self.next += 1;

        Some(latency_bucket(self.runs, &start))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = LATENCY_WINDOW_HOURS.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<Tz: TimeZone> ExactSizeIterator for LatencyTrend<'_, Tz> where Tz::Offset: fmt::Display {}

fn latency_bucket<Tz: TimeZone>(runs: &[Run], start: &DateTime<Tz>) -> LatencyPoint
where
    Tz::Offset: fmt::Display,
{
    let from = start.with_timezone(&Utc);
    let until = from + TimeDelta::hours(1);

    let mut durations: Vec<i64> = runs
        .iter()
        .filter(|r| r.started_at >= from && r.started_at < until)
        .filter_map(|r| r.duration_ms)
        .collect();
    durations.sort_unstable();

    LatencyPoint {
        hour_label: start.format("%H:00").to_string(),
        avg_ms: mean_ms(durations.iter().copied()).unwrap_or(0),
        p95_ms: nearest_rank(&durations, 0.95),
    }
}

/// Nearest-rank percentile of an ascending sample, 0 when empty
///
/// Uses the zero-based index `floor(fraction * n)` without interpolation, so
/// small samples resolve toward their maximum.
pub fn nearest_rank(sorted: &[i64], fraction: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }

    let index = (fraction * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn truncate_to_hour<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let local = now.naive_local();
    let into_hour = TimeDelta::minutes(i64::from(local.minute()))
        + TimeDelta::seconds(i64::from(local.second()))
        + TimeDelta::nanoseconds(i64::from(local.nanosecond()));

    now.clone() - into_hour
}

/// Daily success/failed/skipped counts for the 7 calendar days ending today
///
/// Days are taken in `now`'s time zone. Running runs are not counted.
pub fn run_volume_trend<Tz: TimeZone>(runs: &[Run], now: &DateTime<Tz>) -> Vec<VolumePoint> {
    let tz = now.timezone();
    let today = now.date_naive();
    let first_day = today
        .checked_sub_days(Days::new(VOLUME_WINDOW_DAYS as u64 - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut points: Vec<VolumePoint> = first_day
        .iter_days()
        .take(VOLUME_WINDOW_DAYS)
        .map(|day| VolumePoint {
            day_label: day.format("%a, %b %-d").to_string(),
            success: 0,
            failed: 0,
            skipped: 0,
        })
        .collect();

    for run in runs {
        let day = run.started_at.with_timezone(&tz).date_naive();
        let offset = (day - first_day).num_days();
        if offset < 0 || offset >= points.len() as i64 {
            continue;
        }

        let point = &mut points[offset as usize];
        match run.status {
            RunStatus::Success => point.success += 1,
            RunStatus::Failed => point.failed += 1,
            RunStatus::Skipped => point.skipped += 1,
            RunStatus::Running => {}
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::testing::run_at;
    use chrono::FixedOffset;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        // a Thursday
        Utc.with_ymd_and_hms(2025, 1, 9, 14, 37, 12).unwrap()
    }

    #[test]
    fn test_nearest_rank() {
        assert_eq!(nearest_rank(&[10, 20, 30, 40], 0.95), 40);
        assert_eq!(nearest_rank(&[100, 200, 300, 400, 500], 0.95), 500);
        assert_eq!(nearest_rank(&[7], 0.95), 7);
        assert_eq!(nearest_rank(&[], 0.95), 0);

        let twenty: Vec<i64> = (1..=20).collect();
        assert_eq!(nearest_rank(&twenty, 0.95), 20);
        let hundred: Vec<i64> = (1..=100).collect();
        assert_eq!(nearest_rank(&hundred, 0.95), 96);
    }

    #[test]
    fn test_empty_latency_trend() {
        let points: Vec<LatencyPoint> = latency_trend(&[], &now()).collect();

        assert_eq!(points.len(), 24);
        assert!(points.iter().all(|p| p.avg_ms == 0 && p.p95_ms == 0));
        assert_eq!(points.first().unwrap().hour_label, "15:00");
        assert_eq!(points.last().unwrap().hour_label, "14:00");
    }

    #[test]
    fn test_latency_bucketing() {
        let pid = Uuid::new_v4();
        let hour = Utc.with_ymd_and_hms(2025, 1, 9, 14, 0, 0).unwrap();
        let runs = vec![
            run_at(pid, RunStatus::Success, hour, Some(10)),
            run_at(pid, RunStatus::Failed, hour + TimeDelta::minutes(10), Some(20)),
            run_at(pid, RunStatus::Success, hour + TimeDelta::minutes(20), Some(30)),
            run_at(pid, RunStatus::Success, hour + TimeDelta::minutes(30), Some(40)),
            // no duration: ignored
            run_at(pid, RunStatus::Running, hour + TimeDelta::minutes(35), None),
            // previous hour
            run_at(pid, RunStatus::Success, hour - TimeDelta::seconds(1), Some(1000)),
            // 24 hours back is outside the window
            run_at(pid, RunStatus::Success, hour - TimeDelta::hours(24), Some(9999)),
        ];

        let points: Vec<LatencyPoint> = latency_trend(&runs, &now()).collect();
        assert_eq!(points.len(), 24);

        let current = &points[23];
        assert_eq!(current.hour_label, "14:00");
        assert_eq!(current.avg_ms, 25);
        assert_eq!(current.p95_ms, 40);

        let previous = &points[22];
        assert_eq!(previous.hour_label, "13:00");
        assert_eq!(previous.avg_ms, 1000);
        assert_eq!(previous.p95_ms, 1000);

        assert!(points.iter().all(|p| p.avg_ms != 9999));
    }

    #[test]
    fn test_latency_trend_is_restartable() {
        let pid = Uuid::new_v4();
        let runs = vec![run_at(pid, RunStatus::Success, now(), Some(120))];

        let trend = latency_trend(&runs, &now());
        assert_eq!(trend.len(), 24);
        let first: Vec<LatencyPoint> = trend.clone().collect();
        let second: Vec<LatencyPoint> = trend.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_latency_labels_follow_time_zone() {
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        let local_now = now().with_timezone(&ist); // 20:07 local

        let pid = Uuid::new_v4();
        // 20:00 local is 14:30 UTC
        let runs = vec![run_at(
            pid,
            RunStatus::Success,
            Utc.with_ymd_and_hms(2025, 1, 9, 14, 30, 0).unwrap(),
            Some(300),
        )];

        let points: Vec<LatencyPoint> = latency_trend(&runs, &local_now).collect();
        assert_eq!(points[23].hour_label, "20:00");
        assert_eq!(points[23].avg_ms, 300);
        assert_eq!(points[0].hour_label, "21:00");
    }

    #[test]
    fn test_volume_buckets() {
        let pid = Uuid::new_v4();
        let runs = vec![
            run_at(pid, RunStatus::Success, now(), Some(1)),
            run_at(pid, RunStatus::Failed, now() - TimeDelta::hours(1), Some(1)),
            run_at(pid, RunStatus::Skipped, now() - TimeDelta::days(1), None),
            run_at(pid, RunStatus::Running, now(), None),
            // first day of the window, just after midnight
            run_at(
                pid,
                RunStatus::Success,
                Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 1).unwrap(),
                Some(1),
            ),
            // one second before the window
            run_at(
                pid,
                RunStatus::Failed,
                Utc.with_ymd_and_hms(2025, 1, 2, 23, 59, 59).unwrap(),
                Some(1),
            ),
        ];

        let points = run_volume_trend(&runs, &now());
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].day_label, "Fri, Jan 3");
        assert_eq!(points[6].day_label, "Thu, Jan 9");

        assert_eq!((points[6].success, points[6].failed, points[6].skipped), (1, 1, 0));
        assert_eq!((points[5].success, points[5].failed, points[5].skipped), (0, 0, 1));
        assert_eq!(points[0].success, 1);
        assert_eq!(points.iter().map(VolumePoint::total).sum::<u64>(), 4);
    }

    #[test]
    fn test_volume_days_follow_time_zone() {
        let pid = Uuid::new_v4();
        // 23:30 UTC on Jan 8 is already Jan 9 in UTC+2
        let runs = vec![run_at(
            pid,
            RunStatus::Success,
            Utc.with_ymd_and_hms(2025, 1, 8, 23, 30, 0).unwrap(),
            Some(1),
        )];
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();

        let utc_points = run_volume_trend(&runs, &now());
        let local_points = run_volume_trend(&runs, &now().with_timezone(&tz));

        assert_eq!(utc_points[5].success, 1);
        assert_eq!(local_points[6].success, 1);
    }

    fn terminal_status() -> impl Strategy<Value = RunStatus> {
        prop_oneof![
            Just(RunStatus::Success),
            Just(RunStatus::Failed),
            Just(RunStatus::Skipped),
        ]
    }

    proptest! {
        #[test]
        fn prop_latency_trend_has_24_buckets(
            samples in prop::collection::vec((0i64..(72 * 60), prop::option::of(0i64..100_000)), 0..60)
        ) {
            let pid = Uuid::new_v4();
            let runs: Vec<Run> = samples
                .iter()
                .map(|(minutes_ago, d)| {
                    run_at(pid, RunStatus::Success, now() - TimeDelta::minutes(*minutes_ago), *d)
                })
                .collect();

            let points: Vec<LatencyPoint> = latency_trend(&runs, &now()).collect();
            prop_assert_eq!(points.len(), LATENCY_WINDOW_HOURS);
            for p in &points {
                prop_assert!(p.avg_ms >= 0);
                prop_assert!(p.p95_ms >= 0);
            }
        }

        #[test]
        fn prop_volume_counts_every_run_in_window(
            samples in prop::collection::vec((terminal_status(), 0i64..(14 * 24 * 60)), 0..60)
        ) {
            let pid = Uuid::new_v4();
            let runs: Vec<Run> = samples
                .iter()
                .map(|(status, minutes_ago)| {
                    run_at(pid, *status, now() - TimeDelta::minutes(*minutes_ago), None)
                })
                .collect();

            let points = run_volume_trend(&runs, &now());
            prop_assert_eq!(points.len(), VOLUME_WINDOW_DAYS);

            let first_day = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
            let in_window = runs
                .iter()
                .filter(|r| r.started_at.date_naive() >= first_day)
                .count() as u64;
            prop_assert_eq!(points.iter().map(VolumePoint::total).sum::<u64>(), in_window);
        }
    }
}
