use crate::report::{DerivedSeriesPoint, ResourceAnalytics, ServiceSeriesPoint, SummaryStatistics};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Utc};
use core_types::{ResourceSnapshot, ServiceSnapshot, Timestamped};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::fmt::Write;

/// Default chart label, day/month then hour:minute.
pub const DEFAULT_LABEL_FORMAT: &str = "%d/%m %H:%M";

/// A stateless calculator for deriving chart series and summary statistics
/// from a hospital's snapshot history.
#[derive(Debug, Clone)]
pub struct ResourceAnalyticsEngine {
    label_format: String,
}

impl Default for ResourceAnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceAnalyticsEngine {
    pub fn new() -> Self {
        Self::with_label_format(DEFAULT_LABEL_FORMAT)
    }

    /// Uses a `chrono` strftime pattern for the point labels.
    ///
    /// A pattern `chrono` cannot parse is replaced by `DEFAULT_LABEL_FORMAT`.
    pub fn with_label_format(label_format: impl Into<String>) -> Self {
        let label_format = label_format.into();
        if is_valid_label_format(&label_format) {
            return Self { label_format };
        }
        tracing::warn!(%label_format, "Unusable label format, falling back to the default.");
        Self {
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
        }
    }

    /// The main entry point: selects the trailing window and derives both the
    /// chart series and the summary from it.
    ///
    /// # Arguments
    ///
    /// * `history` - Snapshots for one hospital, most recent first, as returned
    ///   by the history provider.
    /// * `window_days` - The length of the trailing window.
    /// * `now` - The reference instant the window ends at.
    pub fn analyze(
        &self,
        history: &[ResourceSnapshot],
        window_days: u32,
        now: DateTime<Utc>,
    ) -> ResourceAnalytics {
        let windowed = self.select_window(history, window_days, now);
        let series = self.to_chart_series(&windowed);
        let summary = self.compute_summary(&windowed);

        ResourceAnalytics {
            window_days,
            snapshot_count: windowed.len(),
            series,
            summary,
        }
    }

    /// Keeps the records captured in `[now - window_days, now]`, both bounds
    /// inclusive, in their original relative order.
    ///
    /// The input does not need to be sorted. An empty result is valid.
    pub fn select_window<T>(&self, history: &[T], window_days: u32, now: DateTime<Utc>) -> Vec<T>
    where
        T: Timestamped + Clone,
    {
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let windowed: Vec<T> = history
            .iter()
            .filter(|record| {
                let at = record.timestamp();
                at >= cutoff && at <= now
            })
            .cloned()
            .collect();

        tracing::debug!(
            window_days,
            %cutoff,
            total = history.len(),
            kept = windowed.len(),
            "Selected analysis window."
        );
        windowed
    }

    /// Like `select_window`, ending at the current wall-clock time.
    pub fn select_window_now<T>(&self, history: &[T], window_days: u32) -> Vec<T>
    where
        T: Timestamped + Clone,
    {
        self.select_window(history, window_days, Utc::now())
    }

    /// Maps a most-recent-first window to chart points, oldest first.
    pub fn to_chart_series(&self, windowed: &[ResourceSnapshot]) -> Vec<DerivedSeriesPoint> {
        windowed
            .iter()
            .rev()
            .map(|snapshot| DerivedSeriesPoint {
                label: self.label(snapshot.captured_at),
                captured_at: snapshot.captured_at,
                available_beds: snapshot.available_beds,
                occupied_beds: occupied_beds(snapshot),
                available_doctors: snapshot.available_doctors,
                occupancy_rate_percent: occupancy_percent(snapshot),
            })
            .collect()
    }

    /// Reduces a window to its summary. Order does not matter.
    ///
    /// Per-snapshot rates stay unrounded; only the final averages and maximum
    /// are rounded, half away from zero.
    pub fn compute_summary(&self, windowed: &[ResourceSnapshot]) -> SummaryStatistics {
        if windowed.is_empty() {
            return SummaryStatistics::default();
        }

        let count = Decimal::from(windowed.len());
        let rates: Vec<Decimal> = windowed.iter().map(occupancy_rate).collect();

        let rate_sum: Decimal = rates.iter().sum();
        let max_rate = rates.iter().copied().max().unwrap_or(Decimal::ZERO);
        let minimum_available_beds = windowed
            .iter()
            .map(|s| s.available_beds)
            .min()
            .unwrap_or(0);
        let doctors_sum: i64 = windowed.iter().map(|s| i64::from(s.available_doctors)).sum();

        SummaryStatistics {
            average_occupancy_percent: round_to_i64(rate_sum / count),
            max_occupancy_percent: round_to_i64(max_rate),
            minimum_available_beds,
            average_available_doctors: round_to_i64(Decimal::from(doctors_sum) / count),
        }
    }

    /// Maps a most-recent-first service history to chart points, oldest first.
    pub fn to_service_series(&self, windowed: &[ServiceSnapshot]) -> Vec<ServiceSeriesPoint> {
        windowed
            .iter()
            .rev()
            .map(|snapshot| ServiceSeriesPoint {
                label: self.label(snapshot.recorded_at),
                recorded_at: snapshot.recorded_at,
                service_type: snapshot.service_type,
                queue_length: snapshot.queue_length,
                wait_time_minutes: snapshot.wait_time,
                capacity: snapshot.capacity,
                status: snapshot.availability_status,
            })
            .collect()
    }

    fn label(&self, at: DateTime<Utc>) -> String {
        let mut label = String::new();
        if write!(label, "{}", at.format(&self.label_format)).is_ok() {
            return label;
        }
        label.clear();
        let _ = write!(label, "{}", at.format(DEFAULT_LABEL_FORMAT));
        label
    }
}

/// Whether `chrono` accepts every specifier in a strftime pattern.
pub fn is_valid_label_format(label_format: &str) -> bool {
    !label_format.trim().is_empty()
        && StrftimeItems::new(label_format).all(|item| !matches!(item, Item::Error))
}

/// The unrounded share of beds in use, in percent.
///
/// Zero when the snapshot has no beds. Counts are not re-validated, so a
/// snapshot with more available than total beds yields a negative rate.
pub fn occupancy_rate(snapshot: &ResourceSnapshot) -> Decimal {
    if snapshot.total_beds <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(occupied_beds(snapshot)) * Decimal::ONE_HUNDRED
        / Decimal::from(snapshot.total_beds)
}

/// The occupancy rate of a single snapshot, rounded half away from zero.
pub fn occupancy_percent(snapshot: &ResourceSnapshot) -> i64 {
    round_to_i64(occupancy_rate(snapshot))
}

fn occupied_beds(snapshot: &ResourceSnapshot) -> i64 {
    i64::from(snapshot.total_beds) - i64::from(snapshot.available_beds)
}

fn round_to_i64(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::{AvailabilityStatus, ServiceType};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn snapshot(
        captured_at: DateTime<Utc>,
        total_beds: i32,
        available_beds: i32,
        available_doctors: i32,
    ) -> ResourceSnapshot {
        ResourceSnapshot {
            id: Uuid::new_v4(),
            hospital_id: Uuid::nil(),
            captured_at,
            total_beds,
            available_beds,
            total_doctors: 20,
            available_doctors,
            on_duty_staff: 0,
            beds_by_service: HashMap::new(),
            doctors_by_service: HashMap::new(),
        }
    }

    /// Two snapshots, most recent first: 80% then 50% occupancy.
    fn two_day_history() -> Vec<ResourceSnapshot> {
        vec![
            snapshot(now(), 100, 20, 6),
            snapshot(now() - Duration::days(1), 100, 50, 9),
        ]
    }

    #[test]
    fn chart_series_is_chronological() {
        let engine = ResourceAnalyticsEngine::new();
        let windowed = engine.select_window(&two_day_history(), 7, now());
        let series = engine.to_chart_series(&windowed);

        let rates: Vec<i64> = series.iter().map(|p| p.occupancy_rate_percent).collect();
        assert_eq!(rates, vec![50, 80]);
        assert_eq!(series[0].occupied_beds, 50);
        assert_eq!(series[1].available_beds, 20);
        assert_eq!(series[0].label, "14/03 12:00");
        assert_eq!(series[1].label, "15/03 12:00");
    }

    #[test]
    fn summary_of_two_day_history() {
        let engine = ResourceAnalyticsEngine::new();
        let windowed = engine.select_window(&two_day_history(), 7, now());
        let summary = engine.compute_summary(&windowed);

        assert_eq!(
            summary,
            SummaryStatistics {
                average_occupancy_percent: 65,
                max_occupancy_percent: 80,
                minimum_available_beds: 20,
                // (6 + 9) / 2 = 7.5 rounds away from zero.
                average_available_doctors: 8,
            }
        );
    }

    #[test]
    fn zero_beds_yield_zero_occupancy() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![snapshot(now(), 0, 0, 0)];

        assert_eq!(occupancy_rate(&history[0]), Decimal::ZERO);
        let series = engine.to_chart_series(&history);
        assert_eq!(series[0].occupancy_rate_percent, 0);
        assert_eq!(engine.compute_summary(&history).average_occupancy_percent, 0);
    }

    #[test]
    fn empty_window_summary_is_all_zero() {
        let engine = ResourceAnalyticsEngine::new();
        assert_eq!(engine.compute_summary(&[]), SummaryStatistics::default());
        assert!(engine.to_chart_series(&[]).is_empty());
    }

    #[test]
    fn one_day_window_drops_older_snapshots() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![
            snapshot(now() - Duration::hours(25), 100, 10, 3),
            snapshot(now() - Duration::days(3), 100, 40, 3),
        ];

        let windowed = engine.select_window(&history, 1, now());
        assert!(windowed.is_empty());
        assert_eq!(engine.compute_summary(&windowed), SummaryStatistics::default());
    }

    #[test]
    fn window_bounds_are_inclusive_and_exclude_the_future() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![
            snapshot(now() + Duration::seconds(1), 10, 1, 1),
            snapshot(now(), 10, 2, 1),
            snapshot(now() - Duration::days(7), 10, 3, 1),
            snapshot(now() - Duration::days(7) - Duration::seconds(1), 10, 4, 1),
        ];

        let kept: Vec<i32> = engine
            .select_window(&history, 7, now())
            .iter()
            .map(|s| s.available_beds)
            .collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[test]
    fn select_window_keeps_relative_order_of_unsorted_input() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![
            snapshot(now() - Duration::days(2), 10, 1, 1),
            snapshot(now() - Duration::days(40), 10, 2, 1),
            snapshot(now() - Duration::days(5), 10, 3, 1),
            snapshot(now() - Duration::days(1), 10, 4, 1),
        ];

        let kept: Vec<i32> = engine
            .select_window(&history, 30, now())
            .iter()
            .map(|s| s.available_beds)
            .collect();
        assert_eq!(kept, vec![1, 3, 4]);
    }

    #[test]
    fn select_window_is_idempotent() {
        let engine = ResourceAnalyticsEngine::new();
        let history: Vec<ResourceSnapshot> = (0..20)
            .map(|day| snapshot(now() - Duration::days(day), 50, (day % 7) as i32, 2))
            .collect();

        let once = engine.select_window(&history, 7, now());
        let twice = engine.select_window(&once, 7, now());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 8);
    }

    #[test]
    fn chart_series_reverses_descending_input() {
        let engine = ResourceAnalyticsEngine::new();
        let history: Vec<ResourceSnapshot> = (0..10)
            .map(|hour| snapshot(now() - Duration::hours(hour), 40, hour as i32, 1))
            .collect();

        let series = engine.to_chart_series(&history);
        assert_eq!(series.len(), history.len());

        let mut timestamps: Vec<DateTime<Utc>> = series.iter().map(|p| p.captured_at).collect();
        timestamps.reverse();
        let original: Vec<DateTime<Utc>> = history.iter().map(|s| s.captured_at).collect();
        assert_eq!(timestamps, original);
    }

    #[test]
    fn average_is_bounded_by_max_for_well_formed_input() {
        let engine = ResourceAnalyticsEngine::new();
        let history: Vec<ResourceSnapshot> = (0..30)
            .map(|i| {
                let total = 10 + i * 3;
                snapshot(now() - Duration::hours(i64::from(i)), total, (i * 7) % (total + 1), 4)
            })
            .collect();

        let summary = engine.compute_summary(&history);
        assert!(summary.average_occupancy_percent >= 0);
        assert!(summary.average_occupancy_percent <= summary.max_occupancy_percent);
        assert!(summary.max_occupancy_percent <= 100);
    }

    #[test]
    fn aggregates_round_only_at_the_end() {
        let engine = ResourceAnalyticsEngine::new();
        // 0.5% and 0.4%: per-point rounding would give (1 + 0) / 2 = 0.5 -> 1.
        let history = vec![
            snapshot(now(), 200, 199, 1),
            snapshot(now() - Duration::hours(1), 500, 498, 1),
        ];

        let points: Vec<i64> = engine
            .to_chart_series(&history)
            .iter()
            .map(|p| p.occupancy_rate_percent)
            .collect();
        assert_eq!(points, vec![0, 1]);

        let summary = engine.compute_summary(&history);
        assert_eq!(summary.average_occupancy_percent, 0);
        assert_eq!(summary.max_occupancy_percent, 1);
    }

    #[test]
    fn thirds_keep_full_precision() {
        let third = snapshot(now(), 3, 2, 1);
        assert_eq!(occupancy_rate(&third).round_dp(4), dec!(33.3333));
    }

    #[test]
    fn midpoint_rates_round_away_from_zero() {
        let engine = ResourceAnalyticsEngine::new();
        // 1 of 8 beds occupied is 12.5%.
        let history = vec![snapshot(now(), 8, 7, 1)];

        assert_eq!(occupancy_rate(&history[0]), dec!(12.5));
        assert_eq!(engine.to_chart_series(&history)[0].occupancy_rate_percent, 13);
        assert_eq!(engine.compute_summary(&history).max_occupancy_percent, 13);
    }

    #[test]
    fn broken_invariants_pass_through_unchecked() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![snapshot(now(), 10, 15, 1)];

        let series = engine.to_chart_series(&history);
        assert_eq!(series[0].occupied_beds, -5);
        assert_eq!(series[0].occupancy_rate_percent, -50);
    }

    #[test]
    fn analyze_combines_window_series_and_summary() {
        let engine = ResourceAnalyticsEngine::with_label_format("%Y-%m-%d");
        let mut history = two_day_history();
        history.push(snapshot(now() - Duration::days(10), 100, 0, 0));

        let analytics = engine.analyze(&history, 7, now());
        assert_eq!(analytics.window_days, 7);
        assert_eq!(analytics.snapshot_count, 2);
        assert!(!analytics.is_empty());
        assert_eq!(analytics.series[0].label, "2024-03-14");
        assert_eq!(analytics.summary.average_occupancy_percent, 65);
    }

    #[test]
    fn unusable_label_format_falls_back_to_default() {
        let engine = ResourceAnalyticsEngine::with_label_format("%Q");
        let series = engine.to_chart_series(&two_day_history());
        assert_eq!(series[0].label, "14/03 12:00");

        assert!(!is_valid_label_format("%Q"));
        assert!(!is_valid_label_format(""));
        assert!(is_valid_label_format("%Y-%m-%d %H:%M"));
    }

    #[test]
    fn zero_day_window_keeps_only_the_current_instant() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![
            snapshot(now(), 10, 1, 1),
            snapshot(now() - Duration::seconds(1), 10, 2, 1),
        ];

        let kept = engine.select_window(&history, 0, now());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].available_beds, 1);
    }

    #[test]
    fn huge_window_clamps_to_the_earliest_instant() {
        let engine = ResourceAnalyticsEngine::new();
        let history = vec![
            snapshot(now(), 10, 1, 1),
            snapshot(DateTime::<Utc>::MIN_UTC, 10, 2, 1),
        ];

        let kept = engine.select_window(&history, u32::MAX, now());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn service_history_is_windowed_and_chronological() {
        let engine = ResourceAnalyticsEngine::new();
        let entry = |hours_ago: i64, queue_length: i32| ServiceSnapshot {
            id: Uuid::new_v4(),
            hospital_id: Uuid::nil(),
            service_type: ServiceType::Emergency,
            queue_length,
            wait_time: queue_length * 5,
            capacity: 10,
            availability_status: AvailabilityStatus::Available,
            recorded_at: now() - Duration::hours(hours_ago),
        };
        let history = vec![entry(1, 3), entry(5, 7), entry(30, 9)];

        let windowed = engine.select_window(&history, 1, now());
        let series = engine.to_service_series(&windowed);

        let queues: Vec<i32> = series.iter().map(|p| p.queue_length).collect();
        assert_eq!(queues, vec![7, 3]);
        assert_eq!(series[0].wait_time_minutes, 35);
    }
}
