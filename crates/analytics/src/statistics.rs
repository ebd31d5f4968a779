//! Windowed Alert Statistics

use alert_model::{Alert, AlertCategory, AlertSource, AlertStatus, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::window::StatsWindow;

/// Number of locations reported in `top_locations`
const TOP_LOCATIONS: usize = 5;

/// Summary of a set of durations, in whole minutes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationStats {
    pub avg: i64,
    pub min: i64,
    pub max: i64,
    pub samples: usize,
}

impl DurationStats {
    /// Mean, min and max rounded to the nearest minute; all zero when empty
    pub fn from_minutes(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        Self {
            avg: mean.round() as i64,
            min: min.round() as i64,
            max: max.round() as i64,
            samples: values.len(),
        }
    }
}

/// Direction of the period-over-period change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Alert count compared with the preceding window of equal length
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub current: usize,
    pub previous: usize,
    pub percent: f64,
    pub direction: TrendDirection,
}

impl Trend {
    /// Percentage change from `previous` to `current`
    ///
    /// With no previous alerts the change is 0% when there are still none and
    /// +100% otherwise.
    pub fn between(current: usize, previous: usize) -> Self {
        let percent = if previous == 0 {
            if current == 0 {
                0.0
            } else {
                100.0
            }
        } else {
            (current as f64 - previous as f64) / previous as f64 * 100.0
        };

        let direction = if percent > 0.0 {
            TrendDirection::Up
        } else if percent < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        };

        Self {
            current,
            previous,
            percent,
            direction,
        }
    }
}

/// Alert count at one `location[ - subLocation]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: usize,
}

/// Aggregates over the alerts detected inside one window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub window: StatsWindow,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,

    pub total: usize,
    pub active: usize,
    pub acknowledged: usize,
    pub escalated: usize,
    pub resolved: usize,
    pub false_positive: usize,
    /// Critical or worse and not yet closed
    pub open_critical: usize,

    pub by_severity: BTreeMap<Severity, usize>,
    pub by_category: BTreeMap<AlertCategory, usize>,
    pub by_source: BTreeMap<AlertSource, usize>,

    /// Detected in the trailing 24 hours, whatever the window
    pub last_24_hours: usize,

    pub ai_generated: usize,
    /// Percent of AI-raised alerts not marked false positive
    pub ai_accuracy: f64,

    pub resolution_time: DurationStats,
    pub acknowledgement_time: DurationStats,

    pub trend: Trend,
    pub top_locations: Vec<LocationCount>,
}

/// Compute statistics for `window` ending at `now`
///
/// The windowed set is every alert with `now - window <= detectedDate <= now`;
/// the trend compares it with `[now - 2*window, now - window)`.
pub fn compute(alerts: &[Alert], window: StatsWindow, now: DateTime<Utc>) -> Statistics {
    let length = window.duration();
    // Windows reaching past the representable range start at its minimum
    let window_start = now
        .checked_sub_signed(length)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let previous_start = window_start
        .checked_sub_signed(length)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let windowed: Vec<&Alert> = alerts
        .iter()
        .filter(|a| a.detected_date >= window_start && a.detected_date <= now)
        .collect();

    let previous = alerts
        .iter()
        .filter(|a| a.detected_date >= previous_start && a.detected_date < window_start)
        .count();

    let day_start = now - Duration::hours(24);
    let last_24_hours = alerts
        .iter()
        .filter(|a| a.detected_date >= day_start && a.detected_date <= now)
        .count();

    let count_status = |status: AlertStatus| windowed.iter().filter(|a| a.status == status).count();

    let mut by_severity: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();
    let mut by_category: BTreeMap<AlertCategory, usize> =
        AlertCategory::ALL.iter().map(|c| (*c, 0)).collect();
    let mut by_source: BTreeMap<AlertSource, usize> =
        AlertSource::ALL.iter().map(|s| (*s, 0)).collect();
    for alert in &windowed {
        *by_severity.entry(alert.severity).or_default() += 1;
        *by_category.entry(alert.category).or_default() += 1;
        *by_source.entry(alert.source).or_default() += 1;
    }

    let ai_generated = by_source[&AlertSource::AiSystem];
    let ai_false_positive = windowed
        .iter()
        .filter(|a| a.source == AlertSource::AiSystem && a.status == AlertStatus::FalsePositive)
        .count();

    let resolution: Vec<f64> = windowed.iter().filter_map(|a| a.resolution_minutes()).collect();
    let acknowledgement: Vec<f64> = windowed
        .iter()
        .filter_map(|a| a.acknowledgement_minutes())
        .collect();

    let open_critical = windowed
        .iter()
        .filter(|a| a.severity >= Severity::Critical && !a.is_terminal())
        .count();

    let stats = Statistics {
        window,
        window_start,
        window_end: now,
        total: windowed.len(),
        active: count_status(AlertStatus::Active),
        acknowledged: count_status(AlertStatus::Acknowledged),
        escalated: count_status(AlertStatus::Escalated),
        resolved: count_status(AlertStatus::Resolved),
        false_positive: count_status(AlertStatus::FalsePositive),
        open_critical,
        by_severity,
        by_category,
        by_source,
        last_24_hours,
        ai_generated,
        ai_accuracy: ai_accuracy(ai_generated, ai_false_positive),
        resolution_time: DurationStats::from_minutes(&resolution),
        acknowledgement_time: DurationStats::from_minutes(&acknowledgement),
        trend: Trend::between(windowed.len(), previous),
        top_locations: top_locations(&windowed),
    };

    debug!(
        "Statistics for {} window: {} alert(s), trend {:.1}%",
        window, stats.total, stats.trend.percent
    );
    stats
}

/// 100% when no AI alerts exist
fn ai_accuracy(ai_generated: usize, false_positives: usize) -> f64 {
    if ai_generated == 0 {
        return 100.0;
    }
    (ai_generated - false_positives) as f64 / ai_generated as f64 * 100.0
}

fn top_locations(alerts: &[&Alert]) -> Vec<LocationCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for alert in alerts {
        *counts.entry(alert.location_label()).or_default() += 1;
    }

    let mut ranked: Vec<LocationCount> = counts
        .into_iter()
        .map(|(location, count)| LocationCount { location, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.location.cmp(&b.location)));
    ranked.truncate(TOP_LOCATIONS);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use alert_model::{AlertId, Impact};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 15, 12, 0, 0).unwrap()
    }

    struct Builder(Alert);

    impl Builder {
        fn detected_ago(id: u64, ago: Duration) -> Self {
            Builder(Alert {
                id: AlertId(id),
                title: "Alert".to_string(),
                message: "msg".to_string(),
                alert_type: None,
                location: "Lab A".to_string(),
                sub_location: None,
                equipment_id: None,
                equipment_name: None,
                severity: Severity::Medium,
                category: AlertCategory::Safety,
                source: AlertSource::Sensor,
                status: AlertStatus::Active,
                detected_date: now() - ago,
                acknowledged_date: None,
                acknowledged_by: None,
                acknowledgement_notes: None,
                resolved_date: None,
                resolved_by: None,
                resolution: None,
                actions_taken: vec![],
                escalated_date: None,
                escalated_by: None,
                false_positive_date: None,
                false_positive_by: None,
                assigned_to: None,
                sensor_data: None,
                ai_analysis: None,
                impact: Impact::default(),
            })
        }

        fn severity(mut self, severity: Severity) -> Self {
            self.0.severity = severity;
            self
        }

        fn source(mut self, source: AlertSource) -> Self {
            self.0.source = source;
            self
        }

        fn status(mut self, status: AlertStatus) -> Self {
            self.0.status = status;
            self
        }

        fn resolved_after(mut self, minutes: i64) -> Self {
            self.0.status = AlertStatus::Resolved;
            self.0.resolved_date = Some(self.0.detected_date + Duration::minutes(minutes));
            self
        }

        fn acknowledged_after(mut self, seconds: i64) -> Self {
            self.0.acknowledged_date = Some(self.0.detected_date + Duration::seconds(seconds));
            self
        }

        fn location(mut self, location: &str, sub: Option<&str>) -> Self {
            self.0.location = location.to_string();
            self.0.sub_location = sub.map(str::to_string);
            self
        }

        fn build(self) -> Alert {
            self.0
        }
    }

    fn at(id: u64, hours_ago: i64) -> Builder {
        Builder::detected_ago(id, Duration::hours(hours_ago))
    }

    #[test]
    fn test_last_24_hours_independent_of_window() {
        let alerts = vec![at(1, 1).build(), at(2, 25).build(), at(3, 2).build()];

        let day = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(day.last_24_hours, 2);
        assert_eq!(day.total, 2);

        let week = compute(&alerts, StatsWindow::Last7Days, now());
        assert_eq!(week.last_24_hours, 2);
        assert_eq!(week.total, 3);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let alerts = vec![
            Builder::detected_ago(1, Duration::hours(24)).build(),
            Builder::detected_ago(2, Duration::zero()).build(),
            Builder::detected_ago(3, Duration::hours(24) + Duration::seconds(1)).build(),
            Builder::detected_ago(4, Duration::minutes(-5)).build(),
        ];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.trend.previous, 1);
    }

    #[test]
    fn test_trend_from_zero_previous() {
        let alerts: Vec<Alert> = (1..=5).map(|id| at(id, 1).build()).collect();
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.trend.current, 5);
        assert_eq!(stats.trend.previous, 0);
        assert_eq!(stats.trend.percent, 100.0);
        assert_eq!(stats.trend.direction, TrendDirection::Up);

        let empty = compute(&[], StatsWindow::Last24Hours, now());
        assert_eq!(empty.trend.percent, 0.0);
        assert_eq!(empty.trend.direction, TrendDirection::Flat);
    }

    #[test]
    fn test_trend_percentage() {
        assert_eq!(Trend::between(3, 2).percent, 50.0);
        assert_eq!(Trend::between(1, 4).percent, -75.0);
        assert_eq!(Trend::between(1, 4).direction, TrendDirection::Down);
        assert_eq!(Trend::between(0, 3).percent, -100.0);
    }

    #[test]
    fn test_resolution_time() {
        let alerts = vec![
            at(1, 5).resolved_after(30).build(),
            at(2, 5).resolved_after(61).build(),
            at(3, 5).resolved_after(90).build(),
            // resolved without a date: excluded, not an error
            at(4, 5).status(AlertStatus::Resolved).build(),
            at(5, 50).resolved_after(1000).build(),
        ];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.resolved, 4);
        assert_eq!(
            stats.resolution_time,
            DurationStats {
                avg: 60,
                min: 30,
                max: 90,
                samples: 3,
            }
        );
    }

    #[test]
    fn test_resolution_time_zero_without_samples() {
        let alerts = vec![at(1, 1).build(), at(2, 1).status(AlertStatus::Resolved).build()];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.resolution_time, DurationStats::default());
    }

    #[test]
    fn test_acknowledgement_time_rounding() {
        let alerts = vec![
            at(1, 1).acknowledged_after(90).build(),
            at(2, 1).acknowledged_after(150).build(),
        ];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.acknowledgement_time.avg, 2);
        assert_eq!(stats.acknowledgement_time.min, 2);
        assert_eq!(stats.acknowledgement_time.max, 3);
    }

    #[test]
    fn test_ai_accuracy() {
        let none = compute(&[at(1, 1).build()], StatsWindow::Last24Hours, now());
        assert_eq!(none.ai_generated, 0);
        assert_eq!(none.ai_accuracy, 100.0);

        let alerts = vec![
            at(1, 1).source(AlertSource::AiSystem).build(),
            at(2, 1).source(AlertSource::AiSystem).build(),
            at(3, 1)
                .source(AlertSource::AiSystem)
                .status(AlertStatus::FalsePositive)
                .build(),
            at(4, 1).source(AlertSource::AiSystem).resolved_after(5).build(),
            at(5, 1).status(AlertStatus::FalsePositive).build(),
        ];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.ai_generated, 4);
        assert_eq!(stats.ai_accuracy, 75.0);
    }

    #[test]
    fn test_breakdowns_are_zero_filled() {
        let alerts = vec![
            at(1, 1).severity(Severity::Emergency).build(),
            at(2, 1).severity(Severity::Critical).build(),
            at(3, 1)
                .severity(Severity::Critical)
                .status(AlertStatus::FalsePositive)
                .build(),
        ];
        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        assert_eq!(stats.by_severity.len(), 5);
        assert_eq!(stats.by_severity[&Severity::Critical], 2);
        assert_eq!(stats.by_severity[&Severity::Low], 0);
        assert_eq!(stats.by_category.len(), 6);
        assert_eq!(stats.by_category[&AlertCategory::Safety], 3);
        assert_eq!(stats.open_critical, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.false_positive, 1);
    }

    #[test]
    fn test_top_locations() {
        let mut alerts = Vec::new();
        let places = [
            ("Lab A", None, 3),
            ("Lab A", Some("Hood 1"), 3),
            ("Dock", None, 1),
            ("Boiler room", None, 2),
            ("Atrium", None, 1),
            ("Roof", None, 1),
        ];
        let mut id = 0;
        for (location, sub, count) in places {
            for _ in 0..count {
                id += 1;
                alerts.push(at(id, 1).location(location, sub).build());
            }
        }

        let stats = compute(&alerts, StatsWindow::Last24Hours, now());
        let top: Vec<(&str, usize)> = stats
            .top_locations
            .iter()
            .map(|l| (l.location.as_str(), l.count))
            .collect();
        assert_eq!(
            top,
            vec![
                ("Lab A", 3),
                ("Lab A - Hood 1", 3),
                ("Boiler room", 2),
                ("Atrium", 1),
                ("Dock", 1),
            ]
        );
    }

    #[test]
    fn test_every_counted_alert_is_inside_window() {
        let alerts: Vec<Alert> = (0..200).map(|h| at(h as u64 + 1, h).build()).collect();
        for window in [
            StatsWindow::Last24Hours,
            StatsWindow::Last7Days,
            StatsWindow::custom(Duration::hours(5)).unwrap(),
        ] {
            let stats = compute(&alerts, window, now());
            let expected = alerts
                .iter()
                .filter(|a| a.detected_date >= now() - window.duration() && a.detected_date <= now())
                .count();
            assert_eq!(stats.total, expected);
            assert_eq!(stats.by_severity.values().sum::<usize>(), expected);
        }
    }

    #[test]
    fn test_serialized_shape() {
        let stats = compute(&[at(1, 1).build()], StatsWindow::Last7Days, now());
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["window"], "7d");
        assert_eq!(json["last24Hours"], 1);
        assert_eq!(json["bySeverity"]["medium"], 1);
        assert_eq!(json["bySource"]["ai_system"], 0);
        assert_eq!(json["trend"]["direction"], "up");
    }

    #[test]
    fn test_oversized_window_saturates() {
        let alerts = vec![
            Builder::detected_ago(1, Duration::hours(1)).build(),
            Builder::detected_ago(2, Duration::days(20_000)).build(),
        ];

        let widest = StatsWindow::custom(Duration::days(crate::window::MAX_WINDOW_DAYS)).unwrap();
        let stats = compute(&alerts, widest, now());
        assert_eq!(stats.total, 1);

        let unbounded = compute(&alerts, StatsWindow::Custom(Duration::days(1_000_000_000)), now());
        assert_eq!(unbounded.total, 2);
        assert_eq!(unbounded.window_start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(unbounded.last_24_hours, 1);
    }
}
