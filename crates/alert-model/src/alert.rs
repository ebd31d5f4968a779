//! Alert Entity

use crate::enums::{AlertCategory, AlertSource, AlertStatus, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned alert identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Threshold reading attached to sensor-raised alerts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_name: String,
    pub current_value: f64,
    pub threshold_value: f64,
    pub unit: String,
}

/// Output of the anomaly detector that raised an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    /// Detector confidence, 0..=100
    pub confidence: f64,
    pub prediction: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Assessed impact of the condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub safety_risk: String,
    pub operational_impact: String,
    /// Hours
    pub estimated_downtime: Option<f64>,
    pub potential_cost: Option<f64>,
}

impl Default for Impact {
    fn default() -> Self {
        Self {
            safety_risk: "low".to_string(),
            operational_impact: "low".to_string(),
            estimated_downtime: None,
            potential_cost: None,
        }
    }
}

/// Validated ingest payload, everything an alert carries before the store
/// assigns its identity and detection time
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub alert_type: Option<String>,
    pub location: String,
    pub sub_location: Option<String>,
    pub equipment_id: Option<String>,
    pub equipment_name: Option<String>,
    pub severity: Severity,
    pub category: AlertCategory,
    pub source: AlertSource,
    pub sensor_data: Option<SensorReading>,
    pub ai_analysis: Option<AiAnalysis>,
    pub impact: Impact,
}

/// A safety or equipment alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub location: String,
    pub sub_location: Option<String>,
    pub equipment_id: Option<String>,
    pub equipment_name: Option<String>,
    pub severity: Severity,
    pub category: AlertCategory,
    pub source: AlertSource,
    pub status: AlertStatus,
    pub detected_date: DateTime<Utc>,

    pub acknowledged_date: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub acknowledgement_notes: Option<String>,

    pub resolved_date: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution: Option<String>,
    pub actions_taken: Vec<String>,

    pub escalated_date: Option<DateTime<Utc>>,
    pub escalated_by: Option<String>,

    pub false_positive_date: Option<DateTime<Utc>>,
    pub false_positive_by: Option<String>,

    pub assigned_to: Option<String>,

    pub sensor_data: Option<SensorReading>,
    pub ai_analysis: Option<AiAnalysis>,
    pub impact: Impact,
}

impl Alert {
    /// Materialize a freshly ingested alert
    pub fn from_new(id: AlertId, new: NewAlert, detected_date: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            message: new.message,
            alert_type: new.alert_type,
            location: new.location,
            sub_location: new.sub_location,
            equipment_id: new.equipment_id,
            equipment_name: new.equipment_name,
            severity: new.severity,
            category: new.category,
            source: new.source,
            status: AlertStatus::Active,
            detected_date,
            acknowledged_date: None,
            acknowledged_by: None,
            acknowledgement_notes: None,
            resolved_date: None,
            resolved_by: None,
            resolution: None,
            actions_taken: Vec::new(),
            escalated_date: None,
            escalated_by: None,
            false_positive_date: None,
            false_positive_by: None,
            assigned_to: None,
            sensor_data: new.sensor_data,
            ai_analysis: new.ai_analysis,
            impact: new.impact,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `location` or `location - subLocation`
    pub fn location_label(&self) -> String {
        match self.sub_location.as_deref() {
            Some(sub) if !sub.is_empty() => format!("{} - {}", self.location, sub),
            _ => self.location.clone(),
        }
    }

    /// Clamp a transition timestamp so it never precedes detection
    pub fn stamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.detected_date)
    }

    /// Minutes from detection until resolution, when resolved with a date
    pub fn resolution_minutes(&self) -> Option<f64> {
        if self.status != AlertStatus::Resolved {
            return None;
        }
        self.resolved_date.map(|at| minutes_between(self.detected_date, at))
    }

    /// Minutes from detection until acknowledgement
    pub fn acknowledgement_minutes(&self) -> Option<f64> {
        self.acknowledged_date
            .map(|at| minutes_between(self.detected_date, at))
    }
}

fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> Alert {
        let detected = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        Alert::from_new(
            AlertId(7),
            NewAlert {
                title: "Gas leak".to_string(),
                message: "Methane above threshold".to_string(),
                alert_type: Some("gas_detection".to_string()),
                location: "Lab B".to_string(),
                sub_location: Some("Fume hood 2".to_string()),
                equipment_id: None,
                equipment_name: None,
                severity: Severity::Critical,
                category: AlertCategory::Safety,
                source: AlertSource::Sensor,
                sensor_data: None,
                ai_analysis: None,
                impact: Impact::default(),
            },
            detected,
        )
    }

    #[test]
    fn test_new_alert_is_active() {
        let alert = sample();
        assert_eq!(alert.status, AlertStatus::Active);
        assert!(alert.resolved_date.is_none());
        assert!(alert.actions_taken.is_empty());
    }

    #[test]
    fn test_location_label() {
        let mut alert = sample();
        assert_eq!(alert.location_label(), "Lab B - Fume hood 2");
        alert.sub_location = None;
        assert_eq!(alert.location_label(), "Lab B");
    }

    #[test]
    fn test_stamp_never_precedes_detection() {
        let alert = sample();
        let earlier = alert.detected_date - Duration::minutes(5);
        assert_eq!(alert.stamp(earlier), alert.detected_date);
        let later = alert.detected_date + Duration::minutes(5);
        assert_eq!(alert.stamp(later), later);
    }

    #[test]
    fn test_resolution_minutes_requires_resolved_status() {
        let mut alert = sample();
        alert.resolved_date = Some(alert.detected_date + Duration::minutes(90));
        assert_eq!(alert.resolution_minutes(), None);

        alert.status = AlertStatus::Resolved;
        assert_eq!(alert.resolution_minutes(), Some(90.0));

        alert.resolved_date = None;
        assert_eq!(alert.resolution_minutes(), None);
    }

    #[test]
    fn test_type_field_wire_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "gas_detection");
        assert_eq!(json["detectedDate"], "2026-03-01T08:00:00Z");
        assert_eq!(json["severity"], "critical");
    }
}
