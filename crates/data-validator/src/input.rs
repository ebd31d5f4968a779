//! Raw alert payload as delivered by external sources

use alert_model::{AiAnalysis, Impact, SensorReading};
use serde::{Deserialize, Serialize};

/// Loosely-typed alert payload; nothing here is trusted until validated
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertInput {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub location: Option<String>,
    pub sub_location: Option<String>,
    pub equipment_id: Option<String>,
    pub equipment_name: Option<String>,
    pub severity: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub sensor_data: Option<SensorReading>,
    pub ai_analysis: Option<AiAnalysis>,
    pub impact: Option<Impact>,
}

impl AlertInput {
    /// Minimal payload with the required fields filled in
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        location: impl Into<String>,
        severity: impl Into<String>,
        category: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            message: Some(message.into()),
            location: Some(location.into()),
            severity: Some(severity.into()),
            category: Some(category.into()),
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn with_sub_location(mut self, sub_location: impl Into<String>) -> Self {
        self.sub_location = Some(sub_location.into());
        self
    }

    pub fn with_equipment(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.equipment_id = Some(id.into());
        self.equipment_name = Some(name.into());
        self
    }

    pub fn with_type(mut self, alert_type: impl Into<String>) -> Self {
        self.alert_type = Some(alert_type.into());
        self
    }

    pub fn with_ai_analysis(mut self, analysis: AiAnalysis) -> Self {
        self.ai_analysis = Some(analysis);
        self
    }

    pub fn with_sensor_data(mut self, reading: SensorReading) -> Self {
        self.sensor_data = Some(reading);
        self
    }
}
