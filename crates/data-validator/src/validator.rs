//! Alert Payload Validator

use crate::error::ValidationError;
use crate::input::AlertInput;
use crate::normalizer::{normalize_list, normalize_optional, normalize_text};
use alert_model::{
    AiAnalysis, AlertCategory, AlertError, AlertSource, Impact, NewAlert, SensorReading, Severity,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Longest accepted title
    pub max_title_len: usize,
    /// Longest accepted message
    pub max_message_len: usize,
    /// AI confidence valid range (percent)
    pub confidence_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_title_len: 200,
            max_message_len: 4000,
            confidence_range: (0.0, 100.0),
        }
    }
}

/// Result of checking a payload
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the payload is acceptable
    pub valid: bool,
    /// Every problem found
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Schema and enum validator for alert payloads
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Report all problems in a payload without consuming it
    pub fn check(&self, input: &AlertInput) -> ValidationResult {
        match self.build(input.clone()) {
            Ok(_) => ValidationResult::valid(),
            Err(errors) => ValidationResult::invalid(errors),
        }
    }

    /// Turn a raw payload into a typed, normalized alert
    pub fn validate(&self, input: AlertInput) -> Result<NewAlert, AlertError> {
        self.build(input).map_err(|errors| {
            warn!("Rejected alert payload with {} problem(s)", errors.len());
            ValidationError::into_alert_error(errors)
        })
    }

    fn build(&self, input: AlertInput) -> Result<NewAlert, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let title = required_text(&mut errors, "title", input.title);
        let message = required_text(&mut errors, "message", input.message);
        let location = required_text(&mut errors, "location", input.location);
        self.check_length(&mut errors, "title", &title, self.config.max_title_len);
        self.check_length(&mut errors, "message", &message, self.config.max_message_len);

        let severity = required_enum::<Severity>(&mut errors, "severity", input.severity);
        let category = required_enum::<AlertCategory>(&mut errors, "category", input.category);
        let source = required_enum::<AlertSource>(&mut errors, "source", input.source);

        let sensor_data = input.sensor_data.map(|r| self.sensor_reading(&mut errors, r));
        let ai_analysis = input.ai_analysis.map(|a| self.ai_analysis(&mut errors, a));
        let impact = self.impact(&mut errors, input.impact.unwrap_or_default());

        match (severity, category, source) {
            (Some(severity), Some(category), Some(source)) if errors.is_empty() => {
                debug!("Validated {} {} alert '{}'", severity, category, title);
                Ok(NewAlert {
                    title,
                    message,
                    alert_type: normalize_optional(input.alert_type),
                    location,
                    sub_location: normalize_optional(input.sub_location),
                    equipment_id: normalize_optional(input.equipment_id),
                    equipment_name: normalize_optional(input.equipment_name),
                    severity,
                    category,
                    source,
                    sensor_data,
                    ai_analysis,
                    impact,
                })
            }
            _ => Err(errors),
        }
    }

    fn check_length(
        &self,
        errors: &mut Vec<ValidationError>,
        field: &'static str,
        value: &str,
        max: usize,
    ) {
        let len = value.chars().count();
        if len > max {
            errors.push(ValidationError::TooLong { field, len, max });
        }
    }

    fn sensor_reading(
        &self,
        errors: &mut Vec<ValidationError>,
        reading: SensorReading,
    ) -> SensorReading {
        let sensor_name = required_text(errors, "sensorData.sensorName", Some(reading.sensor_name));
        let unit = required_text(errors, "sensorData.unit", Some(reading.unit));
        if !reading.current_value.is_finite() {
            errors.push(ValidationError::NotFinite("sensorData.currentValue"));
        }
        if !reading.threshold_value.is_finite() {
            errors.push(ValidationError::NotFinite("sensorData.thresholdValue"));
        }
        SensorReading {
            sensor_name,
            unit,
            ..reading
        }
    }

    fn ai_analysis(&self, errors: &mut Vec<ValidationError>, analysis: AiAnalysis) -> AiAnalysis {
        let (min, max) = self.config.confidence_range;
        if !(min..=max).contains(&analysis.confidence) {
            errors.push(ValidationError::OutOfRange {
                field: "aiAnalysis.confidence",
                value: analysis.confidence,
                min,
                max,
            });
        }
        AiAnalysis {
            prediction: normalize_text(&analysis.prediction),
            recommendations: normalize_list(analysis.recommendations),
            ..analysis
        }
    }

    fn impact(&self, errors: &mut Vec<ValidationError>, impact: Impact) -> Impact {
        let non_negative = [
            ("impact.estimatedDowntime", impact.estimated_downtime),
            ("impact.potentialCost", impact.potential_cost),
        ];
        for (field, value) in non_negative {
            if let Some(value) = value {
                if !value.is_finite() {
                    errors.push(ValidationError::NotFinite(field));
                } else if value < 0.0 {
                    errors.push(ValidationError::OutOfRange {
                        field,
                        value,
                        min: 0.0,
                        max: f64::MAX,
                    });
                }
            }
        }
        Impact {
            safety_risk: normalize_text(&impact.safety_risk),
            operational_impact: normalize_text(&impact.operational_impact),
            ..impact
        }
    }
}

fn required_text(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: Option<String>,
) -> String {
    let value = value.map(|v| normalize_text(&v)).unwrap_or_default();
    if value.is_empty() {
        errors.push(ValidationError::MissingField(field));
    }
    value
}

fn required_enum<T>(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: Option<String>,
) -> Option<T>
where
    T: FromStr<Err = alert_model::ParseEnumError>,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(ValidationError::MissingField(field));
            None
        }
        Some(raw) => match raw.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                errors.push(ValidationError::UnknownVariant(e));
                None
            }
        },
    }
}
