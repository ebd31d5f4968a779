//! Closed classification enums and the lifecycle state table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a wire name is not a member of a closed enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Alert severity, declared in ascending urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    Emergency,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
        Severity::Emergency,
    ];

    /// Sort rank; higher is more urgent
    pub fn rank(self) -> u8 {
        match self {
            Severity::Emergency => 5,
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Emergency => "emergency",
        }
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            "emergency" => Ok(Severity::Emergency),
            _ => Err(ParseEnumError::new("severity", s)),
        }
    }
}

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Safety,
    Equipment,
    Environmental,
    Security,
    Operational,
    Compliance,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 6] = [
        AlertCategory::Safety,
        AlertCategory::Equipment,
        AlertCategory::Environmental,
        AlertCategory::Security,
        AlertCategory::Operational,
        AlertCategory::Compliance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Safety => "safety",
            AlertCategory::Equipment => "equipment",
            AlertCategory::Environmental => "environmental",
            AlertCategory::Security => "security",
            AlertCategory::Operational => "operational",
            AlertCategory::Compliance => "compliance",
        }
    }
}

impl FromStr for AlertCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safety" => Ok(AlertCategory::Safety),
            "equipment" => Ok(AlertCategory::Equipment),
            "environmental" => Ok(AlertCategory::Environmental),
            "security" => Ok(AlertCategory::Security),
            "operational" => Ok(AlertCategory::Operational),
            "compliance" => Ok(AlertCategory::Compliance),
            _ => Err(ParseEnumError::new("category", s)),
        }
    }
}

/// Where an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    AiSystem,
    Sensor,
    Manual,
    Inspection,
    Maintenance,
    External,
}

impl AlertSource {
    pub const ALL: [AlertSource; 6] = [
        AlertSource::AiSystem,
        AlertSource::Sensor,
        AlertSource::Manual,
        AlertSource::Inspection,
        AlertSource::Maintenance,
        AlertSource::External,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlertSource::AiSystem => "ai_system",
            AlertSource::Sensor => "sensor",
            AlertSource::Manual => "manual",
            AlertSource::Inspection => "inspection",
            AlertSource::Maintenance => "maintenance",
            AlertSource::External => "external",
        }
    }
}

impl FromStr for AlertSource {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai_system" => Ok(AlertSource::AiSystem),
            "sensor" => Ok(AlertSource::Sensor),
            "manual" => Ok(AlertSource::Manual),
            "inspection" => Ok(AlertSource::Inspection),
            "maintenance" => Ok(AlertSource::Maintenance),
            "external" => Ok(AlertSource::External),
            _ => Err(ParseEnumError::new("source", s)),
        }
    }
}

/// Lifecycle state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Escalated,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub const ALL: [AlertStatus; 5] = [
        AlertStatus::Active,
        AlertStatus::Acknowledged,
        AlertStatus::Escalated,
        AlertStatus::Resolved,
        AlertStatus::FalsePositive,
    ];

    /// Sort rank; open states rank above closed ones
    pub fn rank(self) -> u8 {
        match self {
            AlertStatus::Active => 4,
            AlertStatus::Acknowledged => 3,
            AlertStatus::Escalated => 2,
            AlertStatus::Resolved => 1,
            AlertStatus::FalsePositive => 0,
        }
    }

    /// Resolved and false-positive alerts accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::FalsePositive)
    }

    /// State reached by applying `action`, or `None` when the table forbids it
    pub fn apply(self, action: LifecycleAction) -> Option<AlertStatus> {
        use AlertStatus::*;
        use LifecycleAction::*;

        match (self, action) {
            (Active, Acknowledge) => Some(Acknowledged),
            (Active | Acknowledged | Escalated, Resolve) => Some(Resolved),
            (Active | Acknowledged, Escalate) => Some(Escalated),
            (Active | Acknowledged | Escalated, MarkFalsePositive) => Some(FalsePositive),
            (Active | Acknowledged | Escalated, Assign) => Some(self),
            (Acknowledged | Escalated, Acknowledge) => None,
            (Escalated, Escalate) => None,
            (Resolved | FalsePositive, _) => None,
        }
    }

    /// Actions the table permits from this state
    pub fn allowed_actions(self) -> Vec<LifecycleAction> {
        LifecycleAction::ALL
            .into_iter()
            .filter(|action| self.apply(*action).is_some())
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Escalated => "escalated",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AlertStatus::Active),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "escalated" => Ok(AlertStatus::Escalated),
            "resolved" => Ok(AlertStatus::Resolved),
            "false_positive" => Ok(AlertStatus::FalsePositive),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

/// Operator-issued lifecycle actions
///
/// `Assign` changes ownership only; the status stays where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Acknowledge,
    Resolve,
    Escalate,
    MarkFalsePositive,
    Assign,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 5] = [
        LifecycleAction::Acknowledge,
        LifecycleAction::Resolve,
        LifecycleAction::Escalate,
        LifecycleAction::MarkFalsePositive,
        LifecycleAction::Assign,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::Acknowledge => "acknowledge",
            LifecycleAction::Resolve => "resolve",
            LifecycleAction::Escalate => "escalate",
            LifecycleAction::MarkFalsePositive => "mark_false_positive",
            LifecycleAction::Assign => "assign",
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acknowledge" => Ok(LifecycleAction::Acknowledge),
            "resolve" => Ok(LifecycleAction::Resolve),
            "escalate" => Ok(LifecycleAction::Escalate),
            "mark_false_positive" | "false_positive" => Ok(LifecycleAction::MarkFalsePositive),
            "assign" => Ok(LifecycleAction::Assign),
            _ => Err(ParseEnumError::new("action", s)),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Severity, AlertCategory, AlertSource, AlertStatus, LifecycleAction);
