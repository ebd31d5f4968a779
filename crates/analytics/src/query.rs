//! Alert filtering and sorting

use alert_model::{Alert, AlertCategory, AlertSource, AlertStatus, Severity};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// Sort key for query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    DetectedDate,
    Severity,
    Status,
    Category,
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter and sort criteria; every filter is optional and they AND together
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertCriteria {
    /// Case-insensitive substring over the searchable text fields
    pub text: Option<String>,
    pub severity: BTreeSet<Severity>,
    pub status: BTreeSet<AlertStatus>,
    pub category: BTreeSet<AlertCategory>,
    pub source: BTreeSet<AlertSource>,
    /// Shortcut for status in {active, acknowledged}
    pub active_only: bool,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl AlertCriteria {
    /// Whether `alert` passes every filter
    pub fn matches(&self, alert: &Alert) -> bool {
        if !self.severity.is_empty() && !self.severity.contains(&alert.severity) {
            return false;
        }
        if !self.status.is_empty() && !self.status.contains(&alert.status) {
            return false;
        }
        if !self.category.is_empty() && !self.category.contains(&alert.category) {
            return false;
        }
        if !self.source.is_empty() && !self.source.contains(&alert.source) {
            return false;
        }
        if self.active_only
            && !matches!(alert.status, AlertStatus::Active | AlertStatus::Acknowledged)
        {
            return false;
        }
        match self.needle() {
            Some(needle) => text_matches(alert, &needle),
            None => true,
        }
    }

    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

fn text_matches(alert: &Alert, needle: &str) -> bool {
    let fields = [
        Some(alert.title.as_str()),
        Some(alert.message.as_str()),
        Some(alert.location.as_str()),
        alert.equipment_name.as_deref(),
        Some(alert.category.as_str()),
        alert.alert_type.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Total order for `key`/`order`; ties always fall back to ascending id
pub fn compare(a: &Alert, b: &Alert, key: SortKey, order: SortOrder) -> Ordering {
    let primary = match key {
        SortKey::DetectedDate => a.detected_date.cmp(&b.detected_date),
        SortKey::Severity => a.severity.rank().cmp(&b.severity.rank()),
        SortKey::Status => a.status.rank().cmp(&b.status.rank()),
        SortKey::Category => a
            .category
            .as_str()
            .to_lowercase()
            .cmp(&b.category.as_str().to_lowercase()),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filter then sort `alerts`
pub fn query(alerts: &[Alert], criteria: &AlertCriteria) -> Vec<Alert> {
    let mut matched: Vec<Alert> = alerts
        .iter()
        .filter(|alert| criteria.matches(alert))
        .cloned()
        .collect();
    matched.sort_by(|a, b| compare(a, b, criteria.sort_by, criteria.sort_order));
    debug!(
        "Query matched {} of {} alert(s)",
        matched.len(),
        alerts.len()
    );
    matched
}

/// Pagination over a query result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// Slice one page out of an already sorted result
pub fn paginate(alerts: &[Alert], page: Page) -> &[Alert] {
    let start = page.offset.min(alerts.len());
    let end = start.saturating_add(page.limit).min(alerts.len());
    &alerts[start..end]
}
