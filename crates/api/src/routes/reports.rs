//! Statistics and Dashboard Routes

use analytics::{compute_statistics, Statistics, StatsWindow};
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::{AlertQueryParams, ValidQuery};
use crate::dashboard::DashboardView;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatisticsParams {
    /// `24h`, `7d`, `30d`, or `<n>h` / `<n>d` / `<n>m`
    pub window: Option<String>,
}

fn parse_window(raw: Option<&str>, fallback: StatsWindow) -> Result<StatsWindow, ApiError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e: analytics::WindowParseError| ApiError::invalid("window", e.to_string())),
        None => Ok(fallback),
    }
}

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<StatisticsParams>,
) -> Result<Json<Statistics>, ApiError> {
    let window = parse_window(params.window.as_deref(), state.default_window)?;
    let snapshot = state.store.snapshot()?;
    Ok(Json(compute_statistics(
        snapshot.alerts(),
        window,
        snapshot.taken_at(),
    )))
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<AlertQueryParams>,
) -> Result<Json<DashboardView>, ApiError> {
    let window = parse_window(params.window.as_deref(), state.default_window)?;
    let criteria = params.criteria()?;
    let view = state.dashboard.view(&criteria, window, params.page())?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window() {
        assert_eq!(
            parse_window(None, StatsWindow::Last7Days).unwrap(),
            StatsWindow::Last7Days
        );
        assert_eq!(
            parse_window(Some("30d"), StatsWindow::Last7Days).unwrap(),
            StatsWindow::Last30Days
        );
        assert!(matches!(
            parse_window(Some("fortnight"), StatsWindow::Last7Days),
            Err(ApiError::InvalidParameter { name: "window", .. })
        ));
    }
}
