//! Trailing statistics windows

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Window parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowParseError {
    #[error("Invalid window '{0}': expected e.g. 24h, 7d, 30d, 90m")]
    InvalidFormat(String),
    #[error("Window must be longer than zero")]
    Empty,
    #[error("Window must be a whole number of minutes")]
    PartialMinute,
    #[error("Window longer than {max_days} days")]
    TooLong { max_days: i64 },
}

/// Longest accepted custom window
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Trailing interval that scopes a statistics computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatsWindow {
    Last24Hours,
    Last7Days,
    Last30Days,
    Custom(Duration),
}

impl StatsWindow {
    /// Build an explicit window of whole minutes, up to `MAX_WINDOW_DAYS`
    pub fn custom(length: Duration) -> Result<Self, WindowParseError> {
        if length <= Duration::zero() {
            return Err(WindowParseError::Empty);
        }
        if length > Duration::days(MAX_WINDOW_DAYS) {
            return Err(WindowParseError::TooLong {
                max_days: MAX_WINDOW_DAYS,
            });
        }
        if length != Duration::minutes(length.num_minutes()) {
            return Err(WindowParseError::PartialMinute);
        }
        Ok(StatsWindow::Custom(length))
    }

    pub fn duration(&self) -> Duration {
        match self {
            StatsWindow::Last24Hours => Duration::hours(24),
            StatsWindow::Last7Days => Duration::days(7),
            StatsWindow::Last30Days => Duration::days(30),
            StatsWindow::Custom(length) => *length,
        }
    }
}

impl Default for StatsWindow {
    fn default() -> Self {
        StatsWindow::Last24Hours
    }
}

impl fmt::Display for StatsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsWindow::Last24Hours => f.write_str("24h"),
            StatsWindow::Last7Days => f.write_str("7d"),
            StatsWindow::Last30Days => f.write_str("30d"),
            StatsWindow::Custom(length) => {
                let minutes = length.num_minutes();
                if minutes % (24 * 60) == 0 {
                    write!(f, "{}d", minutes / (24 * 60))
                } else if minutes % 60 == 0 {
                    write!(f, "{}h", minutes / 60)
                } else {
                    write!(f, "{}m", minutes)
                }
            }
        }
    }
}

impl FromStr for StatsWindow {
    type Err = WindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "24h" => return Ok(StatsWindow::Last24Hours),
            "7d" => return Ok(StatsWindow::Last7Days),
            "30d" => return Ok(StatsWindow::Last30Days),
            _ => {}
        }

        let invalid = || WindowParseError::InvalidFormat(s.to_string());
        let Some((split, _)) = raw.char_indices().last() else {
            return Err(invalid());
        };
        let (amount, unit) = raw.split_at(split);
        let amount: i64 = amount.parse().map_err(|_| invalid())?;
        let length = match unit {
            "m" => Duration::try_minutes(amount),
            "h" => Duration::try_hours(amount),
            "d" => Duration::try_days(amount),
            _ => None,
        };
        StatsWindow::custom(length.ok_or_else(invalid)?)
    }
}

impl TryFrom<String> for StatsWindow {
    type Error = WindowParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatsWindow> for String {
    fn from(window: StatsWindow) -> Self {
        window.to_string()
    }
}
