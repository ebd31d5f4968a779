//! Alert Analytics
//!
//! Pure computations over immutable alert snapshots:
//! - multi-criteria filtering with a total, deterministic sort order
//! - windowed statistics (breakdowns, response times, trend, AI accuracy)
//! - an explicit memo keyed by snapshot version and criteria

mod memo;
mod query;
mod statistics;
mod window;

pub use memo::QueryMemo;
pub use query::{compare, paginate, query, AlertCriteria, Page, SortKey, SortOrder};
pub use statistics::{
    compute as compute_statistics, DurationStats, LocationCount, Statistics, Trend, TrendDirection,
};
pub use window::{StatsWindow, WindowParseError, MAX_WINDOW_DAYS};
