//! Analytics aggregator: category breakdowns, trend series, spending
//! patterns and the dashboard snapshot, all folded from raw ledger entries
//! on every call.

mod breakdown;
mod dashboard;
mod patterns;
mod service;
mod trend;

pub(crate) use dashboard::DashboardSnapshot;
pub(crate) use service::{
    AnalyticsService, ExpenseAnalytics, SpendingTrends, DEFAULT_RECENT_LIMIT,
};
