// Field-sales report aggregation.
//
// Turns daily visit/order reports submitted by medical representatives
// into flat totals, day/week/month rollups and derived ratios. Everything
// except `loader` and `output` is pure: no I/O, no shared state.
pub mod error;
pub mod insights;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;
pub mod window;

pub use error::LoadError;
pub use insights::compute_insights;
pub use normalize::normalize;
pub use reports::{
    bucket, bucket_daily, bucket_monthly, bucket_weekly, by_region, compute_totals, summarize,
    total_doctors,
};
pub use types::{
    Bucket, DerivedTotals, DoctorCounts, Granularity, Insights, RawReport, RegionSummary,
    ReportRecord, Summary, SummaryConfig,
};
pub use window::{cutoff, expected_period_length, filter_by_window, WindowKind};
