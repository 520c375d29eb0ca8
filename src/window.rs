// Rolling lookback windows used to filter reports before aggregation.
use crate::types::ReportRecord;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Week,
    Month,
    #[default]
    Quarter,
}

impl WindowKind {
    /// Parse a window name. Anything unrecognised means the widest window;
    /// that is a policy default, not a validation failure.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weekly" | "7d" => WindowKind::Week,
            "month" | "monthly" | "30d" => WindowKind::Month,
            "quarter" | "quarterly" | "90d" => WindowKind::Quarter,
            other => {
                tracing::debug!(window = other, "unknown window kind, using quarter");
                WindowKind::Quarter
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Week => "week",
            WindowKind::Month => "month",
            WindowKind::Quarter => "quarter",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Earliest instant still inside the window ending at `now`.
///
/// Calendar-month arithmetic clamps to the end of shorter months
/// (31 March minus one month is 29 February in a leap year).
pub fn cutoff(kind: WindowKind, now: DateTime<Utc>) -> DateTime<Utc> {
    let from = match kind {
        WindowKind::Week => now.checked_sub_signed(Duration::days(7)),
        WindowKind::Month => now.checked_sub_months(Months::new(1)),
        WindowKind::Quarter => now.checked_sub_months(Months::new(3)),
    };
    from.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Records whose effective date is at or after the cutoff. Records with
/// no usable date fail closed.
pub fn filter_by_window(
    records: &[ReportRecord],
    kind: WindowKind,
    now: DateTime<Utc>,
) -> Vec<ReportRecord> {
    let from = cutoff(kind, now);
    records
        .iter()
        .filter(|r| matches!(r.effective_at(), Some(at) if at >= from))
        .cloned()
        .collect()
}

/// Days a representative is expected to report in the window.
pub fn expected_period_length(kind: WindowKind) -> u32 {
    match kind {
        WindowKind::Week => 7,
        WindowKind::Month => 30,
        WindowKind::Quarter => 90,
    }
}
