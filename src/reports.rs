use crate::insights::compute_insights;
use crate::types::{
    Bucket, DerivedTotals, Granularity, RegionSummary, ReportRecord, Summary, SummaryConfig,
};
use crate::window::{cutoff, filter_by_window};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sum of the doctor-category visit counts on one report.
pub fn total_doctors(record: &ReportRecord) -> u64 {
    record.doctors.total()
}

/// Pair every record with its effective date, dropping the ones that have
/// none. Undated reports are a data-quality gap, not an error.
fn dated_records(records: &[ReportRecord]) -> Vec<(NaiveDate, &ReportRecord)> {
    let mut out = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for r in records {
        match r.effective_date() {
            Some(d) => out.push((d, r)),
            None => {
                skipped += 1;
                tracing::debug!(region = ?r.region, "report has no usable date");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "left out reports without a usable date");
    }
    out
}

/// Flat totals over every dated record. Undated records are excluded here
/// exactly as they are from the bucketed views, so the totals always match
/// the sum of the (untruncated) buckets.
pub fn compute_totals(records: &[ReportRecord]) -> DerivedTotals {
    let mut totals = DerivedTotals::default();
    for (_, r) in dated_records(records) {
        totals.add_record(r);
    }
    totals
}

/// First day of the period containing `date`; `None` when that day falls
/// before the earliest representable date.
fn bucket_start(granularity: Granularity, date: NaiveDate) -> Option<NaiveDate> {
    match granularity {
        Granularity::Daily => Some(date),
        Granularity::Weekly => {
            date.checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
        }
        Granularity::Monthly => date.checked_sub_days(Days::new(date.day0() as u64)),
    }
}

fn bucket_key(granularity: Granularity, start: NaiveDate) -> String {
    match granularity {
        Granularity::Daily => start.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let iso = start.iso_week();
            format!("{:04}-W{:02}", iso.year(), iso.week())
        }
        Granularity::Monthly => start.format("%Y-%m").to_string(),
    }
}

fn bucket_label(granularity: Granularity, start: NaiveDate) -> String {
    match granularity {
        Granularity::Daily => start.format("%a, %b %-d, %Y").to_string(),
        Granularity::Weekly => start.format("Week of %b %-d, %Y").to_string(),
        Granularity::Monthly => start.format("%B %Y").to_string(),
    }
}

/// Group dated records into one bucket per period, most recent first,
/// keeping at most `max_buckets` when given.
pub fn bucket(
    records: &[ReportRecord],
    granularity: Granularity,
    max_buckets: Option<usize>,
) -> Vec<Bucket> {
    let mut map: BTreeMap<NaiveDate, DerivedTotals> = BTreeMap::new();
    let mut out_of_range = 0usize;
    for (date, r) in dated_records(records) {
        match bucket_start(granularity, date) {
            Some(start) => map.entry(start).or_default().add_record(r),
            None => out_of_range += 1,
        }
    }
    if out_of_range > 0 {
        tracing::warn!(
            out_of_range,
            granularity = granularity.as_str(),
            "left out reports whose period starts before the earliest supported date"
        );
    }
    map.into_iter()
        .rev()
        .take(max_buckets.unwrap_or(usize::MAX))
        .map(|(start, totals)| Bucket {
            key: bucket_key(granularity, start),
            label: bucket_label(granularity, start),
            start,
            totals,
        })
        .collect()
}

pub fn bucket_daily(records: &[ReportRecord], max_buckets: Option<usize>) -> Vec<Bucket> {
    bucket(records, Granularity::Daily, max_buckets)
}

/// ISO-week rollups keyed `YYYY-Www`.
pub fn bucket_weekly(records: &[ReportRecord], max_buckets: Option<usize>) -> Vec<Bucket> {
    bucket(records, Granularity::Weekly, max_buckets)
}

pub fn bucket_monthly(records: &[ReportRecord], max_buckets: Option<usize>) -> Vec<Bucket> {
    bucket(records, Granularity::Monthly, max_buckets)
}

/// Totals per region, busiest (by doctor visits) first.
pub fn by_region(records: &[ReportRecord]) -> Vec<RegionSummary> {
    let mut map: HashMap<String, DerivedTotals> = HashMap::new();
    for (_, r) in dated_records(records) {
        let region = r.region.clone().unwrap_or_else(|| "Unknown".to_string());
        map.entry(region).or_default().add_record(r);
    }
    let mut rows: Vec<RegionSummary> = map
        .into_iter()
        .map(|(region, totals)| RegionSummary { region, totals })
        .collect();
    rows.sort_by(|a, b| match b.totals.doctors.cmp(&a.totals.doctors) {
        Ordering::Equal => a.region.cmp(&b.region),
        other => other,
    });
    rows
}

/// Window filter, totals, buckets, ratios and region breakdown in one pass
/// over a fully materialised record list.
pub fn summarize(
    records: &[ReportRecord],
    config: &SummaryConfig,
    now: DateTime<Utc>,
) -> Summary {
    let undated_records = records
        .iter()
        .filter(|r| r.effective_at().is_none())
        .count();
    if undated_records > 0 {
        tracing::warn!(undated_records, "left out reports without a usable date");
    }
    let in_window = filter_by_window(records, config.window, now);
    let totals = compute_totals(&in_window);
    let all_buckets = bucket(&in_window, config.granularity, None);
    let insights = compute_insights(&totals, all_buckets.len(), config.window);
    let buckets = all_buckets
        .into_iter()
        .take(config.max_buckets.unwrap_or(usize::MAX))
        .collect();

    Summary {
        window: config.window,
        granularity: config.granularity,
        now,
        cutoff: cutoff(config.window, now),
        totals,
        buckets,
        insights,
        regions: by_region(&in_window),
        undated_records,
    }
}
