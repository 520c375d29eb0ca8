use chrono::{DateTime, Utc};
use field_report::util::parse_instant_safe;
use field_report::{
    bucket_daily, bucket_monthly, bucket_weekly, compute_insights, compute_totals,
    filter_by_window, normalize, DerivedTotals, Insights, RawReport, ReportRecord, WindowKind,
};
use serde_json::{json, Value};

fn record(v: Value) -> ReportRecord {
    let raw: RawReport = serde_json::from_value(v).unwrap();
    normalize(&raw)
}

fn at(s: &str) -> DateTime<Utc> {
    parse_instant_safe(Some(s)).unwrap()
}

fn sample() -> Vec<ReportRecord> {
    vec![
        record(json!({
            "reportDate": "2024-01-10", "dentists": 2, "pharmacies": 1,
            "ordersCount": 3, "ordersValue": 1000
        })),
        record(json!({
            "reportDate": "2024-01-10", "gynecologists": 1,
            "ordersCount": 1, "ordersValue": 500
        })),
        record(json!({
            "reportDate": "2024-01-12", "internists": 4, "dispensaries": 2,
            "ordersCount": 2, "ordersValue": 250.5
        })),
        record(json!({
            "reportDate": "2024-02-03", "pediatricians": 3, "dermatologists": 1,
            "ordersValue": "1,200"
        })),
        record(json!({
            "createdAt": "2024-02-20T16:00:00Z", "physiotherapists": 2,
            "ordersCount": 1, "ordersValue": 80
        })),
    ]
}

fn sum_buckets(buckets: &[field_report::Bucket]) -> DerivedTotals {
    let mut acc = DerivedTotals::default();
    for b in buckets {
        acc.merge(&b.totals);
    }
    acc
}

#[test]
fn scenario_a_same_day_reports() {
    let records = vec![
        record(json!({
            "reportDate": "2024-01-10", "dentists": 2, "pharmacies": 1,
            "ordersCount": 3, "ordersValue": 1000
        })),
        record(json!({
            "reportDate": "2024-01-10", "gynecologists": 1,
            "ordersCount": 1, "ordersValue": 500
        })),
    ];
    let totals = compute_totals(&records);
    assert_eq!(totals.doctors, 3);
    assert_eq!(totals.pharmacies, 1);
    assert_eq!(totals.dispensaries, 0);
    assert_eq!(totals.orders, 4);
    assert_eq!(totals.value, 1500.0);
    assert_eq!(totals.report_count, 2);

    let days = bucket_daily(&records, None);
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].key, "2024-01-10");
    assert_eq!(days[0].totals, totals);
}

#[test]
fn scenario_b_unparsable_date_excluded_everywhere() {
    let records = vec![
        record(json!({"reportDate": "2024-01-10", "dentists": 1})),
        record(json!({"reportDate": "not-a-date", "dentists": 5, "ordersCount": 2})),
    ];
    assert_eq!(bucket_daily(&records, None).len(), 1);
    let totals = compute_totals(&records);
    assert_eq!(totals.doctors, 1);
    assert_eq!(totals.orders, 0);
    assert_eq!(totals.report_count, 1);
}

#[test]
fn scenario_c_week_window_boundary() {
    let now = at("2024-03-15T00:00:00Z");
    let records = vec![
        record(json!({"reportDate": "2024-03-08", "dentists": 1})),
        record(json!({"reportDate": "2024-03-07", "dentists": 1})),
    ];
    let kept = filter_by_window(&records, WindowKind::Week, now);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].effective_date().unwrap().to_string(), "2024-03-08");
}

#[test]
fn window_boundary_one_second_older_is_excluded() {
    let now = at("2024-03-15T00:00:00Z");
    let records = vec![
        record(json!({"createdAt": "2024-03-08T00:00:00Z"})),
        record(json!({"createdAt": "2024-03-07T23:59:59Z"})),
    ];
    assert_eq!(filter_by_window(&records, WindowKind::Week, now).len(), 1);
}

#[test]
fn scenario_d_empty_input() {
    let totals = compute_totals(&[]);
    assert_eq!(totals, DerivedTotals::default());
    assert!(bucket_monthly(&[], None).is_empty());
    assert!(filter_by_window(&[], WindowKind::Month, at("2024-03-15")).is_empty());
    for window in [WindowKind::Week, WindowKind::Month, WindowKind::Quarter] {
        assert_eq!(compute_insights(&totals, 0, window), Insights::default());
    }
}

#[test]
fn totals_do_not_depend_on_order() {
    let records = sample();
    let expected = compute_totals(&records);

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(compute_totals(&reversed), expected);

    let mut rotated = records.clone();
    rotated.rotate_left(2);
    assert_eq!(compute_totals(&rotated), expected);
}

#[test]
fn totals_are_additive() {
    let records = sample();
    let (a, b) = records.split_at(2);
    let mut combined = compute_totals(a);
    combined.merge(&compute_totals(b));
    assert_eq!(compute_totals(&records), combined);
}

#[test]
fn buckets_account_for_every_dated_record() {
    let mut records = sample();
    records.push(record(json!({"reportDate": "garbage", "dentists": 9})));
    let totals = compute_totals(&records);

    assert_eq!(sum_buckets(&bucket_daily(&records, None)), totals);
    assert_eq!(sum_buckets(&bucket_weekly(&records, None)), totals);
    assert_eq!(sum_buckets(&bucket_monthly(&records, None)), totals);
}

#[test]
fn monthly_buckets_newest_first_with_counts() {
    let months = bucket_monthly(&sample(), Some(5));
    let keys: Vec<&str> = months.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, ["2024-02", "2024-01"]);
    assert_eq!(months[0].totals.report_count, 2);
    assert_eq!(months[0].label, "February 2024");
    assert_eq!(months[1].totals.report_count, 3);

    let capped = bucket_monthly(&sample(), Some(1));
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].key, "2024-02");
}
