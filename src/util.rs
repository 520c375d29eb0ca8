// Utility helpers for lenient parsing and number formatting.
//
// Report payloads come from a remote API and from spreadsheet exports, so
// numbers may arrive as JSON numbers, numeric strings with thousands
// separators, nulls or garbage. Everything funnels through here so the
// aggregation code only ever sees clean, typed values.
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Read a JSON value as a finite number, accepting numeric strings.
fn value_as_f64(v: Option<&Value>) -> Option<f64> {
    let n = match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64_safe(Some(s)),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Non-negative integer count. Missing, null, negative or non-numeric
/// input is 0; fractional input is truncated.
pub fn parse_count_safe(v: Option<&Value>) -> u64 {
    if let Some(Value::Number(n)) = v {
        if let Some(u) = n.as_u64() {
            return u;
        }
    }
    match value_as_f64(v) {
        Some(n) if n > 0.0 => n.trunc() as u64,
        _ => 0,
    }
}

/// Non-negative monetary amount, same coercion rules as counts but
/// keeping the fractional part.
pub fn parse_amount_safe(v: Option<&Value>) -> f64 {
    match value_as_f64(v) {
        Some(n) if n > 0.0 => n,
        _ => 0.0,
    }
}

/// Trimmed, non-empty text.
pub fn parse_text_safe(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse an instant from the shapes the reporting API has been seen to
/// emit: RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC) or a bare
/// `YYYY-MM-DD` (anchored at midnight UTC).
pub fn parse_instant_safe(s: Option<&str>) -> Option<DateTime<Utc>> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    parse_date_safe(Some(s)).map(start_of_day)
}

pub fn parse_instant_value(v: Option<&Value>) -> Option<DateTime<Utc>> {
    match v? {
        Value::String(s) => parse_instant_safe(Some(s)),
        _ => None,
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimal places plus locale-aware thousands
    // separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_coerce_garbage_to_zero() {
        assert_eq!(parse_count_safe(Some(&json!(4))), 4);
        assert_eq!(parse_count_safe(Some(&json!("12"))), 12);
        assert_eq!(parse_count_safe(Some(&json!("1,200"))), 1200);
        assert_eq!(parse_count_safe(Some(&json!(2.9))), 2);
        assert_eq!(parse_count_safe(Some(&json!(-3))), 0);
        assert_eq!(parse_count_safe(Some(&json!("abc"))), 0);
        assert_eq!(parse_count_safe(Some(&json!(null))), 0);
        assert_eq!(parse_count_safe(Some(&json!([1]))), 0);
        assert_eq!(parse_count_safe(None), 0);
    }

    #[test]
    fn amounts_keep_fractions() {
        assert_eq!(parse_amount_safe(Some(&json!(1250.5))), 1250.5);
        assert_eq!(parse_amount_safe(Some(&json!(" 3,000.25 "))), 3000.25);
        assert_eq!(parse_amount_safe(Some(&json!(-10))), 0.0);
        assert_eq!(parse_amount_safe(Some(&json!(true))), 0.0);
    }

    #[test]
    fn instants_accept_known_shapes() {
        let midnight = parse_instant_safe(Some("2024-01-10")).unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-01-10T00:00:00+00:00");

        let offset = parse_instant_safe(Some("2024-01-10T02:30:00+03:00")).unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-01-09T23:30:00+00:00");

        let spaced = parse_instant_safe(Some("2024-01-10 08:15:00")).unwrap();
        assert_eq!(spaced.to_rfc3339(), "2024-01-10T08:15:00+00:00");

        assert!(parse_instant_safe(Some("not-a-date")).is_none());
        assert!(parse_instant_safe(Some("2024-02-30")).is_none());
        assert!(parse_instant_safe(Some("  ")).is_none());
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_int(9855u64), "9,855");
    }

    #[test]
    fn round_to_one_decimal() {
        assert_eq!(round_to(133.333, 1), 133.3);
        assert_eq!(round_to(66.66, 1), 66.7);
    }
}
