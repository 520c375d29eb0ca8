// Boundary between the loosely-shaped payloads the API returns and the
// canonical `ReportRecord` the aggregator works on.
use crate::types::{DoctorCounts, RawReport, ReportRecord};
use crate::util::{parse_amount_safe, parse_count_safe, parse_instant_value, parse_text_safe};

/// Default every field of a raw report. Never fails: numbers that are
/// missing or malformed become 0, dates that do not parse become `None`.
pub fn normalize(raw: &RawReport) -> ReportRecord {
    let mut doctors = DoctorCounts {
        dentists: parse_count_safe(raw.dentists.as_ref()),
        physiotherapists: parse_count_safe(raw.physiotherapists.as_ref()),
        gynecologists: parse_count_safe(raw.gynecologists.as_ref()),
        internists: parse_count_safe(raw.internists.as_ref()),
        general_practitioners: parse_count_safe(raw.general_practitioners.as_ref()),
        pediatricians: parse_count_safe(raw.pediatricians.as_ref()),
        dermatologists: parse_count_safe(raw.dermatologists.as_ref()),
        unclassified: 0,
    };
    // Older clients only sent an aggregate; the breakdown wins when present.
    if doctors.total() == 0 {
        doctors.unclassified = parse_count_safe(raw.total_doctors.as_ref());
    }

    ReportRecord {
        report_at: parse_instant_value(raw.report_date.as_ref()),
        created_at: parse_instant_value(raw.created_at.as_ref()),
        region: parse_text_safe(raw.region.as_ref()),
        doctors,
        pharmacies: parse_count_safe(raw.pharmacies.as_ref()),
        dispensaries: parse_count_safe(raw.dispensaries.as_ref()),
        orders_count: parse_count_safe(raw.orders_count.as_ref()),
        orders_value: parse_amount_safe(raw.orders_value.as_ref()),
        summary: parse_text_safe(raw.summary.as_ref()),
    }
}

pub fn normalize_all(raws: &[RawReport]) -> Vec<ReportRecord> {
    raws.iter().map(normalize).collect()
}
