use crate::util::{format_int, format_number, start_of_day};
use crate::window::WindowKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tabled::Tabled;

/// A report exactly as the reporting API (or a spreadsheet export) hands
/// it over. Every field is optional and untyped; `normalize` turns it
/// into a `ReportRecord`.
///
/// Clients have used several names for the same field over time. The
/// first name present with a non-null value wins, so a report carrying
/// both `ordersCount` and an `orders` line-item list still decodes.
#[derive(Debug, Clone, Default)]
pub struct RawReport {
    pub report_date: Option<Value>,
    pub created_at: Option<Value>,
    pub region: Option<Value>,

    pub dentists: Option<Value>,
    pub physiotherapists: Option<Value>,
    pub gynecologists: Option<Value>,
    pub internists: Option<Value>,
    pub general_practitioners: Option<Value>,
    pub pediatricians: Option<Value>,
    pub dermatologists: Option<Value>,
    pub total_doctors: Option<Value>,

    pub pharmacies: Option<Value>,
    pub dispensaries: Option<Value>,
    pub orders_count: Option<Value>,
    pub orders_value: Option<Value>,
    pub summary: Option<Value>,
}

fn pick(map: &Map<String, Value>, names: &[&str]) -> Option<Value> {
    names
        .iter()
        .filter_map(|n| map.get(*n))
        .find(|v| !v.is_null())
        .cloned()
}

impl RawReport {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        RawReport {
            report_date: pick(map, &["reportDate", "report_date", "visitDate", "date"]),
            created_at: pick(map, &["createdAt", "created_at"]),
            region: pick(map, &["region", "Region", "area"]),
            dentists: pick(map, &["dentists"]),
            physiotherapists: pick(map, &["physiotherapists", "physios"]),
            gynecologists: pick(map, &["gynecologists", "gynaecologists"]),
            internists: pick(map, &["internists"]),
            general_practitioners: pick(
                map,
                &["generalPractitioners", "general_practitioners", "gp"],
            ),
            pediatricians: pick(map, &["pediatricians", "paediatricians"]),
            dermatologists: pick(map, &["dermatologists"]),
            total_doctors: pick(map, &["totalDoctors", "total_doctors"]),
            pharmacies: pick(map, &["pharmacies"]),
            dispensaries: pick(map, &["dispensaries"]),
            orders_count: pick(map, &["ordersCount", "orders_count", "orders"]),
            orders_value: pick(map, &["ordersValue", "orders_value", "totalValue"]),
            summary: pick(map, &["summary", "notes"]),
        }
    }
}

impl<'de> Deserialize<'de> for RawReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(RawReport::from_map(&map))
    }
}

/// Visits per doctor category.
///
/// `unclassified` only carries legacy reports that sent a single
/// `total_doctors` figure instead of the per-category breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorCounts {
    pub dentists: u64,
    pub physiotherapists: u64,
    pub gynecologists: u64,
    pub internists: u64,
    pub general_practitioners: u64,
    pub pediatricians: u64,
    pub dermatologists: u64,
    pub unclassified: u64,
}

impl DoctorCounts {
    pub fn total(&self) -> u64 {
        [
            self.dentists,
            self.physiotherapists,
            self.gynecologists,
            self.internists,
            self.general_practitioners,
            self.pediatricians,
            self.dermatologists,
            self.unclassified,
        ]
        .into_iter()
        .fold(0u64, u64::saturating_add)
    }

    pub fn add(&mut self, other: &DoctorCounts) {
        self.dentists = self.dentists.saturating_add(other.dentists);
        self.physiotherapists = self.physiotherapists.saturating_add(other.physiotherapists);
        self.gynecologists = self.gynecologists.saturating_add(other.gynecologists);
        self.internists = self.internists.saturating_add(other.internists);
        self.general_practitioners = self
            .general_practitioners
            .saturating_add(other.general_practitioners);
        self.pediatricians = self.pediatricians.saturating_add(other.pediatricians);
        self.dermatologists = self.dermatologists.saturating_add(other.dermatologists);
        self.unclassified = self.unclassified.saturating_add(other.unclassified);
    }
}

/// One submitted daily report with every numeric field defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Visit date as reported; `None` when absent or unparsable.
    pub report_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub region: Option<String>,
    pub doctors: DoctorCounts,
    pub pharmacies: u64,
    pub dispensaries: u64,
    pub orders_count: u64,
    pub orders_value: f64,
    pub summary: Option<String>,
}

impl ReportRecord {
    /// A blank record visited on `date`.
    pub fn dated(date: NaiveDate) -> Self {
        Self {
            report_at: Some(start_of_day(date)),
            ..Self::default()
        }
    }

    /// Report date, falling back to the creation timestamp.
    pub fn effective_at(&self) -> Option<DateTime<Utc>> {
        self.report_at.or(self.created_at)
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_at().map(|t| t.date_naive())
    }
}

/// Sums across a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTotals {
    pub doctors: u64,
    pub pharmacies: u64,
    pub dispensaries: u64,
    pub orders: u64,
    pub value: f64,
    pub report_count: u64,
    pub by_category: DoctorCounts,
}

impl DerivedTotals {
    pub fn add_record(&mut self, r: &ReportRecord) {
        self.doctors = self.doctors.saturating_add(r.doctors.total());
        self.pharmacies = self.pharmacies.saturating_add(r.pharmacies);
        self.dispensaries = self.dispensaries.saturating_add(r.dispensaries);
        self.orders = self.orders.saturating_add(r.orders_count);
        self.value += r.orders_value;
        self.report_count = self.report_count.saturating_add(1);
        self.by_category.add(&r.doctors);
    }

    pub fn merge(&mut self, other: &DerivedTotals) {
        self.doctors = self.doctors.saturating_add(other.doctors);
        self.pharmacies = self.pharmacies.saturating_add(other.pharmacies);
        self.dispensaries = self.dispensaries.saturating_add(other.dispensaries);
        self.orders = self.orders.saturating_add(other.orders);
        self.value += other.value;
        self.report_count = self.report_count.saturating_add(other.report_count);
        self.by_category.add(&other.by_category);
    }
}

/// A day, ISO week or calendar month of summed report metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// `YYYY-MM-DD`, `YYYY-Www` or `YYYY-MM`.
    pub key: String,
    pub label: String,
    /// First calendar day covered by the bucket.
    pub start: NaiveDate,
    pub totals: DerivedTotals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub avg_doctors_per_bucket: f64,
    /// Orders per 100 doctor visits, one decimal place.
    pub conversion_rate: f64,
    pub avg_order_value: f64,
    /// Reports filed as a percentage of days in the window.
    pub activity_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub totals: DerivedTotals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

/// What `summarize` should produce.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub window: WindowKind,
    pub granularity: Granularity,
    pub max_buckets: Option<usize>,
}

/// Everything a dashboard screen needs for one window.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub window: WindowKind,
    pub granularity: Granularity,
    pub now: DateTime<Utc>,
    pub cutoff: DateTime<Utc>,
    pub totals: DerivedTotals,
    pub buckets: Vec<Bucket>,
    pub insights: Insights,
    pub regions: Vec<RegionSummary>,
    /// Input records that had no usable date and were left out.
    pub undated_records: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BucketRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "Reports")]
    #[tabled(rename = "Reports")]
    pub reports: String,
    #[serde(rename = "Doctors")]
    #[tabled(rename = "Doctors")]
    pub doctors: String,
    #[serde(rename = "Pharmacies")]
    #[tabled(rename = "Pharmacies")]
    pub pharmacies: String,
    #[serde(rename = "Dispensaries")]
    #[tabled(rename = "Dispensaries")]
    pub dispensaries: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: String,
    #[serde(rename = "OrderValue")]
    #[tabled(rename = "OrderValue")]
    pub order_value: String,
}

impl From<&Bucket> for BucketRow {
    fn from(b: &Bucket) -> Self {
        let t = &b.totals;
        BucketRow {
            period: b.key.clone(),
            label: b.label.clone(),
            reports: format_int(t.report_count),
            doctors: format_int(t.doctors),
            pharmacies: format_int(t.pharmacies),
            dispensaries: format_int(t.dispensaries),
            orders: format_int(t.orders),
            order_value: format_number(t.value, 2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionRow {
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Reports")]
    #[tabled(rename = "Reports")]
    pub reports: String,
    #[serde(rename = "Doctors")]
    #[tabled(rename = "Doctors")]
    pub doctors: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: String,
    #[serde(rename = "OrderValue")]
    #[tabled(rename = "OrderValue")]
    pub order_value: String,
    #[serde(rename = "ConversionRate")]
    #[tabled(rename = "ConversionRate")]
    pub conversion_rate: String,
}

impl From<&RegionSummary> for RegionRow {
    fn from(r: &RegionSummary) -> Self {
        let t = &r.totals;
        let conversion = crate::insights::conversion_rate(t);
        RegionRow {
            region: r.region.clone(),
            reports: format_int(t.report_count),
            doctors: format_int(t.doctors),
            orders: format_int(t.orders),
            order_value: format_number(t.value, 2),
            conversion_rate: format!("{}%", format_number(conversion, 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_saturate_instead_of_overflowing() {
        let huge = ReportRecord {
            pharmacies: u64::MAX,
            orders_count: u64::MAX,
            doctors: DoctorCounts {
                dentists: u64::MAX,
                internists: 1,
                ..DoctorCounts::default()
            },
            ..ReportRecord::default()
        };
        assert_eq!(huge.doctors.total(), u64::MAX);

        let mut totals = DerivedTotals::default();
        totals.add_record(&huge);
        totals.add_record(&huge);
        assert_eq!(totals.pharmacies, u64::MAX);
        assert_eq!(totals.orders, u64::MAX);
        assert_eq!(totals.doctors, u64::MAX);
        assert_eq!(totals.by_category.dentists, u64::MAX);
        assert_eq!(totals.report_count, 2);

        let copy = totals.clone();
        totals.merge(&copy);
        assert_eq!(totals.pharmacies, u64::MAX);
        assert_eq!(totals.report_count, 4);
    }

    #[test]
    fn canonical_name_wins_over_legacy_alias() {
        let raw: RawReport = serde_json::from_value(json!({
            "reportDate": "2024-01-10",
            "date": "2023-12-01",
            "dentists": 3,
            "ordersCount": 2,
            "orders": [{ "sku": "A" }],
            "ordersValue": 40,
            "totalValue": 999
        }))
        .unwrap();
        assert_eq!(raw.report_date, Some(json!("2024-01-10")));
        assert_eq!(raw.orders_count, Some(json!(2)));
        assert_eq!(raw.orders_value, Some(json!(40)));
    }

    #[test]
    fn null_canonical_falls_through_to_alias() {
        let raw: RawReport =
            serde_json::from_value(json!({ "ordersCount": null, "orders_count": "5" })).unwrap();
        assert_eq!(raw.orders_count, Some(json!("5")));
    }

    #[test]
    fn non_object_report_is_rejected() {
        assert!(serde_json::from_value::<RawReport>(json!(7)).is_err());
    }
}
