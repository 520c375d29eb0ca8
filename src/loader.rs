// Stand-in for the data-fetching side: reads report exports from disk,
// strips whatever envelope the API wrapped them in, walks paginated dumps
// and hands the aggregator a fully materialised, normalised record list.
use crate::error::LoadError;
use crate::normalize::normalize_all;
use crate::types::{RawReport, ReportRecord};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const LIST_KEYS: [&str; 4] = ["data", "reports", "items", "results"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub undated_rows: usize,
    pub pages: usize,
}

/// Find the report list inside a response body. Accepts a bare array, an
/// object with a `data`/`reports`/`items`/`results` array, or a `data`
/// object wrapping one of those.
pub fn unwrap_envelope(doc: Value) -> Result<Vec<Value>, LoadError> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            for key in LIST_KEYS {
                match obj.remove(key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(inner @ Value::Object(_)) if key == "data" => {
                        return unwrap_envelope(inner)
                    }
                    _ => {}
                }
            }
            Err(LoadError::NoRecords)
        }
        _ => Err(LoadError::NoRecords),
    }
}

/// Decode each element on its own so one bad row does not sink the batch.
fn decode_rows(items: Vec<Value>, report: &mut LoadReport) -> Vec<RawReport> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        report.total_rows += 1;
        match serde_json::from_value::<RawReport>(item) {
            Ok(r) => rows.push(r),
            Err(e) => {
                report.parse_errors += 1;
                tracing::debug!("skipping malformed report: {e}");
            }
        }
    }
    rows
}

pub fn parse_json_reports(
    text: &str,
    report: &mut LoadReport,
) -> Result<Vec<RawReport>, LoadError> {
    let doc: Value = serde_json::from_str(text)?;
    Ok(decode_rows(unwrap_envelope(doc)?, report))
}

fn read_json_file(path: &Path) -> Result<Value, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| LoadError::json(path, e))
}

/// CSV exports carry one report per row with the API's field names as
/// headers. Empty cells are treated as missing.
pub fn read_csv_reports(
    path: &Path,
    report: &mut LoadReport,
) -> Result<Vec<RawReport>, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut items = Vec::new();
    for result in rdr.deserialize::<HashMap<String, String>>() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                report.total_rows += 1;
                report.parse_errors += 1;
                tracing::debug!("skipping unreadable CSV row: {e}");
                continue;
            }
        };
        let obj: Map<String, Value> = row
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.trim().to_string(), Value::String(v)))
            .collect();
        items.push(Value::Object(obj));
    }
    Ok(decode_rows(items, report))
}

/// One page of a paginated report listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<RawReport>,
    /// Rows on the page that could not be decoded.
    pub skipped: usize,
    pub has_more: bool,
}

impl Page {
    /// True when the source sent no rows at all, decodable or not.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.skipped == 0
    }
}

/// Anything that can hand out report pages, numbered from 1.
pub trait PageSource {
    fn fetch_page(&mut self, page: usize) -> Result<Page, LoadError>;
}

/// Walks a `PageSource` until it reports no further pages, returns a page
/// with no rows, or fails. A page whose rows all failed to decode is still
/// yielded. After an error the iterator is exhausted.
pub struct Paginator<S: PageSource> {
    source: S,
    next_page: usize,
    done: bool,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            next_page: 1,
            done: false,
        }
    }
}

impl<S: PageSource> Iterator for Paginator<S> {
    type Item = Result<Page, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page_no = self.next_page;
        self.next_page += 1;
        match self.source.fetch_page(page_no) {
            Ok(page) => {
                if page.is_empty() {
                    self.done = true;
                    return None;
                }
                self.done = !page.has_more;
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(LoadError::Page {
                    page: page_no,
                    source: Box::new(e),
                }))
            }
        }
    }
}

/// Drain every page and normalise the result.
pub fn fetch_all<S: PageSource>(
    source: S,
) -> Result<(Vec<ReportRecord>, LoadReport), LoadError> {
    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for page in Paginator::new(source) {
        let page = page?;
        report.pages += 1;
        report.total_rows += page.records.len() + page.skipped;
        report.parse_errors += page.skipped;
        records.extend(normalize_all(&page.records));
    }
    finish(&mut report, &records);
    Ok((records, report))
}

/// Read the "more pages?" hint from a response body: `hasMore`,
/// `has_more`, a non-null `next`, or `pagination.page < totalPages`.
pub fn page_has_more(doc: &Value) -> bool {
    let Some(obj) = doc.as_object() else {
        return false;
    };
    let flag = obj.get("hasMore").or_else(|| obj.get("has_more"));
    if let Some(b) = flag.and_then(Value::as_bool) {
        return b;
    }
    if let Some(next) = obj.get("next") {
        return !next.is_null();
    }
    if let Some(p) = obj.get("pagination").or_else(|| obj.get("meta")) {
        let page = p
            .get("page")
            .or_else(|| p.get("currentPage"))
            .and_then(Value::as_u64);
        let total = p
            .get("totalPages")
            .or_else(|| p.get("total_pages"))
            .and_then(Value::as_u64);
        if let (Some(page), Some(total)) = (page, total) {
            return page < total;
        }
    }
    false
}

/// A directory of saved API responses named `page-1.json`, `page-2.json`,
/// ... A missing file ends the listing.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PageSource for DirectorySource {
    fn fetch_page(&mut self, page: usize) -> Result<Page, LoadError> {
        let path = self.dir.join(format!("page-{page}.json"));
        if !path.exists() {
            return Ok(Page::default());
        }
        let doc = read_json_file(&path)?;
        let has_more = page_has_more(&doc);
        let mut counts = LoadReport::default();
        let records = decode_rows(unwrap_envelope(doc)?, &mut counts);
        if counts.parse_errors > 0 {
            tracing::warn!(page, skipped = counts.parse_errors, "malformed reports in page");
        }
        Ok(Page {
            records,
            skipped: counts.parse_errors,
            has_more,
        })
    }
}

fn finish(report: &mut LoadReport, records: &[ReportRecord]) {
    report.loaded_rows = records.len();
    report.undated_rows = records.iter().filter(|r| r.effective_at().is_none()).count();
    tracing::info!(
        total = report.total_rows,
        loaded = report.loaded_rows,
        parse_errors = report.parse_errors,
        undated = report.undated_rows,
        "reports loaded"
    );
}

/// Load a `.json` or `.csv` export, or a directory of JSON pages.
pub fn load_and_clean(path: &Path) -> Result<(Vec<ReportRecord>, LoadReport), LoadError> {
    if path.is_dir() {
        return fetch_all(DirectorySource::new(path));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let mut report = LoadReport::default();
    let raws = match ext.as_str() {
        "json" => decode_rows(unwrap_envelope(read_json_file(path)?)?, &mut report),
        "csv" => read_csv_reports(path, &mut report)?,
        _ => return Err(LoadError::UnsupportedFormat(path.display().to_string())),
    };
    report.pages = 1;
    let records = normalize_all(&raws);
    finish(&mut report, &records);
    Ok((records, report))
}
