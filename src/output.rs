use crate::types::{BucketRow, RegionRow, Summary};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn render_table<T: Tabled + Clone>(rows: &[T], max_rows: usize) -> String {
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T: Tabled + Clone>(rows: &[T], max_rows: usize) {
    println!("{}\n", render_table(rows, max_rows));
}

pub fn bucket_rows(summary: &Summary) -> Vec<BucketRow> {
    summary.buckets.iter().map(BucketRow::from).collect()
}

pub fn region_rows(summary: &Summary) -> Vec<RegionRow> {
    summary.regions.iter().map(RegionRow::from).collect()
}

/// Files written by `export_summary`.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub buckets: PathBuf,
    pub regions: PathBuf,
    pub summary: PathBuf,
}

/// Write the bucket table, the region table and the full summary into
/// `dir`, named after the window and granularity.
pub fn export_summary(dir: &Path, summary: &Summary) -> Result<ExportPaths, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let paths = ExportPaths {
        buckets: dir.join(format!(
            "{}_{}_buckets.csv",
            summary.window,
            summary.granularity.as_str()
        )),
        regions: dir.join(format!("{}_regions.csv", summary.window)),
        summary: dir.join(format!("{}_summary.json", summary.window)),
    };
    write_csv(&paths.buckets, &bucket_rows(summary))?;
    write_csv(&paths.regions, &region_rows(summary))?;
    write_json(&paths.summary, summary)?;
    Ok(paths)
}
