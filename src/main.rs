// Entry point: load a report export, summarise one window and print /
// export the result.
//
// Input is a `.json` export (bare list or API envelope), a `.csv` export,
// or a directory of saved API pages (`page-1.json`, `page-2.json`, ...).
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use field_report::loader::{self, LoadReport};
use field_report::output;
use field_report::util::{self, format_int, format_number};
use field_report::{summarize, Granularity, Summary, SummaryConfig, WindowKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "field_report")]
#[command(about = "Summarise field-sales visit and order reports", long_about = None)]
struct Cli {
    /// Report export (.json / .csv) or a directory of page-N.json files
    input: PathBuf,

    /// Lookback window: week, month or quarter (anything else means quarter)
    #[arg(short, long, default_value = "quarter")]
    window: String,

    /// Rollup period
    #[arg(short, long, value_enum, default_value_t = Granularity::Daily)]
    granularity: Granularity,

    /// Keep only the most recent N buckets
    #[arg(long)]
    max_buckets: Option<usize>,

    /// Reference instant (RFC 3339 or YYYY-MM-DD); defaults to the current time
    #[arg(long)]
    now: Option<String>,

    /// Directory for the exported CSV / JSON files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown in each console preview
    #[arg(long, default_value_t = 7)]
    preview_rows: usize,

    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "field_report=debug"
    } else {
        "field_report=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_now(arg: Option<&str>) -> Result<DateTime<Utc>> {
    match arg {
        None => Ok(Utc::now()),
        Some(s) => util::parse_instant_safe(Some(s))
            .ok_or_else(|| anyhow!("could not parse --now value '{s}'")),
    }
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing reports... ({} rows read, {} loaded, {} page(s))",
        format_int(report.total_rows),
        format_int(report.loaded_rows),
        format_int(report.pages)
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(report.parse_errors)
        );
    }
    if report.undated_rows > 0 {
        println!(
            "Note: {} reports have no usable date and are left out of every total.",
            format_int(report.undated_rows)
        );
    }
    println!();
}

fn print_summary(summary: &Summary, preview_rows: usize) {
    let t = &summary.totals;
    let i = &summary.insights;
    println!(
        "Window: last {} (since {})\n",
        summary.window,
        summary.cutoff.format("%Y-%m-%d %H:%M UTC")
    );
    println!("Totals");
    println!("  Reports:       {}", format_int(t.report_count));
    println!("  Doctors:       {}", format_int(t.doctors));
    println!("  Pharmacies:    {}", format_int(t.pharmacies));
    println!("  Dispensaries:  {}", format_int(t.dispensaries));
    println!("  Orders:        {}", format_int(t.orders));
    println!("  Order value:   {}\n", format_number(t.value, 2));

    println!("Insights");
    println!(
        "  Avg doctors/period: {}",
        format_number(i.avg_doctors_per_bucket, 1)
    );
    println!("  Conversion rate:   {}%", format_number(i.conversion_rate, 1));
    println!("  Avg order value:   {}", format_number(i.avg_order_value, 2));
    println!("  Activity ratio:    {}%\n", format_number(i.activity_ratio, 1));

    println!("Recent {} activity", summary.granularity.as_str());
    output::preview_table_rows(&output::bucket_rows(summary), preview_rows);

    println!("Regions");
    output::preview_table_rows(&output::region_rows(summary), preview_rows);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let now = resolve_now(cli.now.as_deref())?;
    let (records, load_report) = loader::load_and_clean(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    print_load_report(&load_report);

    let config = SummaryConfig {
        window: WindowKind::parse_lenient(&cli.window),
        granularity: cli.granularity,
        max_buckets: cli.max_buckets,
    };
    let summary = summarize(&records, &config, now);
    print_summary(&summary, cli.preview_rows);

    let paths = output::export_summary(&cli.out_dir, &summary)
        .map_err(|e| anyhow!("failed to write reports: {e}"))?;
    println!(
        "Exported {}, {} and {}",
        paths.buckets.display(),
        paths.regions.display(),
        paths.summary.display()
    );
    Ok(())
}
