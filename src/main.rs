use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use staphwatch::{
    antibiogram::AgentClass,
    export::{write_records_parquet, Report},
    render,
    surveillance::{Period, PeriodFilter},
    Config, DatasetCache,
};
use std::{io, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Staphylococcus aureus resistance surveillance: summary, alerts and trends
/// for a month range or a single day.
#[derive(Parser, Debug)]
#[command(name = "staphwatch", version)]
struct Args {
    /// YAML config file; falls back to $STAPHWATCH_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of CSV exports or a .zip bundle (overrides config)
    #[arg(long)]
    data: Option<PathBuf>,

    /// First month of the range, e.g. "January 2024" or "January"
    #[arg(long)]
    start: Option<String>,

    /// Last month of the range, inclusive
    #[arg(long)]
    end: Option<String>,

    /// Exact day (YYYY-MM-DD); overrides the range
    #[arg(long)]
    day: Option<NaiveDate>,

    /// Phenotypes to highlight (repeatable); defaults to the config list
    #[arg(long = "highlight", value_name = "PHENOTYPE")]
    highlight: Vec<String>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Also write the filtered records to this Parquet file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Print both antibiogram tables
    #[arg(long)]
    show_antibiograms: bool,
}

fn resolve_period(label: Option<&str>, year: i32, fallback: Period) -> Result<Period> {
    match label {
        None => Ok(fallback),
        Some(l) => Period::parse_label(l, Some(year)).ok_or_else(|| anyhow!("not a month label: {:?}", l)),
    }
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // ─── 2) configuration ────────────────────────────────────────────
    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(data) = args.data {
        cfg.data_dir = data;
    }
    info!(data = %cfg.data_dir.display(), year = cfg.year, "startup");

    // ─── 3) load once ────────────────────────────────────────────────
    let cache = DatasetCache::new();
    let dataset = cache.get_or_load(&cfg)?;

    // ─── 4) filter ───────────────────────────────────────────────────
    let full = PeriodFilter::full_year(cfg.year).ok_or_else(|| anyhow!("invalid year {}", cfg.year))?;
    let filter = PeriodFilter {
        start: resolve_period(args.start.as_deref(), cfg.year, full.start)?,
        end: resolve_period(args.end.as_deref(), cfg.year, full.end)?,
        day: args.day,
    };
    if filter.day.is_none() && filter.start > filter.end {
        warn!(start = %filter.start, end = %filter.end, "range start is after its end");
    }

    let highlight = if args.highlight.is_empty() {
        cfg.highlight.clone()
    } else {
        args.highlight
    };
    let report = Report::build(&dataset, &filter, &highlight, cfg.mrsa_alert_factor);
    info!(records = report.records.len(), alerts = report.alerts.len(), "report built");

    // ─── 5) output ───────────────────────────────────────────────────
    if let Some(path) = &args.export {
        write_records_parquet(&report.records, path)
            .with_context(|| format!("exporting to {}", path.display()))?;
    }

    if args.json {
        report.write_json(io::stdout().lock())?;
        println!();
        return Ok(());
    }

    print!("{}", render::render_report(&report));
    if args.show_antibiograms {
        for class in [AgentClass::Key, AgentClass::Other] {
            println!("\n{}", class);
            render::antibiogram_table(dataset.antibiogram(class)).printstd();
        }
    }
    Ok(())
}
