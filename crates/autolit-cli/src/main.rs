//! autolit - Autoimmune disease literature aggregator
//!
//! Queries PubMed, Europe PMC, OpenAlex and bioRxiv/medRxiv for a
//! configured set of autoimmune diseases, normalizes everything into one
//! record schema, deduplicates across sources and writes JSON/CSV dumps.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

mod config;
mod runner;

use config::Config;
use runner::{RunOptions, SOURCES};

#[derive(Parser)]
#[command(name = "autolit")]
#[command(about = "Autoimmune disease literature aggregator")]
#[command(version)]
struct Cli {
    /// Disease keys to collect, comma-separated, or "all"
    #[arg(long, value_delimiter = ',', default_value = "all")]
    diseases: Vec<String>,

    /// Sources to query, comma-separated, or "all"
    #[arg(long, value_delimiter = ',', default_value = "all")]
    sources: Vec<String>,

    /// Maximum results per disease per source
    #[arg(long)]
    max_results: Option<usize>,

    /// Preprint window in years (bioRxiv/medRxiv only)
    #[arg(long)]
    years_back: Option<u32>,

    /// Contact email for NCBI and the OpenAlex polite pool
    #[arg(long)]
    email: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format(s), comma-separated or repeated
    #[arg(long, value_enum, value_delimiter = ',')]
    output_format: Vec<OutputFormat>,

    /// Config file path (default: ./autolit.toml or ~/.config/autolit/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    fn from_config(s: &str) -> Option<Self> {
        match s {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            "both" => Some(OutputFormat::Both),
            _ => None,
        }
    }
}

/// Collapse the requested format list into (json, csv) write flags.
fn format_flags(formats: &[OutputFormat]) -> (bool, bool) {
    let json = formats
        .iter()
        .any(|f| matches!(f, OutputFormat::Json | OutputFormat::Both));
    let csv = formats
        .iter()
        .any(|f| matches!(f, OutputFormat::Csv | OutputFormat::Both));
    (json, csv)
}

/// Expand a possibly-"all" selector into the full list.
fn expand_all(requested: &[String], everything: &[&str]) -> Vec<String> {
    if requested.iter().any(|r| r == "all") {
        everything.iter().map(|s| s.to_string()).collect()
    } else {
        requested.to_vec()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    autolit_core::logging::init_logging(cli.quiet, cli.debug);

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI overrides config file overrides defaults
    let mut formats = cli.output_format.clone();
    if formats.is_empty() {
        formats.extend(OutputFormat::from_config(&config.output.format));
    }
    if formats.is_empty() {
        formats.push(OutputFormat::Json);
    }
    let (as_json, as_csv) = format_flags(&formats);
    let output_dir = cli.output_dir.unwrap_or_else(|| config.output.dir.clone());

    let opts = RunOptions {
        diseases: expand_all(&cli.diseases, &autolit_core::diseases::all_keys()),
        sources: expand_all(&cli.sources, SOURCES),
        max_results: cli.max_results.unwrap_or(config.defaults.max_results),
        years_back: cli.years_back.unwrap_or(config.defaults.years_back),
        email: cli.email.or(config.contact.email),
    };

    let outcome = runner::run(&opts, &output_dir, as_json, as_csv)?;
    print_summary(&outcome);
    Ok(())
}

fn print_summary(outcome: &runner::RunOutcome) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let summary = &outcome.summary;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Metric").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Unique papers".to_string(),
        summary.total_papers.to_string(),
    ]);
    for (source, count) in &summary.papers_by_source {
        table.add_row(vec![format!("  from {source}"), count.to_string()]);
    }
    for (key, report) in &summary.papers_by_disease {
        table.add_row(vec![
            format!("  on {key}"),
            report.paper_count.to_string(),
        ]);
    }
    table.add_row(vec![
        "DOI coverage".to_string(),
        format!("{:.1}%", summary.statistics.coverage.doi_percentage),
    ]);
    table.add_row(vec![
        "PMID coverage".to_string(),
        format!("{:.1}%", summary.statistics.coverage.pmid_percentage),
    ]);
    if let (Some(earliest), Some(latest)) = (
        summary.statistics.date_range.earliest,
        summary.statistics.date_range.latest,
    ) {
        table.add_row(vec![
            "Date range".to_string(),
            format!("{earliest} to {latest}"),
        ]);
    }
    for path in &outcome.files {
        table.add_row(vec!["Output".to_string(), path.display().to_string()]);
    }

    eprintln!("\n{table}");
}
