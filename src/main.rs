use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use engagement_reporter::app::enrich_use_case::EnrichUseCase;
use engagement_reporter::config::Config;
use engagement_reporter::infra::{CsvEnrichOutputAdapter, FileEnrichInputAdapter};
use engagement_reporter::observability::{self, metrics};
use engagement_reporter::pipeline::ingestion::read_lookup_file;
use engagement_reporter::pipeline::processing::normalize::LookupNormalizer;
use engagement_reporter::types::Table;

#[derive(Parser)]
#[command(name = "engagement_reporter")]
#[command(about = "Tags calendar meetings with organisation type and region from attendee email domains")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print collected metrics in Prometheus text format when finished
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a calendar export (CSV or spreadsheet) and write the result as CSV
    Enrich {
        /// Calendar export exported from Outlook or similar
        #[arg(long)]
        calendar: PathBuf,
        /// Organisation lookup workbook
        #[arg(long)]
        lookup: PathBuf,
        /// Where to write the enriched CSV (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Number of rows to preview on stdout (overrides config)
        #[arg(long)]
        preview: Option<usize>,
    },
    /// Print the normalized organisation lookup
    Lookup {
        /// Organisation lookup workbook
        #[arg(long)]
        lookup: PathBuf,
        /// Print full entries as JSON instead of the two-column table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    observability::init_logging();

    let cli = Cli::parse();

    let metrics_handle = if cli.print_metrics {
        Some(metrics::init().map_err(|e| anyhow!("{}", e))?)
    } else {
        None
    };

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let outcome = match cli.command {
        Commands::Enrich {
            calendar,
            lookup,
            output,
            preview,
        } => run_enrich(config, calendar, lookup, output, preview),
        Commands::Lookup { lookup, json } => run_lookup(config, lookup, json),
    };

    if let Err(e) = &outcome {
        error!("Run failed: {:#}", e);
    }

    if let Some(handle) = metrics_handle {
        println!("{}", handle.render());
    }

    outcome
}

fn run_enrich(
    config: Config,
    calendar: PathBuf,
    lookup: PathBuf,
    output: Option<PathBuf>,
    preview: Option<usize>,
) -> Result<()> {
    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.output.path));
    let preview_rows = preview.unwrap_or(config.output.preview_rows);

    info!(calendar = %calendar.display(), lookup = %lookup.display(), "Starting enrichment");

    let input = FileEnrichInputAdapter::new(calendar, lookup);
    let output = CsvEnrichOutputAdapter::new(&output_path)?;
    let written_to = output.file_path().to_path_buf();
    let use_case = EnrichUseCase::new(config, Box::new(input), Box::new(output));

    let enriched = use_case.run()?;
    let summary = &enriched.summary;

    println!("\n📊 Enrichment results:");
    println!("   Rows: {}", summary.total_rows);
    println!("   With a parsed date: {}", summary.dated_rows);
    println!("   With attendee domains: {}", summary.rows_with_domains);
    println!("   Matched to an organisation: {}", summary.matched_rows);
    println!("   Output file: {}", written_to.display());

    if !summary.unmatched_domains.is_empty() {
        println!("\n⚠️  Domains with no lookup entry:");
        for domain in &summary.unmatched_domains {
            println!("   - {}", domain);
        }
    }

    if preview_rows > 0 {
        println!("\nPreview of processed calendar data:");
        println!("{}", render_preview(&enriched.to_table(), preview_rows));
    }

    Ok(())
}

fn run_lookup(config: Config, lookup: PathBuf, json: bool) -> Result<()> {
    let sheets = read_lookup_file(&lookup)
        .with_context(|| format!("reading {}", lookup.display()))?;
    let lookup = LookupNormalizer::new(config.lookup).normalize(&sheets);
    if json {
        println!("{}", serde_json::to_string_pretty(lookup.entries())?);
    } else {
        println!("{}", render_preview(&lookup.to_table(), lookup.len()));
    }
    Ok(())
}

/// Plain-text preview of the first `rows` rows, one line per row
fn render_preview(table: &Table, rows: usize) -> String {
    let head = table.head(rows);
    let mut lines = vec![head.columns().join(" | ")];
    for row in head.rows() {
        lines.push(
            row.iter()
                .map(|cell| cell.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    lines.join("\n")
}
