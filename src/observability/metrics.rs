//! Metrics for the enrichment pipeline
//!
//! Recording goes through the `metrics` facade, so every call is a no-op until a
//! recorder is installed with [`init`]. The binary installs a Prometheus recorder
//! and can render the collected values at the end of a run.

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingestion metrics
    IngestDelimitedTables,
    IngestSpreadsheetTables,
    IngestRowsRead,

    // Lookup metrics
    LookupSheetsNormalized,
    LookupSheetsSkipped,
    LookupEntriesBuilt,

    // Enrich metrics
    EnrichRowsProcessed,
    EnrichRowsMatched,
    EnrichRowsUnmatched,
    EnrichDatesUnparsed,
    EnrichDomainsExtracted,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestDelimitedTables => "er_ingest_delimited_tables_total",
            MetricName::IngestSpreadsheetTables => "er_ingest_spreadsheet_tables_total",
            MetricName::IngestRowsRead => "er_ingest_rows_read_total",

            MetricName::LookupSheetsNormalized => "er_lookup_sheets_normalized_total",
            MetricName::LookupSheetsSkipped => "er_lookup_sheets_skipped_total",
            MetricName::LookupEntriesBuilt => "er_lookup_entries_built_total",

            MetricName::EnrichRowsProcessed => "er_enrich_rows_processed_total",
            MetricName::EnrichRowsMatched => "er_enrich_rows_matched_total",
            MetricName::EnrichRowsUnmatched => "er_enrich_rows_unmatched_total",
            MetricName::EnrichDatesUnparsed => "er_enrich_dates_unparsed_total",
            MetricName::EnrichDomainsExtracted => "er_enrich_domains_per_row",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder and return a handle for rendering
pub fn init() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    info!("Metrics system initialized");
    Ok(handle)
}

// ============================================================================
// Ingestion Metrics
// ============================================================================

pub mod ingest {
    use super::MetricName;

    pub fn delimited_table_read(rows: usize) {
        ::metrics::counter!(MetricName::IngestDelimitedTables.as_str()).increment(1);
        ::metrics::counter!(MetricName::IngestRowsRead.as_str()).increment(rows as u64);
    }

    pub fn spreadsheet_table_read(rows: usize) {
        ::metrics::counter!(MetricName::IngestSpreadsheetTables.as_str()).increment(1);
        ::metrics::counter!(MetricName::IngestRowsRead.as_str()).increment(rows as u64);
    }
}

// ============================================================================
// Lookup Metrics
// ============================================================================

pub mod lookup {
    use super::MetricName;

    pub fn sheet_normalized(entries: usize) {
        ::metrics::counter!(MetricName::LookupSheetsNormalized.as_str()).increment(1);
        ::metrics::counter!(MetricName::LookupEntriesBuilt.as_str()).increment(entries as u64);
    }

    pub fn sheet_skipped(sheet: &str) {
        ::metrics::counter!(MetricName::LookupSheetsSkipped.as_str(), "sheet" => sheet.to_string())
            .increment(1);
    }
}

// ============================================================================
// Enrich Metrics
// ============================================================================

pub mod enrich {
    use super::MetricName;

    pub fn row_processed(matched: bool, date_parsed: bool, domains: usize) {
        ::metrics::counter!(MetricName::EnrichRowsProcessed.as_str()).increment(1);
        if matched {
            ::metrics::counter!(MetricName::EnrichRowsMatched.as_str()).increment(1);
        } else {
            ::metrics::counter!(MetricName::EnrichRowsUnmatched.as_str()).increment(1);
        }
        if !date_parsed {
            ::metrics::counter!(MetricName::EnrichDatesUnparsed.as_str()).increment(1);
        }
        ::metrics::histogram!(MetricName::EnrichDomainsExtracted.as_str()).record(domains as f64);
    }
}
