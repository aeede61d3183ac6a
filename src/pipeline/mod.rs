// Enrichment pipeline: ingestion and processing stages

pub mod ingestion;
pub mod processing;

pub use processing::{process_calendar, process_calendar_with};
