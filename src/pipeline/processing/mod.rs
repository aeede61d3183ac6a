// Pipeline processing: field parsing, lookup normalization and calendar enrichment

pub mod parser;
pub mod normalize;
pub mod enrich;

pub use enrich::{process_calendar, process_calendar_with};
