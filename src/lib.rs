pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod types;

// Application layer (use cases and ports) and its infrastructure adapters
pub mod app;
pub mod infra;

pub use pipeline::{process_calendar, process_calendar_with};
