// Pipeline ingestion: reading calendar exports and lookup workbooks into tables

pub mod reader;

pub use reader::{read_calendar, read_calendar_file, read_lookup, read_lookup_file};
