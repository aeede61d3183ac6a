use anyhow::Context;
use std::path::PathBuf;

use crate::app::ports::EnrichInputPort;
use crate::pipeline::ingestion::reader::{read_calendar_file, read_lookup_file};
use crate::types::{Sheet, Table};

/// Reads the calendar export and lookup workbook from local files
pub struct FileEnrichInputAdapter {
    calendar_path: PathBuf,
    lookup_path: PathBuf,
}

impl FileEnrichInputAdapter {
    pub fn new(calendar_path: impl Into<PathBuf>, lookup_path: impl Into<PathBuf>) -> Self {
        Self {
            calendar_path: calendar_path.into(),
            lookup_path: lookup_path.into(),
        }
    }
}

impl EnrichInputPort for FileEnrichInputAdapter {
    fn load_calendar(&self) -> anyhow::Result<Table> {
        read_calendar_file(&self.calendar_path)
            .with_context(|| format!("reading {}", self.calendar_path.display()))
    }

    fn load_lookup_sheets(&self) -> anyhow::Result<Vec<Sheet>> {
        read_lookup_file(&self.lookup_path)
            .with_context(|| format!("reading {}", self.lookup_path.display()))
    }
}
