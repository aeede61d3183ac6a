use crate::pipeline::processing::enrich::EnrichedCalendar;
use crate::types::{Sheet, Table};

/// Source of the two inputs an enrichment run needs
pub trait EnrichInputPort {
    fn load_calendar(&self) -> anyhow::Result<Table>;
    fn load_lookup_sheets(&self) -> anyhow::Result<Vec<Sheet>>;
}

/// Destination for an enriched calendar
pub trait EnrichOutputPort {
    fn write_enriched_calendar(&self, calendar: &EnrichedCalendar) -> anyhow::Result<()>;
}
