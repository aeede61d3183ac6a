use anyhow::{Context, Result};
use tracing::info;

use crate::app::ports::{EnrichInputPort, EnrichOutputPort};
use crate::config::Config;
use crate::pipeline::processing::enrich::{CalendarEnricher, EnrichedCalendar, Enricher};
use crate::pipeline::processing::normalize::{LookupNormalizer, OrganisationLookup};

/// Use case for one enrichment run: load inputs, build the lookup once,
/// enrich the calendar and hand the result to the output port
pub struct EnrichUseCase {
    config: Config,
    input: Box<dyn EnrichInputPort>,
    output: Box<dyn EnrichOutputPort>,
}

impl EnrichUseCase {
    pub fn new(
        config: Config,
        input: Box<dyn EnrichInputPort>,
        output: Box<dyn EnrichOutputPort>,
    ) -> Self {
        Self {
            config,
            input,
            output,
        }
    }

    /// Load and normalize the lookup workbook
    pub fn build_lookup(&self) -> Result<OrganisationLookup> {
        let sheets = self
            .input
            .load_lookup_sheets()
            .context("Failed to load lookup workbook")?;
        Ok(LookupNormalizer::new(self.config.lookup.clone()).normalize(&sheets))
    }

    pub fn run(&self) -> Result<EnrichedCalendar> {
        let lookup = self.build_lookup()?;
        let calendar = self
            .input
            .load_calendar()
            .context("Failed to load calendar export")?;

        let enricher = CalendarEnricher::with_strategy(&lookup, self.config.enrich.strategy);
        let enriched = enricher.enrich(&calendar);

        self.output
            .write_enriched_calendar(&enriched)
            .context("Failed to write enriched calendar")?;

        info!(
            rows = enriched.summary.total_rows,
            matched = enriched.summary.matched_rows,
            "Enrichment run complete"
        );
        Ok(enriched)
    }
}
