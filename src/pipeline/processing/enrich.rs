use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::config::Config;
use crate::constants::{
    ATTENDEES_COLUMN, DATE_COLUMN, DOMAINS_COLUMN, LIST_SEPARATOR, ORGANISATION_TYPE_COLUMN,
    OUTPUT_DATE_FORMAT, QUARTER_COLUMN, REGION_COLUMN,
};
use crate::pipeline::processing::normalize::{
    normalize_lookup, LookupEntry, LookupNormalizer, OrganisationLookup,
};
use crate::pipeline::processing::parser::{extract_domains, parse_day_first, Quarter};
use crate::types::{cell_from_str, Cell, Sheet, Table};

/// How attendee domains are resolved against the lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// First lookup row whose rendered text contains the domain. Loose: a domain
    /// appearing in any column of an unrelated row still matches.
    #[default]
    Substring,
    /// Exact lookup against the domains listed in the lookup's domain columns
    ExactDomain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub strategy: MatchStrategy,
}

/// A calendar row after enrichment. `cells` holds the original values so
/// unrelated columns pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub cells: Vec<Cell>,
    pub date: Option<NaiveDateTime>,
    pub attendees: Option<String>,
    pub quarter: Option<Quarter>,
    pub domains: Vec<String>,
    pub organisation_type: Option<String>,
    pub region: Option<String>,
}

impl CalendarRow {
    pub fn is_matched(&self) -> bool {
        self.organisation_type.is_some() || self.region.is_some()
    }
}

/// Counts reported after an enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    pub total_rows: usize,
    pub dated_rows: usize,
    pub rows_with_domains: usize,
    pub matched_rows: usize,
    /// Distinct domains from rows that found no lookup entry, sorted
    pub unmatched_domains: Vec<String>,
}

/// Enriched rows plus the column layout they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCalendar {
    pub columns: Vec<String>,
    pub rows: Vec<CalendarRow>,
    pub summary: EnrichmentSummary,
}

impl EnrichedCalendar {
    /// Render as a table: original columns (with "Date" rewritten to the parsed
    /// value) followed by Quarter, Domains, Type of Organisation and Region.
    /// Existing derived columns are overwritten rather than duplicated.
    pub fn to_table(&self) -> Table {
        let mut table = Table::from_rows(
            self.columns.clone(),
            self.rows.iter().map(|r| r.cells.clone()).collect(),
        );

        table.set_column(
            DATE_COLUMN,
            self.derived_column(|r| r.date.map(|d| d.format(OUTPUT_DATE_FORMAT).to_string())),
        );
        table.set_column(
            QUARTER_COLUMN,
            self.derived_column(|r| r.quarter.map(|q| q.to_string())),
        );
        table.set_column(
            DOMAINS_COLUMN,
            self.derived_column(|r| cell_from_str(&r.domains.join(LIST_SEPARATOR))),
        );
        table.set_column(
            ORGANISATION_TYPE_COLUMN,
            self.derived_column(|r| r.organisation_type.clone()),
        );
        table.set_column(
            REGION_COLUMN,
            self.derived_column(|r| r.region.as_deref().and_then(cell_from_str)),
        );
        table
    }

    fn derived_column<F>(&self, f: F) -> Vec<Cell>
    where
        F: Fn(&CalendarRow) -> Cell,
    {
        self.rows.iter().map(f).collect()
    }
}

/// Trait for enriching calendar tables with organisation attributes
pub trait Enricher {
    fn enrich(&self, calendar: &Table) -> EnrichedCalendar;
}

/// Default enricher: day-first dates, quarter labels, attendee domains and a
/// first-match lookup of organisation type and region.
pub struct CalendarEnricher<'a> {
    lookup: &'a OrganisationLookup,
    strategy: MatchStrategy,
}

impl<'a> CalendarEnricher<'a> {
    pub fn new(lookup: &'a OrganisationLookup) -> Self {
        Self {
            lookup,
            strategy: MatchStrategy::default(),
        }
    }

    pub fn with_strategy(lookup: &'a OrganisationLookup, strategy: MatchStrategy) -> Self {
        Self { lookup, strategy }
    }

    /// First domain (in row order) that resolves, using the first lookup entry
    /// (in build order) that it resolves to
    pub fn match_domains(&self, domains: &[String]) -> Option<&'a LookupEntry> {
        domains.iter().find_map(|domain| match self.strategy {
            MatchStrategy::Substring => self.lookup.find_containing(domain),
            MatchStrategy::ExactDomain => self.lookup.find_exact(domain),
        })
    }

    fn enrich_row(&self, calendar: &Table, row: usize) -> CalendarRow {
        let date = calendar.get(row, DATE_COLUMN).and_then(parse_day_first);
        let attendees = calendar.get(row, ATTENDEES_COLUMN).map(str::to_string);
        let domains = extract_domains(attendees.as_deref());

        let (organisation_type, region) = match self.match_domains(&domains) {
            Some(entry) => (entry.organisation_type.clone(), Some(entry.region.clone())),
            None => (None, None),
        };

        CalendarRow {
            cells: calendar.rows()[row].clone(),
            quarter: date.as_ref().map(Quarter::from_date),
            date,
            attendees,
            domains,
            organisation_type,
            region,
        }
    }
}

impl Enricher for CalendarEnricher<'_> {
    fn enrich(&self, calendar: &Table) -> EnrichedCalendar {
        let mut calendar = calendar.clone();
        calendar.ensure_column(DATE_COLUMN);
        calendar.ensure_column(ATTENDEES_COLUMN);

        let mut summary = EnrichmentSummary::default();
        let mut unmatched = BTreeSet::new();
        let mut rows = Vec::with_capacity(calendar.len());

        for idx in 0..calendar.len() {
            let row = self.enrich_row(&calendar, idx);

            summary.total_rows += 1;
            if row.date.is_some() {
                summary.dated_rows += 1;
            }
            if !row.domains.is_empty() {
                summary.rows_with_domains += 1;
            }
            if row.is_matched() {
                summary.matched_rows += 1;
            } else if !row.domains.is_empty() {
                trace!(row = idx, domains = ?row.domains, "No lookup entry for attendee domains");
                unmatched.extend(row.domains.iter().cloned());
            }

            crate::observability::metrics::enrich::row_processed(
                row.is_matched(),
                row.date.is_some(),
                row.domains.len(),
            );
            rows.push(row);
        }

        summary.unmatched_domains = unmatched.into_iter().collect();
        info!(
            total = summary.total_rows,
            dated = summary.dated_rows,
            with_domains = summary.rows_with_domains,
            matched = summary.matched_rows,
            unmatched_domains = summary.unmatched_domains.len(),
            strategy = ?self.strategy,
            "Enriched calendar rows"
        );

        EnrichedCalendar {
            columns: calendar.columns().to_vec(),
            rows,
            summary,
        }
    }
}

/// Enrich calendar rows against a multi-sheet lookup using the built-in settings
pub fn process_calendar(calendar_rows: &Table, lookup_sheets: &[Sheet]) -> Table {
    let lookup = normalize_lookup(lookup_sheets);
    CalendarEnricher::new(&lookup).enrich(calendar_rows).to_table()
}

/// Enrich calendar rows with explicit configuration, keeping the structured result
pub fn process_calendar_with(
    calendar_rows: &Table,
    lookup_sheets: &[Sheet],
    config: &Config,
) -> EnrichedCalendar {
    let lookup = LookupNormalizer::new(config.lookup.clone()).normalize(lookup_sheets);
    CalendarEnricher::with_strategy(&lookup, config.enrich.strategy).enrich(calendar_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{REGION_CENTRAL, REGION_NORTHERN};

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| cell_from_str(c)).collect())
                .collect(),
        )
    }

    fn lookup_sheets() -> Vec<Sheet> {
        vec![Sheet::new(
            "Organisations",
            table(
                &["Organisation", "Type of Organisation", "Domain", REGION_NORTHERN, REGION_CENTRAL],
                &[
                    &["Acme Trust", "NGO", "example.com", "x", ""],
                    &["Example Council", "Local Government", "council.example.com", "", "x"],
                    &["Hauora Ltd", "Health Provider", "hauora.nz", "x", "X"],
                ],
            ),
        )]
    }

    #[test]
    fn test_end_to_end_row() {
        let calendar = table(&["Date", "Required Attendees"], &[&["01/02/2024", "a@example.com"]]);

        let out = process_calendar(&calendar, &lookup_sheets());
        assert_eq!(out.get(0, "Quarter"), Some("2024Q1"));
        assert_eq!(out.get(0, "Domains"), Some("example.com"));
        assert_eq!(out.get(0, "Type of Organisation"), Some("NGO"));
        assert_eq!(out.get(0, "Region"), Some("Northern | Te Tai Tokerau"));
        assert_eq!(out.get(0, "Date"), Some("2024-02-01 00:00:00"));
    }

    #[test]
    fn test_missing_columns_are_inserted() {
        let calendar = table(&["Subject"], &[&["Standup"]]);

        let out = process_calendar(&calendar, &lookup_sheets());
        for column in ["Subject", "Date", "Required Attendees", "Quarter", "Domains", "Type of Organisation", "Region"] {
            assert!(out.has_column(column), "missing column {column}");
        }
        assert_eq!(out.get(0, "Subject"), Some("Standup"));
        assert_eq!(out.get(0, "Quarter"), None);
        assert_eq!(out.get(0, "Type of Organisation"), None);
    }

    #[test]
    fn test_quarter_null_iff_date_null() {
        let calendar = table(
            &["Date", "Required Attendees"],
            &[&["15/08/2023", ""], &["not a date", ""], &["", ""]],
        );
        let lookup = normalize_lookup(&lookup_sheets());
        let enriched = CalendarEnricher::new(&lookup).enrich(&calendar);

        for row in &enriched.rows {
            assert_eq!(row.quarter.is_none(), row.date.is_none());
        }
        assert_eq!(enriched.rows[0].quarter.map(|q| q.to_string()), Some("2023Q3".to_string()));
        assert_eq!(enriched.summary.dated_rows, 1);
    }

    #[test]
    fn test_no_emails_means_no_match() {
        let calendar = table(&["Date", "Required Attendees"], &[&["01/02/2024", "Jane Doe; Bob"]]);
        let lookup = normalize_lookup(&lookup_sheets());
        let enriched = CalendarEnricher::new(&lookup).enrich(&calendar);

        let row = &enriched.rows[0];
        assert!(row.domains.is_empty());
        assert_eq!(row.organisation_type, None);
        assert_eq!(row.region, None);
    }

    #[test]
    fn test_first_domain_with_a_match_wins() {
        let calendar = table(
            &["Required Attendees"],
            &[&["someone@gmail.com; nurse@hauora.nz; a@example.com"]],
        );
        let lookup = normalize_lookup(&lookup_sheets());
        let enriched = CalendarEnricher::new(&lookup).enrich(&calendar);

        let row = &enriched.rows[0];
        assert_eq!(row.domains, vec!["gmail.com", "hauora.nz", "example.com"]);
        assert_eq!(row.organisation_type.as_deref(), Some("Health Provider"));
        assert_eq!(
            row.region.as_deref(),
            Some("Northern | Te Tai Tokerau, Central | Te Ikaroa")
        );
    }

    #[test]
    fn test_substring_match_uses_first_lookup_row() {
        // "example.com" is also a substring of "council.example.com" but the
        // first row in build order wins every time
        let calendar = table(&["Required Attendees"], &[&["mayor@example.com"]]);
        let lookup = normalize_lookup(&lookup_sheets());
        let enricher = CalendarEnricher::new(&lookup);

        for _ in 0..5 {
            let enriched = enricher.enrich(&calendar);
            assert_eq!(enriched.rows[0].organisation_type.as_deref(), Some("NGO"));
        }
    }

    #[test]
    fn test_substring_match_can_hit_unrelated_columns() {
        // A domain that appears only in a name column still matches under the loose strategy
        let sheets = vec![Sheet::new(
            "Orgs",
            table(&["Notes", "Type of Organisation"], &[&["formerly trust.org", "Iwi"]]),
        )];
        let calendar = table(&["Required Attendees"], &[&["x@trust.org"]]);

        let out = process_calendar(&calendar, &sheets);
        assert_eq!(out.get(0, "Type of Organisation"), Some("Iwi"));
    }

    #[test]
    fn test_exact_domain_strategy() {
        let lookup = normalize_lookup(&lookup_sheets());
        let enricher = CalendarEnricher::with_strategy(&lookup, MatchStrategy::ExactDomain);
        let calendar = table(
            &["Required Attendees"],
            &[&["clerk@council.example.com"], &["x@ample.com"]],
        );

        let enriched = enricher.enrich(&calendar);
        assert_eq!(enriched.rows[0].organisation_type.as_deref(), Some("Local Government"));
        assert_eq!(enriched.rows[1].organisation_type, None);
        assert_eq!(enriched.summary.unmatched_domains, vec!["ample.com"]);
    }

    #[test]
    fn test_unmarked_region_is_empty_cell_in_output() {
        let sheets = vec![Sheet::new(
            "Orgs",
            table(&["Type of Organisation", "Domain"], &[&["Club", "club.nz"]]),
        )];
        let calendar = table(&["Required Attendees"], &[&["a@club.nz"]]);

        let lookup = normalize_lookup(&sheets);
        let enriched = CalendarEnricher::new(&lookup).enrich(&calendar);
        assert_eq!(enriched.rows[0].region.as_deref(), Some(""));
        assert_eq!(enriched.to_table().get(0, "Region"), None);
        assert_eq!(enriched.to_table().get(0, "Type of Organisation"), Some("Club"));
    }

    #[test]
    fn test_enrichment_is_idempotent() {
        let calendar = table(
            &["Subject", "Date", "Required Attendees"],
            &[
                &["Hui", "01/02/2024", "a@example.com; b@hauora.nz"],
                &["Call", "garbage", "nobody@nowhere.test"],
                &["Catch-up", "2024-11-30 09:30:00", ""],
            ],
        );
        let sheets = lookup_sheets();

        let once = process_calendar(&calendar, &sheets);
        let twice = process_calendar(&once, &sheets);

        for column in ["Date", "Quarter", "Domains", "Type of Organisation", "Region"] {
            for row in 0..once.len() {
                assert_eq!(once.get(row, column), twice.get(row, column), "{column} row {row}");
            }
        }
        assert_eq!(once.columns(), twice.columns());
    }

    #[test]
    fn test_summary_counts() {
        let calendar = table(
            &["Date", "Required Attendees"],
            &[
                &["01/02/2024", "a@example.com"],
                &["02/02/2024", "b@unknown.org, c@UNKNOWN.org"],
                &["", ""],
            ],
        );
        let lookup = normalize_lookup(&lookup_sheets());
        let summary = CalendarEnricher::new(&lookup).enrich(&calendar).summary;

        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.dated_rows, 2);
        assert_eq!(summary.rows_with_domains, 2);
        assert_eq!(summary.matched_rows, 1);
        assert_eq!(summary.unmatched_domains, vec!["unknown.org"]);
    }

    #[test]
    fn test_process_calendar_with_config() {
        let mut config = Config::default();
        config.enrich.strategy = MatchStrategy::ExactDomain;
        let calendar = table(&["Required Attendees"], &[&["a@hauora.nz"]]);

        let enriched = process_calendar_with(&calendar, &lookup_sheets(), &config);
        assert_eq!(enriched.rows[0].organisation_type.as_deref(), Some("Health Provider"));
    }
}
