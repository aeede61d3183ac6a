use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_DOMAIN_COLUMNS, KNOWN_REGIONS, LIST_SEPARATOR, ORGANISATION_TYPE_ALIASES,
    ORGANISATION_TYPE_COLUMN, REGION_COLUMN, REGION_MARKER,
};
use crate::types::{Sheet, Table};

/// One organisation row flattened out of the reference workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    /// Organisation type; `None` when the source cell is blank
    pub organisation_type: Option<String>,
    /// Names of the regions marked for this row, joined with ", " (may be empty)
    pub region: String,
    /// Sheet the row came from
    pub sheet: String,
    /// Text rendering of the full source row, used for substring matching
    pub source_text: String,
}

impl LookupEntry {
    /// Split the composite region value into individual region names
    pub fn regions(&self) -> Vec<&str> {
        self.region
            .split(LIST_SEPARATOR)
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Whether the stringified source row contains `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.source_text.contains(needle)
    }
}

/// Column names the normalizer looks for in each lookup sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Accepted spellings of the organisation-type header (compared case-insensitively)
    pub organisation_columns: Vec<String>,
    /// Region indicator headers, in the order their names are joined
    pub region_columns: Vec<String>,
    /// Headers whose cells list an organisation's email domains or website
    pub domain_columns: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            organisation_columns: ORGANISATION_TYPE_ALIASES.map(String::from).to_vec(),
            region_columns: KNOWN_REGIONS.map(String::from).to_vec(),
            domain_columns: DEFAULT_DOMAIN_COLUMNS.map(String::from).to_vec(),
        }
    }
}

/// The normalized reference data, built once and passed to the enricher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganisationLookup {
    entries: Vec<LookupEntry>,
    /// Normalized domain → index of the first entry listing it
    domain_index: HashMap<String, usize>,
}

impl OrganisationLookup {
    pub fn entries(&self) -> &[LookupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry, in build order, whose source row text contains `domain`
    pub fn find_containing(&self, domain: &str) -> Option<&LookupEntry> {
        self.entries.iter().find(|entry| entry.mentions(domain))
    }

    /// Entry whose domain columns list exactly `domain`
    pub fn find_exact(&self, domain: &str) -> Option<&LookupEntry> {
        self.domain_index
            .get(domain)
            .and_then(|&idx| self.entries.get(idx))
    }

    pub fn indexed_domains(&self) -> usize {
        self.domain_index.len()
    }

    /// The two-column view: organisation type and region
    pub fn to_table(&self) -> Table {
        let rows = self
            .entries
            .iter()
            .map(|e| {
                vec![
                    e.organisation_type.clone(),
                    Some(e.region.clone()).filter(|r| !r.is_empty()),
                ]
            })
            .collect();
        Table::from_rows(
            vec![ORGANISATION_TYPE_COLUMN.to_string(), REGION_COLUMN.to_string()],
            rows,
        )
    }

    fn push(&mut self, entry: LookupEntry, domains: Vec<String>) {
        let idx = self.entries.len();
        self.entries.push(entry);
        for domain in domains {
            self.domain_index.entry(domain).or_insert(idx);
        }
    }
}

/// Flattens a multi-sheet reference workbook into an [`OrganisationLookup`]
#[derive(Debug, Clone, Default)]
pub struct LookupNormalizer {
    pub config: NormalizerConfig,
}

impl LookupNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalize every sheet in workbook order. Sheets without an organisation-type
    /// column contribute nothing.
    pub fn normalize(&self, sheets: &[Sheet]) -> OrganisationLookup {
        let mut lookup = OrganisationLookup::default();

        for sheet in sheets {
            let mut table = sheet.table.clone();
            table.trim_column_names();

            let Some(org_idx) = self.organisation_column(&table) else {
                debug!(sheet = %sheet.name, "Skipping lookup sheet without an organisation type column");
                crate::observability::metrics::lookup::sheet_skipped(&sheet.name);
                continue;
            };

            let region_columns: Vec<(usize, &str)> = self
                .config
                .region_columns
                .iter()
                .filter_map(|region| table.column_index(region).map(|idx| (idx, region.as_str())))
                .collect();

            let domain_columns: Vec<usize> = table
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, name)| {
                    self.config
                        .domain_columns
                        .iter()
                        .any(|d| d.eq_ignore_ascii_case(name))
                })
                .map(|(idx, _)| idx)
                .collect();

            for (row_idx, row) in table.rows().iter().enumerate() {
                let organisation_type = row[org_idx]
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);

                let region = region_columns
                    .iter()
                    .filter(|(idx, _)| is_marked(row[*idx].as_deref()))
                    .map(|(_, name)| *name)
                    .collect::<Vec<_>>()
                    .join(LIST_SEPARATOR);

                let domains = domain_columns
                    .iter()
                    .filter_map(|&idx| row[idx].as_deref())
                    .flat_map(split_domain_cell)
                    .collect();

                lookup.push(
                    LookupEntry {
                        organisation_type,
                        region,
                        sheet: sheet.name.clone(),
                        source_text: render_row(&table, row_idx),
                    },
                    domains,
                );
            }

            debug!(sheet = %sheet.name, rows = table.len(), "Normalized lookup sheet");
            crate::observability::metrics::lookup::sheet_normalized(table.len());
        }

        info!(
            entries = lookup.len(),
            indexed_domains = lookup.indexed_domains(),
            "Built organisation lookup from {} sheet(s)",
            sheets.len()
        );
        lookup
    }

    /// Aliases are tried in configured order. An exact spelling wins over a
    /// case-insensitive one, so a sheet carrying both spellings resolves to
    /// the first configured alias.
    fn organisation_column(&self, table: &Table) -> Option<usize> {
        let aliases = &self.config.organisation_columns;
        aliases
            .iter()
            .find_map(|alias| table.column_index(alias))
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    table
                        .columns()
                        .iter()
                        .position(|name| alias.eq_ignore_ascii_case(name))
                })
            })
    }
}

/// Normalize lookup sheets with the built-in column names
pub fn normalize_lookup(sheets: &[Sheet]) -> OrganisationLookup {
    LookupNormalizer::default().normalize(sheets)
}

fn is_marked(cell: Option<&str>) -> bool {
    cell.is_some_and(|value| value.trim().eq_ignore_ascii_case(REGION_MARKER))
}

/// `name: value` lines for every non-null cell of a row
fn render_row(table: &Table, row: usize) -> String {
    table
        .named_row(row)
        .filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a domain/website cell into normalized bare domains.
/// `https://www.Example.org/about` → `example.org`, `@example.org` → `example.org`,
/// `info@example.org` → `example.org`.
fn split_domain_cell(cell: &str) -> Vec<String> {
    cell.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter_map(normalize_domain)
        .collect()
}

fn normalize_domain(raw: &str) -> Option<String> {
    let mut value = raw.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = value.strip_prefix(prefix) {
            value = rest.to_string();
        }
    }
    if let Some((_, domain)) = value.rsplit_once('@') {
        value = domain.to_string();
    }
    if let Some(rest) = value.strip_prefix("www.") {
        value = rest.to_string();
    }
    if let Some((host, _)) = value.split_once('/') {
        value = host.to_string();
    }
    let value = value.trim_end_matches('.');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
