//! Column names shared by the calendar input, the lookup workbook and the output table

// Calendar input columns
pub const DATE_COLUMN: &str = "Date";
pub const ATTENDEES_COLUMN: &str = "Required Attendees";

// Columns appended by the enricher
pub const QUARTER_COLUMN: &str = "Quarter";
pub const DOMAINS_COLUMN: &str = "Domains";
pub const ORGANISATION_TYPE_COLUMN: &str = "Type of Organisation";
pub const REGION_COLUMN: &str = "Region";

// Lookup workbook columns
pub const ORGANISATION_TYPE_ALIASES: [&str; 2] = ["Type of organisation", "Type of Organisation"];

pub const REGION_NORTHERN: &str = "Northern | Te Tai Tokerau";
pub const REGION_MIDLAND: &str = "Midland | Te Manawa Taki";
pub const REGION_CENTRAL: &str = "Central | Te Ikaroa";
pub const REGION_SOUTH_ISLAND: &str = "South Island | Te Waipounamu";

/// Region indicator columns in the order their names are joined
pub const KNOWN_REGIONS: [&str; 4] = [
    REGION_NORTHERN,
    REGION_MIDLAND,
    REGION_CENTRAL,
    REGION_SOUTH_ISLAND,
];

/// Cell content that marks a region as applicable (compared trimmed, case-insensitively)
pub const REGION_MARKER: &str = "x";

/// Separator used when joining multiple regions or domains into one cell
pub const LIST_SEPARATOR: &str = ", ";

/// Columns consulted by the exact-domain match strategy
pub const DEFAULT_DOMAIN_COLUMNS: [&str; 3] = ["Domain", "Email Domain", "Website"];

/// Rendering used when a parsed date is written back to the output table
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_OUTPUT_PATH: &str = "output/processed_calendar.csv";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
