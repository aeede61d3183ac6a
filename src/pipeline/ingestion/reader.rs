//! Readers that turn uploaded bytes into [`Table`]s.
//!
//! Calendar exports arrive either as comma-separated text or as a spreadsheet; the
//! format is detected by trying delimited parsing first and falling back to the
//! spreadsheet reader. Lookup workbooks are always spreadsheets and every sheet is read.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::constants::OUTPUT_DATE_FORMAT;
use crate::error::{EnrichError, Result};
use crate::types::{cell_from_str, Cell, Sheet, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How many leading bytes are inspected for NUL when deciding whether input is text
const BINARY_SNIFF_LEN: usize = 1024;

/// Read a calendar export, trying delimited text first and a spreadsheet second
pub fn read_calendar(bytes: &[u8]) -> Result<Table> {
    match read_delimited(bytes) {
        Ok(table) => Ok(table),
        Err(delimited_err) => {
            debug!(error = %delimited_err, "Calendar is not delimited text, trying spreadsheet");
            read_first_sheet(bytes).map_err(|spreadsheet_err| {
                EnrichError::UnreadableInput(format!(
                    "delimited: {}; spreadsheet: {}",
                    delimited_err, spreadsheet_err
                ))
            })
        }
    }
}

pub fn read_calendar_file(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "Reading calendar export");
    read_calendar(&bytes)
}

/// Read every sheet of a lookup workbook, in workbook order
pub fn read_lookup(bytes: &[u8]) -> Result<Vec<Sheet>> {
    read_workbook(bytes)
}

pub fn read_lookup_file(path: impl AsRef<Path>) -> Result<Vec<Sheet>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    info!(path = %path.display(), bytes = bytes.len(), "Reading lookup workbook");
    read_lookup(&bytes)
}

/// Parse comma-separated text with a header row.
///
/// Fails on empty or binary input and on rows wider than the header, so that
/// spreadsheet bytes are never mistaken for a one-column CSV.
pub fn read_delimited(bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(EnrichError::UnreadableInput("input is empty".to_string()));
    }
    if bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0) {
        return Err(EnrichError::UnreadableInput(
            "input contains binary data".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();
    let mut table = Table::new(dedupe_headers(headers));

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            return Err(EnrichError::UnreadableInput(format!(
                "row {} has {} fields, header has {}",
                line + 2,
                record.len(),
                width
            )));
        }
        table.push_row(record.iter().map(cell_from_str).collect());
    }

    crate::observability::metrics::ingest::delimited_table_read(table.len());
    debug!(rows = table.len(), columns = width, "Read delimited table");
    Ok(table)
}

/// Read all sheets of an xlsx/xls/ods workbook held in memory
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let names = workbook.sheet_names().to_vec();
    if names.is_empty() {
        return Err(EnrichError::EmptyWorkbook);
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let table = range_to_table(&range);
        debug!(sheet = %name, rows = table.len(), "Read worksheet");
        crate::observability::metrics::ingest::spreadsheet_table_read(table.len());
        sheets.push(Sheet::new(name, table));
    }
    Ok(sheets)
}

fn read_first_sheet(bytes: &[u8]) -> Result<Table> {
    read_workbook(bytes)?
        .into_iter()
        .next()
        .map(|sheet| sheet.table)
        .ok_or(EnrichError::EmptyWorkbook)
}

/// First row of the range is the header; remaining rows become data
pub fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Table::default();
    };

    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| data_to_cell(cell).unwrap_or_else(|| format!("Unnamed: {}", idx)))
        .collect();

    let mut table = Table::new(dedupe_headers(headers));
    for row in rows {
        table.push_row(row.iter().map(data_to_cell).collect());
    }
    table
}

/// Convert a spreadsheet value into a nullable string cell
pub fn data_to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => cell_from_str(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|d| d.format(OUTPUT_DATE_FORMAT).to_string()),
        other => cell_from_str(&other.to_string()),
    }
}

/// Convert an Excel serial date (1900 date system) into a timestamp
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = Duration::try_days(serial.trunc() as i64)?;
    let seconds = Duration::try_seconds((serial.fract() * 86_400.0).round() as i64)?;
    epoch.checked_add_signed(days.checked_add(&seconds)?)
}

/// Rename repeated headers the way spreadsheet tools do: `Name`, `Name.1`, `Name.2`
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let count = seen.entry(header.clone()).or_insert(0);
            let name = if *count == 0 {
                header
            } else {
                format!("{}.{}", header, count)
            };
            *count += 1;
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_delimited_with_nulls() {
        let csv = "Subject,Date,Required Attendees\nHui,01/02/2024,a@example.com\nCall,,\n";
        let table = read_delimited(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Required Attendees"), Some("a@example.com"));
        assert_eq!(table.get(1, "Date"), None);
        assert_eq!(table.get(1, "Required Attendees"), None);
    }

    #[test]
    fn test_read_delimited_strips_bom_and_handles_quotes() {
        let csv = "\u{feff}Date,Required Attendees\n01/02/2024,\"a@example.com; b@example.org\"\n";
        let table = read_delimited(csv.as_bytes()).unwrap();

        assert_eq!(table.columns()[0], "Date");
        assert_eq!(
            table.get(0, "Required Attendees"),
            Some("a@example.com; b@example.org")
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = read_delimited(b"a,b,c\n1\n").unwrap();
        assert_eq!(table.rows()[0], vec![Some("1".to_string()), None, None]);
    }

    #[test]
    fn test_wide_rows_are_rejected() {
        let result = read_delimited(b"a,b\n1,2,3\n");
        assert!(matches!(result, Err(EnrichError::UnreadableInput(_))));
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let table = read_delimited(b"Name,Name,Other,Name\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns(), &["Name", "Name.1", "Other", "Name.2"].map(String::from));
    }

    #[test]
    fn test_empty_and_binary_input_is_not_delimited() {
        assert!(read_delimited(b"").is_err());
        assert!(read_delimited(b"  \n").is_err());
        assert!(read_delimited(b"PK\x03\x04\x00\x00garbage").is_err());
    }

    #[test]
    fn test_read_calendar_reports_both_failures() {
        let err = read_calendar(b"PK\x03\x04\x00\x00not really a zip").unwrap_err();
        match err {
            EnrichError::UnreadableInput(message) => {
                assert!(message.contains("delimited"));
                assert!(message.contains("spreadsheet"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_lookup_rejects_text() {
        assert!(read_lookup(b"Type of Organisation\nNGO\n").is_err());
    }

    #[test]
    fn test_range_to_table() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Type of Organisation".to_string()));
        range.set_value((0, 2), Data::String("Count".to_string()));
        range.set_value((1, 0), Data::String("NGO".to_string()));
        range.set_value((1, 1), Data::String("x".to_string()));
        range.set_value((1, 2), Data::Float(3.0));
        range.set_value((2, 2), Data::Float(2.5));

        let table = range_to_table(&range);
        assert_eq!(table.columns(), &["Type of Organisation", "Unnamed: 1", "Count"].map(String::from));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Unnamed: 1"), Some("x"));
        assert_eq!(table.get(0, "Count"), Some("3"));
        assert_eq!(table.get(1, "Type of Organisation"), None);
        assert_eq!(table.get(1, "Count"), Some("2.5"));
    }

    #[test]
    fn test_empty_range_gives_empty_table() {
        let range: Range<Data> = Range::empty();
        assert_eq!(range_to_table(&range), Table::default());
    }

    #[test]
    fn test_excel_serial_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(excel_serial_to_datetime(45323.0), Some(expected));

        let noon = excel_serial_to_datetime(45323.5).unwrap();
        assert_eq!(noon.format("%H:%M").to_string(), "12:00");
        assert_eq!(excel_serial_to_datetime(-1.0), None);
    }

    #[test]
    fn test_out_of_range_serials_are_none() {
        assert_eq!(excel_serial_to_datetime(1e15), None);
        assert_eq!(excel_serial_to_datetime(1e300), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
        // A valid day count that lands past the last representable date
        assert_eq!(excel_serial_to_datetime(1e12), None);
    }

    #[test]
    fn test_data_to_cell() {
        assert_eq!(data_to_cell(&Data::Empty), None);
        assert_eq!(data_to_cell(&Data::Int(7)), Some("7".to_string()));
        assert_eq!(data_to_cell(&Data::String("  ".to_string())), None);
        assert_eq!(data_to_cell(&Data::Bool(true)), Some("true".to_string()));
    }
}
