use crate::app::ports::EnrichOutputPort;
use crate::pipeline::processing::enrich::EnrichedCalendar;
use crate::types::Table;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-based implementation of EnrichOutputPort
/// Writes the enriched calendar as a CSV file with a header row
pub struct CsvEnrichOutputAdapter {
    file_path: PathBuf,
}

impl CsvEnrichOutputAdapter {
    pub fn new(file_path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        if let Some(dir) = file_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self { file_path })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl EnrichOutputPort for CsvEnrichOutputAdapter {
    fn write_enriched_calendar(&self, calendar: &EnrichedCalendar) -> anyhow::Result<()> {
        let table = calendar.to_table();
        let file = std::fs::File::create(&self.file_path)?;
        write_table_csv(&table, file)?;

        info!(
            "Wrote {} enriched rows to {}",
            table.len(),
            self.file_path.display()
        );
        Ok(())
    }
}

/// Serialize a table as CSV; null cells become empty fields
pub fn write_table_csv<W: Write>(table: &Table, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::reader::read_delimited;
    use crate::types::cell_from_str;

    #[test]
    fn test_write_table_csv_quotes_and_nulls() {
        let table = Table::from_rows(
            vec!["Domains".to_string(), "Region".to_string()],
            vec![vec![
                cell_from_str("a.com, b.org"),
                None,
            ]],
        );

        let mut buffer = Vec::new();
        write_table_csv(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "Domains,Region\n\"a.com, b.org\",\n");

        let reread = read_delimited(text.as_bytes()).unwrap();
        assert_eq!(reread, table);
    }
}
