use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input is neither delimited text nor a readable spreadsheet: {0}")]
    UnreadableInput(String),

    #[error("Workbook contains no sheets")]
    EmptyWorkbook,
}

pub type Result<T> = std::result::Result<T, EnrichError>;
