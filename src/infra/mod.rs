pub mod enrich_output_adapter;
pub mod file_input_adapter;

pub use enrich_output_adapter::CsvEnrichOutputAdapter;
pub use file_input_adapter::FileEnrichInputAdapter;
