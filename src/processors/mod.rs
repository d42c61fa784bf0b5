pub mod ingestion;
pub mod temperature_filter;

pub use ingestion::{ingest, IngestStage, IngestSummary, Ingestor};
pub use temperature_filter::{FilterOutcome, FilterStats, FilteredReadings, TemperatureFilter};
