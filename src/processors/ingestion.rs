use crate::config::IngestConfig;
use crate::error::{ProcessingError, Result};
use crate::models::RawObservation;
use crate::processors::temperature_filter::{FilterStats, FilteredReadings, TemperatureFilter};
use crate::readers::{load_document, SourceDocument, SourceFormat};
use crate::utils::progress::ProgressReporter;
use crate::writers::{upsert, LocationCache, TemperatureStore, WriteCounts};
use std::path::Path;
use tracing::{debug, info, warn};
use validator::Validate;

/// Position of a run in `Start -> Parsing -> Filtering -> Writing -> Done`.
/// A run that stops early ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Start,
    Parsing,
    Filtering,
    Writing,
    Done,
    Failed,
}

impl IngestStage {
    fn advance(&mut self, next: IngestStage) {
        let from = *self;
        debug!(from = %from, to = %next, "Ingestion stage");
        *self = next;
    }
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IngestStage::Start => "start",
            IngestStage::Parsing => "parsing",
            IngestStage::Filtering => "filtering",
            IngestStage::Writing => "writing",
            IngestStage::Done => "done",
            IngestStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Non-temperature elements plus temperature values that failed to parse.
    pub dropped: usize,
    pub locations_seen: usize,
    pub locations_created: usize,
    pub observations: usize,
    pub invalid_values: usize,
}

impl IngestSummary {
    fn from_parts(stats: FilterStats, counts: WriteCounts, locations: &LocationCache) -> Self {
        Self {
            inserted: counts.inserted,
            updated: counts.updated,
            dropped: stats.dropped(),
            locations_seen: locations.len(),
            locations_created: locations.created(),
            observations: stats.scanned,
            invalid_values: stats.invalid_values,
        }
    }

    /// The one-line report printed after a successful run into `db`.
    pub fn report(&self, db: &Path) -> String {
        format!(
            "Inserted {}, updated {} temperature rows into {} (dropped {} observations across {} locations)",
            self.inserted,
            self.updated,
            db.display(),
            self.dropped,
            self.locations_seen
        )
    }
}

/// One pass over one input file: parse, filter, resolve locations, upsert.
pub struct Ingestor {
    filter: TemperatureFilter,
    format: Option<SourceFormat>,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            filter: TemperatureFilter::from_config(config),
            format: None,
            show_progress: false,
        }
    }

    pub fn with_format(mut self, format: Option<SourceFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Ingest `input` into the database at `db`.
    ///
    /// The database is only opened once filtering produced at least one reading,
    /// and all writes share one transaction: a failed run leaves it untouched.
    pub fn ingest(&self, input: &Path, db: &Path) -> Result<IngestSummary> {
        let mut stage = IngestStage::Start;
        let result = self.run(input, db, &mut stage);

        match &result {
            Ok(summary) => info!(
                input = %input.display(),
                inserted = summary.inserted,
                updated = summary.updated,
                dropped = summary.dropped,
                locations = summary.locations_seen,
                "Ingestion complete"
            ),
            Err(e) => {
                warn!(input = %input.display(), stage = %stage, "Ingestion failed: {}", e);
                stage.advance(IngestStage::Failed);
            }
        }
        result
    }

    /// Ingest an already parsed document into an open store.
    pub fn ingest_document(
        &self,
        document: &dyn SourceDocument,
        store: &mut TemperatureStore,
        input: &Path,
    ) -> Result<IngestSummary> {
        let observations = extract(document)?;
        let filtered = self.filter_observations(&observations, input)?;
        self.write(store, filtered)
    }

    fn run(&self, input: &Path, db: &Path, stage: &mut IngestStage) -> Result<IngestSummary> {
        stage.advance(IngestStage::Parsing);
        let document = load_document(input, self.format)?;
        let observations = extract(document.as_ref())?;

        stage.advance(IngestStage::Filtering);
        let filtered = self.filter_observations(&observations, input)?;

        stage.advance(IngestStage::Writing);
        let mut store = TemperatureStore::open(db)?;
        let summary = self.write(&mut store, filtered)?;

        stage.advance(IngestStage::Done);
        Ok(summary)
    }

    fn filter_observations(&self, observations: &[RawObservation], input: &Path) -> Result<FilteredReadings> {
        let filtered = self.filter.apply(observations);
        if filtered.readings.is_empty() {
            return Err(ProcessingError::NoTemperatureData {
                input: input.to_path_buf(),
            });
        }
        Ok(filtered)
    }

    fn write(&self, store: &mut TemperatureStore, filtered: FilteredReadings) -> Result<IngestSummary> {
        let progress = ProgressReporter::new(
            filtered.readings.len() as u64,
            "Writing temperature rows",
            !self.show_progress,
        );

        let tx = store.transaction()?;
        TemperatureStore::ensure_schema(&tx)?;

        let mut locations = LocationCache::new();
        let mut counts = WriteCounts::default();
        for reading in &filtered.readings {
            reading.validate()?;
            let location_id = locations.resolve(&tx, &reading.location)?;
            counts.record(upsert(&tx, location_id, reading)?);
            progress.increment(1);
        }

        tx.commit()?;
        progress.finish_and_clear();

        Ok(IngestSummary::from_parts(filtered.stats, counts, &locations))
    }
}

fn extract(document: &dyn SourceDocument) -> Result<Vec<RawObservation>> {
    let observations = document.extract_observations()?;
    debug!(
        format = %document.format(),
        observations = observations.len(),
        "Extracted observations"
    );
    Ok(observations)
}

/// Ingest with default settings and no progress output.
pub fn ingest(input_path: &Path, db_path: &Path) -> Result<IngestSummary> {
    Ingestor::new(&IngestConfig::default()).ingest(input_path, db_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::parse_payload;

    fn document(json: &str) -> Box<dyn SourceDocument> {
        parse_payload(json.to_string(), Some(SourceFormat::Json)).unwrap()
    }

    #[test]
    fn test_ingest_document_counts() -> Result<()> {
        let mut store = TemperatureStore::open_in_memory()?;
        let doc = document(
            r#"{"records":{"location":[
                {"locationName":"臺北","weatherElement":[
                    {"elementName":"T","time":[{"dataTime":"d1","elementValue":[{"value":"22.5"}]}]},
                    {"elementName":"RH","time":[{"dataTime":"d1","elementValue":[{"value":"80"}]}]}
                ]},
                {"locationName":"臺中","weatherElement":[
                    {"elementName":"TEMP","time":[{"dataTime":"d1","elementValue":[{"value":"x"}]},
                                                  {"dataTime":"d2","elementValue":[{"value":"19"}]}]}
                ]}
            ]}}"#,
        );

        let ingestor = Ingestor::new(&IngestConfig::default());
        let summary = ingestor.ingest_document(doc.as_ref(), &mut store, Path::new("feed.json"))?;

        assert_eq!(
            summary,
            IngestSummary {
                inserted: 2,
                updated: 0,
                dropped: 2,
                locations_seen: 2,
                locations_created: 2,
                observations: 4,
                invalid_values: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn test_no_temperature_data_writes_nothing() -> Result<()> {
        let mut store = TemperatureStore::open_in_memory()?;
        let doc = document(
            r#"{"records":{"location":[{"locationName":"A","weatherElement":[
                {"elementName":"WDIR","time":[{"dataTime":"d","elementValue":[{"value":"180"}]}]}
            ]}]}}"#,
        );

        let result = Ingestor::new(&IngestConfig::default()).ingest_document(
            doc.as_ref(),
            &mut store,
            Path::new("feed.json"),
        );

        assert!(matches!(result, Err(ProcessingError::NoTemperatureData { .. })));
        assert!(!store.has_schema()?);
        Ok(())
    }

    #[test]
    fn test_failed_upsert_rolls_back_whole_pass() -> Result<()> {
        let mut store = TemperatureStore::open_in_memory()?;
        store.connection().execute_batch(
            "CREATE TABLE locations (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL UNIQUE
             );
             CREATE TABLE temperatures (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 location_id INTEGER NOT NULL REFERENCES locations(id),
                 data_time TEXT,
                 temperature REAL NOT NULL CHECK (temperature < 30),
                 unit TEXT,
                 source_element TEXT,
                 UNIQUE(location_id, data_time, source_element)
             );",
        )?;
        let doc = document(
            r#"{"records":{"location":[
                {"locationName":"臺北","weatherElement":[
                    {"elementName":"T","time":[{"dataTime":"d1","elementValue":[{"value":"22.5"}]}]}
                ]},
                {"locationName":"臺中","weatherElement":[
                    {"elementName":"T","time":[{"dataTime":"d1","elementValue":[{"value":"35.0"}]}]}
                ]}
            ]}}"#,
        );

        let result = Ingestor::new(&IngestConfig::default()).ingest_document(
            doc.as_ref(),
            &mut store,
            Path::new("feed.json"),
        );

        assert!(matches!(result, Err(ProcessingError::Store(_))));
        let counts = store.counts()?;
        assert_eq!(counts.locations, 0);
        assert_eq!(counts.temperatures, 0);
        Ok(())
    }

    #[test]
    fn test_summary_report() {
        let summary = IngestSummary {
            inserted: 1,
            updated: 0,
            dropped: 1,
            locations_seen: 1,
            ..IngestSummary::default()
        };
        assert_eq!(
            summary.report(Path::new("data.db")),
            "Inserted 1, updated 0 temperature rows into data.db (dropped 1 observations across 1 locations)"
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(IngestStage::Filtering.to_string(), "filtering");
        assert_eq!(IngestStage::Failed.to_string(), "failed");
    }
}
