use crate::analyzers::{format_table, list_locations, TemperatureQuery};
use crate::cli::args::{Cli, Commands};
use crate::cli::logging::init_logging;
use crate::config::IngestConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::Ingestor;
use crate::writers::TemperatureStore;
use std::path::{Path, PathBuf};

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())
        .map_err(|e| ProcessingError::Config(format!("{:#}", e)))?;

    let config = IngestConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest {
            input,
            db,
            format,
            quiet,
        } => {
            let db_path = resolve_db(db, &config);
            let ingestor = Ingestor::new(&config)
                .with_format(format.source_format())
                .with_progress(config.show_progress && !quiet);

            let summary = ingestor.ingest(&input, &db_path)?;

            println!("{}", summary.report(&db_path));
        }

        Commands::Show {
            db,
            location,
            limit,
            json,
        } => {
            let store = open_existing(&resolve_db(db, &config))?;
            let rows = TemperatureQuery::new()
                .with_location(location)
                .with_limit((limit > 0).then_some(limit))
                .run(&store)?;

            if json {
                let text = serde_json::to_string_pretty(&rows)
                    .map_err(|e| ProcessingError::Config(format!("cannot serialize rows: {}", e)))?;
                println!("{}", text);
            } else if rows.is_empty() {
                println!("No temperature rows to display");
            } else {
                println!("{}", format_table(&rows));
            }
        }

        Commands::Info { db } => {
            let db_path = resolve_db(db, &config);
            let store = open_existing(&db_path)?;
            let counts = store.counts()?;

            println!("Database: {}", db_path.display());
            println!(
                "{} locations, {} temperature rows",
                counts.locations, counts.temperatures
            );
            for location in list_locations(&store)? {
                println!("  {:>4}  {}", location.id, location.name);
            }
        }
    }

    Ok(())
}

fn resolve_db(db: Option<PathBuf>, config: &IngestConfig) -> PathBuf {
    db.unwrap_or_else(|| config.db_path.clone())
}

/// Viewer commands never create a database.
fn open_existing(path: &Path) -> Result<TemperatureStore> {
    if !path.exists() {
        return Err(ProcessingError::InputNotFound(path.to_path_buf()));
    }
    TemperatureStore::open_read_only(path)
}
