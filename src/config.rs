use crate::error::Result;
use crate::utils::constants::{DEFAULT_DB_PATH, DEFAULT_UNIT, ENV_PREFIX, TEMPERATURE_PREFIXES};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Settings for an ingestion run.
///
/// Layered lowest precedence first: built-in defaults, an optional config file,
/// then `FA0010_*` environment variables. CLI flags are applied by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestConfig {
    pub db_path: PathBuf,

    #[validate(length(min = 1))]
    pub default_unit: String,

    #[validate(length(min = 1))]
    pub temperature_prefixes: Vec<String>,

    pub show_progress: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_unit: DEFAULT_UNIT.to_string(),
            temperature_prefixes: TEMPERATURE_PREFIXES.iter().map(|p| p.to_string()).collect(),
            show_progress: true,
        }
    }
}

impl IngestConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("default_unit", DEFAULT_UNIT)?
            .set_default("temperature_prefixes", TEMPERATURE_PREFIXES.to_vec())?
            .set_default("show_progress", true)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("temperature_prefixes"),
            )
            .build()?;

        let config: IngestConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
