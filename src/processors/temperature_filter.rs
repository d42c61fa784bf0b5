use crate::config::IngestConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{RawObservation, TemperatureReading};
use tracing::debug;

/// Why an observation did or did not become a temperature reading.
#[derive(Debug)]
pub enum FilterOutcome {
    Accepted(TemperatureReading),
    NotTemperature,
    /// Temperature element whose value is not a finite number.
    InvalidValue(ProcessingError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub scanned: usize,
    pub accepted: usize,
    pub non_temperature: usize,
    pub invalid_values: usize,
}

impl FilterStats {
    pub fn dropped(&self) -> usize {
        self.non_temperature + self.invalid_values
    }
}

/// Readings that passed the filter, in source order, plus the tally.
#[derive(Debug, Default)]
pub struct FilteredReadings {
    pub readings: Vec<TemperatureReading>,
    pub stats: FilterStats,
}

/// Selects temperature-like elements by case-insensitive name prefix.
pub struct TemperatureFilter {
    prefixes: Vec<String>,
    default_unit: String,
}

impl TemperatureFilter {
    pub fn new(prefixes: &[String], default_unit: impl Into<String>) -> Self {
        Self {
            prefixes: prefixes.iter().map(|p| p.to_uppercase()).collect(),
            default_unit: default_unit.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(&config.temperature_prefixes, config.default_unit.clone())
    }

    pub fn is_temperature_element(&self, element: &str) -> bool {
        let element = element.to_uppercase();
        self.prefixes.iter().any(|prefix| element.starts_with(prefix.as_str()))
    }

    pub fn classify(&self, observation: &RawObservation) -> FilterOutcome {
        if !observation.explicit_temperature && !self.is_temperature_element(&observation.element) {
            return FilterOutcome::NotTemperature;
        }

        match self.parse_value(observation) {
            Ok(temperature) => FilterOutcome::Accepted(self.normalize_with(observation, temperature)),
            Err(e) => FilterOutcome::InvalidValue(e),
        }
    }

    /// Canonical reading for a temperature observation, `None` for anything else.
    pub fn normalize(&self, observation: &RawObservation) -> Option<TemperatureReading> {
        match self.classify(observation) {
            FilterOutcome::Accepted(reading) => Some(reading),
            _ => None,
        }
    }

    pub fn apply(&self, observations: &[RawObservation]) -> FilteredReadings {
        let mut result = FilteredReadings::default();

        for observation in observations {
            result.stats.scanned += 1;
            match self.classify(observation) {
                FilterOutcome::Accepted(reading) => {
                    result.stats.accepted += 1;
                    result.readings.push(reading);
                }
                FilterOutcome::NotTemperature => {
                    result.stats.non_temperature += 1;
                }
                FilterOutcome::InvalidValue(e) => {
                    debug!(location = %observation.location, "Dropping observation: {}", e);
                    result.stats.invalid_values += 1;
                }
            }
        }

        result
    }

    fn parse_value(&self, observation: &RawObservation) -> Result<f64> {
        observation
            .value
            .as_f64()
            .ok_or_else(|| ProcessingError::ValueParse {
                element: observation.element.clone(),
                value: observation.value.to_string(),
            })
    }

    fn normalize_with(&self, observation: &RawObservation, temperature: f64) -> TemperatureReading {
        let unit = observation
            .unit
            .as_deref()
            .filter(|unit| !unit.is_empty())
            .unwrap_or(self.default_unit.as_str());

        TemperatureReading::new(
            observation.location.clone(),
            observation.time.resolve().map(str::to_string),
            temperature,
            unit.to_string(),
            observation.element.clone(),
        )
    }
}

impl Default for TemperatureFilter {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}
