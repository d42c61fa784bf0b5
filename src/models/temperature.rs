use serde::{Deserialize, Serialize};
use validator::Validate;

/// Canonical temperature record, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TemperatureReading {
    #[validate(length(min = 1))]
    pub location: String,

    pub data_time: Option<String>,

    pub temperature: f64,

    pub unit: String,

    #[validate(length(min = 1))]
    pub source_element: String,
}

impl TemperatureReading {
    pub fn new(
        location: String,
        data_time: Option<String>,
        temperature: f64,
        unit: String,
        source_element: String,
    ) -> Self {
        Self {
            location,
            data_time,
            temperature,
            unit,
            source_element,
        }
    }
}

/// How a reading landed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
