pub mod temperature_query;

pub use temperature_query::{format_table, list_locations, StoredTemperature, TemperatureQuery};
