pub mod location;
pub mod observation;
pub mod temperature;

pub use location::Location;
pub use observation::{RawObservation, RawValue, TimeFields};
pub use temperature::{TemperatureReading, UpsertOutcome};
