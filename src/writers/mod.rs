pub mod location_resolver;
pub mod sqlite_store;
pub mod upsert_writer;

pub use location_resolver::LocationCache;
pub use sqlite_store::{StoreCounts, TemperatureStore, SCHEMA};
pub use upsert_writer::{upsert, WriteCounts};
