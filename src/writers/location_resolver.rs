use crate::error::Result;
use rusqlite::{params, Connection, ErrorCode};
use std::collections::HashMap;
use tracing::debug;

/// Name -> id mapping for the duration of one ingestion run.
///
/// Names are matched exactly as given: no trimming, no case folding.
#[derive(Debug, Default)]
pub struct LocationCache {
    ids: HashMap<String, i64>,
    created: usize,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, inserting the location on first sight.
    ///
    /// A uniqueness conflict on insert means the location already exists
    /// (typically from an earlier run), so it is looked up instead.
    pub fn resolve(&mut self, conn: &Connection, name: &str) -> Result<i64> {
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }

        let id = match conn.execute("INSERT INTO locations(name) VALUES (?1)", params![name]) {
            Ok(_) => {
                self.created += 1;
                debug!(location = name, "Created location");
                conn.last_insert_rowid()
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                conn.query_row(
                    "SELECT id FROM locations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )?
            }
            Err(e) => return Err(e.into()),
        };

        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Distinct locations resolved so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Locations inserted by this run.
    pub fn created(&self) -> usize {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::TemperatureStore;

    fn store() -> TemperatureStore {
        let store = TemperatureStore::open_in_memory().unwrap();
        TemperatureStore::ensure_schema(store.connection()).unwrap();
        store
    }

    #[test]
    fn test_resolve_creates_once() -> Result<()> {
        let store = store();
        let mut cache = LocationCache::new();

        let first = cache.resolve(store.connection(), "臺北")?;
        let again = cache.resolve(store.connection(), "臺北")?;
        let other = cache.resolve(store.connection(), "臺中")?;

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.created(), 2);
        Ok(())
    }

    #[test]
    fn test_existing_location_is_looked_up() -> Result<()> {
        let store = store();
        let existing = LocationCache::new().resolve(store.connection(), "臺北")?;

        let mut cache = LocationCache::new();
        let id = cache.resolve(store.connection(), "臺北")?;

        assert_eq!(id, existing);
        assert_eq!(cache.created(), 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(store.counts()?.locations, 1);
        Ok(())
    }

    #[test]
    fn test_names_are_not_folded() -> Result<()> {
        let store = store();
        let mut cache = LocationCache::new();

        let upper = cache.resolve(store.connection(), "Taipei")?;
        let lower = cache.resolve(store.connection(), "taipei")?;
        let padded = cache.resolve(store.connection(), " Taipei")?;

        assert_ne!(upper, lower);
        assert_ne!(upper, padded);
        assert_eq!(store.counts()?.locations, 3);
        Ok(())
    }
}
