use crate::error::Result;
use crate::models::{TemperatureReading, UpsertOutcome};
use rusqlite::{params, Connection, OptionalExtension};

/// Write one reading under the (location_id, data_time, source_element) identity.
///
/// The identity is matched with `IS`, so readings without a timestamp update in
/// place too; the table's UNIQUE constraint alone treats NULLs as distinct.
/// On a match `temperature` and `unit` are overwritten (last write wins).
pub fn upsert(conn: &Connection, location_id: i64, reading: &TemperatureReading) -> Result<UpsertOutcome> {
    let existing: Option<i64> = conn
        .prepare_cached(
            "SELECT id FROM temperatures
             WHERE location_id = ?1 AND data_time IS ?2 AND source_element IS ?3",
        )?
        .query_row(
            params![location_id, reading.data_time, reading.source_element],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.prepare_cached("UPDATE temperatures SET temperature = ?1, unit = ?2 WHERE id = ?3")?
                .execute(params![reading.temperature, reading.unit, id])?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            conn.prepare_cached(
                "INSERT INTO temperatures(location_id, data_time, temperature, unit, source_element)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                location_id,
                reading.data_time,
                reading.temperature,
                reading.unit,
                reading.source_element,
            ])?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

/// Inserted/updated tally for one write pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub inserted: usize,
    pub updated: usize,
}

impl WriteCounts {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}
