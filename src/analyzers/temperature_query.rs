use crate::error::Result;
use crate::models::Location;
use crate::writers::TemperatureStore;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Serialize;

/// One joined row as the viewer displays it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTemperature {
    pub location: String,
    pub data_time: Option<String>,
    pub temperature: f64,
    pub unit: Option<String>,
    pub source_element: Option<String>,
}

/// Newest-first listing of stored temperatures, optionally for one location.
#[derive(Debug, Clone, Default)]
pub struct TemperatureQuery {
    pub location: Option<String>,
    pub limit: Option<usize>,
}

impl TemperatureQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn run(&self, store: &TemperatureStore) -> Result<Vec<StoredTemperature>> {
        if !store.has_schema()? {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT l.name, t.data_time, t.temperature, t.unit, t.source_element
             FROM temperatures t
             JOIN locations l ON t.location_id = l.id",
        );
        let mut args: Vec<Value> = Vec::new();

        if let Some(ref location) = self.location {
            sql.push_str(" WHERE l.name = ?");
            args.push(Value::Text(location.clone()));
        }
        sql.push_str(" ORDER BY t.data_time DESC NULLS LAST, l.name, t.source_element");
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let mut stmt = store.connection().prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(StoredTemperature {
                    location: row.get(0)?,
                    data_time: row.get(1)?,
                    temperature: row.get(2)?,
                    unit: row.get(3)?,
                    source_element: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

pub fn list_locations(store: &TemperatureStore) -> Result<Vec<Location>> {
    if !store.has_schema()? {
        return Ok(Vec::new());
    }

    let mut stmt = store
        .connection()
        .prepare("SELECT id, name FROM locations ORDER BY name")?;
    let locations = stmt
        .query_map([], |row| {
            Ok(Location {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(locations)
}

/// Render rows as a fixed-width text table.
pub fn format_table(rows: &[StoredTemperature]) -> String {
    let headers = ["location", "data_time", "temperature", "unit", "source_element"];
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.location.clone(),
                row.data_time.clone().unwrap_or_default(),
                format!("{:.1}", row.temperature),
                row.unit.clone().unwrap_or_default(),
                row.source_element.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |fields: &[String]| -> String {
        fields
            .iter()
            .zip(widths)
            .map(|(field, width)| {
                let pad = width - field.chars().count();
                format!("{}{}", field, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render(&headers.map(str::to_string))];
    lines.extend(cells.iter().map(|row| render(row)));
    lines.join("\n")
}
