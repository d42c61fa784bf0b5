use crate::error::{ProcessingError, Result};
use crate::models::{RawObservation, RawValue, TimeFields};
use crate::readers::source::{SourceDocument, SourceFormat};
use crate::utils::constants::PLAIN_VALUE_KEYS;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// F-A0010-001 payload in its JSON encoding.
pub struct JsonDocument {
    root: Value,
}

impl JsonDocument {
    pub fn parse(text: &str) -> Result<Self> {
        let root = serde_json::from_str(text)
            .map_err(|e| ProcessingError::MalformedInput(format!("invalid JSON: {}", e)))?;
        Ok(Self { root })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// `records.location` when present, else the first array (breadth-first)
    /// whose first entry is an object carrying `locationName`.
    fn find_locations(&self) -> Option<&Vec<Value>> {
        if let Some(locations) = self.root.pointer("/records/location").and_then(Value::as_array) {
            return Some(locations);
        }

        let mut queue = VecDeque::from([&self.root]);
        while let Some(current) = queue.pop_front() {
            match current {
                Value::Array(items) => {
                    let is_location_list = items
                        .first()
                        .and_then(Value::as_object)
                        .is_some_and(|first| first.contains_key("locationName"));
                    if is_location_list {
                        return Some(items);
                    }
                    queue.extend(items.iter());
                }
                Value::Object(map) => queue.extend(map.values()),
                _ => {}
            }
        }
        None
    }

    fn extract_location(&self, location: &Map<String, Value>, out: &mut Vec<RawObservation>) {
        let Some(name) = ["locationName", "name"]
            .iter()
            .find_map(|key| location.get(*key).and_then(Value::as_str))
            .filter(|name| !name.is_empty())
        else {
            warn!("Skipping location without a name");
            return;
        };

        match weather_elements(location) {
            Some(Value::Array(elements)) => {
                for element in elements.iter().filter_map(Value::as_object) {
                    extract_element(name, element, out);
                }
            }
            Some(Value::Object(elements)) => extract_element_map(name, elements, out),
            _ => debug!(location = name, "Location has no weather elements"),
        }
    }
}

impl SourceDocument for JsonDocument {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn extract_observations(&self) -> Result<Vec<RawObservation>> {
        let locations = self.find_locations().ok_or_else(|| {
            ProcessingError::MalformedInput("no records/location array found in JSON".to_string())
        })?;

        let locations: Vec<&Map<String, Value>> =
            locations.iter().filter_map(Value::as_object).collect();

        if !locations.is_empty() && locations.iter().all(|l| weather_elements(l).is_none()) {
            return Err(ProcessingError::MalformedInput(
                "no location carries a weatherElement list".to_string(),
            ));
        }

        let mut observations = Vec::new();
        for location in locations {
            self.extract_location(location, &mut observations);
        }
        Ok(observations)
    }
}

/// `weatherElement`, falling back to `weatherElements` when the first is absent or empty.
fn weather_elements(location: &Map<String, Value>) -> Option<&Value> {
    ["weatherElement", "weatherElements"]
        .iter()
        .filter_map(|key| location.get(*key))
        .find(|value| match value {
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => false,
        })
}

fn extract_element(location: &str, element: &Map<String, Value>, out: &mut Vec<RawObservation>) {
    let element_name = element
        .get("elementName")
        .map(scalar_to_string)
        .unwrap_or_default();

    let entries: Vec<&Value> = match element.get("time") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    };

    if entries.is_empty() {
        let (value, unit) = extract_value(element);
        let time = time_fields(element);
        out.push(RawObservation::new(location, element_name, value, time).with_unit(unit));
        return;
    }

    for entry in entries {
        let (value, unit, time) = match entry {
            Value::Object(fields) => {
                let (mut value, mut unit) = extract_value(fields);
                if value.is_missing() {
                    (value, unit) = extract_value(element);
                }
                (value, unit, time_fields(fields))
            }
            Value::String(timestamp) => {
                let (value, unit) = extract_value(element);
                (value, unit, TimeFields::data_time(timestamp.clone()))
            }
            _ => continue,
        };
        out.push(
            RawObservation::new(location, element_name.clone(), value, time).with_unit(unit),
        );
    }
}

/// Agricultural forecast shape: `weatherElements: { MaxT: { units, daily: [...] } }`.
fn extract_element_map(location: &str, elements: &Map<String, Value>, out: &mut Vec<RawObservation>) {
    for (element_name, body) in elements {
        let Some(body) = body.as_object() else {
            continue;
        };
        let Some(daily) = body.get("daily").and_then(Value::as_array) else {
            continue;
        };
        let unit = body.get("units").and_then(Value::as_str).map(str::to_string);

        for entry in daily.iter().filter_map(Value::as_object) {
            let timestamp = ["dataDate", "dataTime"]
                .iter()
                .find_map(|key| entry.get(*key).and_then(Value::as_str))
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            let time = TimeFields {
                data_time: timestamp,
                ..TimeFields::default()
            };
            let temperature = entry.get("temperature");
            let value = temperature.map(raw_value).unwrap_or(RawValue::Missing);

            out.push(
                RawObservation::new(location, element_name.as_str(), value, time)
                    .with_unit(unit.clone())
                    .with_explicit_temperature(temperature.is_some()),
            );
        }
    }
}

fn time_fields(fields: &Map<String, Value>) -> TimeFields {
    TimeFields::from_lookup(|key| fields.get(key).and_then(Value::as_str).map(str::to_string))
}

/// Value and unit of a time entry or element.
fn extract_value(node: &Map<String, Value>) -> (RawValue, Option<String>) {
    if let Some(element_value) = node.get("elementValue") {
        let first = match element_value {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        return match first {
            Some(Value::Object(fields)) => (
                fields.get("value").map(raw_value).unwrap_or(RawValue::Missing),
                string_field(fields, "measures"),
            ),
            Some(scalar) => (raw_value(scalar), None),
            None => (RawValue::Missing, None),
        };
    }

    if let Some(parameter) = node.get("parameter") {
        let first = match parameter {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        if let Some(Value::Object(fields)) = first {
            let value = ["parameterName", "parameterValue"]
                .iter()
                .filter_map(|key| fields.get(*key))
                .map(raw_value)
                .find(|value| !value.is_missing())
                .unwrap_or(RawValue::Missing);
            return (value, string_field(fields, "parameterUnit"));
        }
        return (RawValue::Missing, None);
    }

    let value = PLAIN_VALUE_KEYS
        .iter()
        .find_map(|key| node.get(*key))
        .map(raw_value)
        .unwrap_or(RawValue::Missing);
    (value, None)
}

fn raw_value(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Missing,
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Missing),
        Value::String(s) if s.is_empty() => RawValue::Missing,
        Value::String(s) => RawValue::Text(s.clone()),
        other => RawValue::Text(other.to_string()),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
