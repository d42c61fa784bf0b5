use crate::utils::constants::TIME_FIELD_PRIORITY;
use serde::{Deserialize, Serialize};

/// Element value as it appeared in the source, before numeric conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Convert to a finite floating-point number, if possible.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => write!(f, "{}", s),
            RawValue::Missing => write!(f, "<missing>"),
        }
    }
}

/// Candidate timestamps carried by one time entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeFields {
    pub data_time: Option<String>,
    pub obs_time: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TimeFields {
    /// Build from a lookup keyed by the source field names
    /// (`dataTime`, `obsTime`, `startTime`, `endTime`).
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&'static str) -> Option<String>,
    {
        let [data, obs, start, end] = TIME_FIELD_PRIORITY;
        Self {
            data_time: lookup(data),
            obs_time: lookup(obs),
            start_time: lookup(start),
            end_time: lookup(end),
        }
    }

    pub fn data_time(value: impl Into<String>) -> Self {
        Self {
            data_time: Some(value.into()),
            ..Self::default()
        }
    }

    /// First non-empty field in priority order dataTime > obsTime > startTime > endTime.
    pub fn resolve(&self) -> Option<&str> {
        [
            &self.data_time,
            &self.obs_time,
            &self.start_time,
            &self.end_time,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .find(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.resolve().is_none()
    }
}

/// One (location, element, time entry) triple read from a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub location: String,
    pub element: String,
    pub value: RawValue,
    pub unit: Option<String>,
    pub time: TimeFields,
    /// Value came from a field explicitly named `temperature`.
    pub explicit_temperature: bool,
}

impl RawObservation {
    pub fn new(
        location: impl Into<String>,
        element: impl Into<String>,
        value: RawValue,
        time: TimeFields,
    ) -> Self {
        Self {
            location: location.into(),
            element: element.into(),
            value,
            unit: None,
            time,
            explicit_temperature: false,
        }
    }

    pub fn with_unit(mut self, unit: Option<String>) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_explicit_temperature(mut self, explicit: bool) -> Self {
        self.explicit_temperature = explicit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_priority() {
        let time = TimeFields {
            data_time: None,
            obs_time: Some("2024-01-01 08:00:00".to_string()),
            start_time: Some("2024-01-01 06:00:00".to_string()),
            end_time: Some("2024-01-01 18:00:00".to_string()),
        };
        assert_eq!(time.resolve(), Some("2024-01-01 08:00:00"));

        let time = TimeFields {
            data_time: Some("2024-01-01T00:00:00".to_string()),
            ..time
        };
        assert_eq!(time.resolve(), Some("2024-01-01T00:00:00"));
    }

    #[test]
    fn test_empty_time_fields_are_skipped() {
        let time = TimeFields {
            data_time: Some(String::new()),
            end_time: Some("2024-01-02".to_string()),
            ..TimeFields::default()
        };
        assert_eq!(time.resolve(), Some("2024-01-02"));
        assert!(TimeFields::default().is_empty());
    }

    #[test]
    fn test_raw_value_conversion() {
        assert_eq!(RawValue::Number(22.5).as_f64(), Some(22.5));
        assert_eq!(RawValue::Text(" 18.0 ".to_string()).as_f64(), Some(18.0));
        assert_eq!(RawValue::Text("-3".to_string()).as_f64(), Some(-3.0));
        assert_eq!(RawValue::Text("n/a".to_string()).as_f64(), None);
        assert_eq!(RawValue::Text("NaN".to_string()).as_f64(), None);
        assert_eq!(RawValue::Number(f64::INFINITY).as_f64(), None);
        assert_eq!(RawValue::Missing.as_f64(), None);
    }
}
