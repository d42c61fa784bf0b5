use serde::{Deserialize, Serialize};

/// Observation site as persisted in the `locations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
}
