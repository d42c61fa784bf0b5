/// Default SQLite database file
pub const DEFAULT_DB_PATH: &str = "data.db";

/// Unit recorded when the source carries none
pub const DEFAULT_UNIT: &str = "C";

/// Element-name prefixes that mark a temperature reading
pub const TEMPERATURE_PREFIXES: [&str; 2] = ["T", "TEMP"];

/// Candidate time fields, highest priority first
pub const TIME_FIELD_PRIORITY: [&str; 4] = ["dataTime", "obsTime", "startTime", "endTime"];

/// Fields that may carry a value when no elementValue/parameter is present
pub const PLAIN_VALUE_KEYS: [&str; 3] = ["value", "temperature", "temp"];

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "FA0010";

/// Viewer defaults
pub const DEFAULT_SHOW_LIMIT: usize = 100;

/// Milliseconds a write waits on a locked database before failing
pub const BUSY_TIMEOUT_MS: u64 = 5000;
