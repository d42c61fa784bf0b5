use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Could not parse value {value:?} of element '{element}' as a number")]
    ValueParse { element: String, value: String },

    #[error(
        "No temperature entries were found in {}. Check that the file matches the F-A0010-001 format and that temperature elements are named with a T/TEMP prefix",
        .input.display()
    )]
    NoTemperatureData { input: PathBuf },

    #[error("Store write error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl ProcessingError {
    /// Process exit status for a run that terminated with this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProcessingError::MalformedInput(_) => 2,
            ProcessingError::NoTemperatureData { .. } => 3,
            ProcessingError::Store(_) => 4,
            _ => 1,
        }
    }
}
