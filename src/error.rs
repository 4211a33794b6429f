//! Error types for trial input and configuration

use crate::registry::TrialId;
use thiserror::Error;

/// Errors surfaced by the trial engine and its configuration layer
#[derive(Debug, Error)]
pub enum TrialError {
    /// The presentation layer forwarded a selection outside the trial's range.
    #[error("invalid selection {value} for {trial} (expected 0..={max})")]
    InvalidSelection { trial: TrialId, value: i64, max: u8 },

    /// A configuration value failed validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for `AppConfig`.
    #[error("cannot parse config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TrialError>;
