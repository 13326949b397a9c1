use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading, parsing,
/// or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the default config file.
    #[error("failed to create default config at {path}: {reason}")]
    CreateDefault {
        path: PathBuf,
        reason: String,
    },

    /// TOML parsing failed.
    #[error("TOML parse error in {origin}: {message}")]
    Parse {
        /// File path, or `<string>` for in-memory input.
        origin: String,
        message: String,
    },

    /// A config value failed validation.
    #[error("validation error: {field}: {message}")]
    Validation {
        /// The dotted field path (e.g. `target.port`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// Several values failed validation.
    #[error("{} invalid settings: {}", .0.len(), join(.0))]
    Invalid(Vec<ConfigError>),

    /// An I/O error occurred while reading or writing config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn parse(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ConfigError::Parse {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    /// Collapse a list of violations into one error.
    pub(crate) fn from_violations(mut errors: Vec<ConfigError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            ConfigError::Invalid(errors)
        }
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
