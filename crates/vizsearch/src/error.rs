use std::path::PathBuf;

use thiserror::Error;
use vizsearch_core::GenerationError;

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for configuration and argument errors.
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for location sampling that ran out of attempts.
pub const EXIT_TIMEOUT: i32 = 3;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("required path does not exist: {path}")]
    MissingPath { path: PathBuf },

    #[error("output already exists: {path} (pass --force to overwrite)")]
    OutputExists { path: PathBuf },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::Generation(GenerationError::GenerationTimeout { .. }) => EXIT_TIMEOUT,
            Self::Generation(error) if error.is_configuration_error() => EXIT_CONFIG,
            Self::Generation(GenerationError::InvalidSchema { .. })
            | Self::ProfileNotFound { .. }
            | Self::InvalidArgument { .. }
            | Self::MissingPath { .. }
            | Self::OutputExists { .. } => EXIT_CONFIG,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
