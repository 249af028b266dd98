#![forbid(unsafe_code)]

//! Error taxonomy for trial generation.
//!
//! Every variant is terminal for a generation run: the pipeline never
//! retries with relaxed constraints and never writes partial output.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// A required run-time field is missing, empty, or unanswered.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// The seed could not be read as an integer.
    #[error("could not parse seed {raw:?} as an integer (check for trailing spaces)")]
    SeedParse { raw: String },

    /// The requested block order does not cover the condition table's blocks.
    #[error(
        "blocks do not match: block order has [{}], condition table has [{}]",
        requested.join(", "),
        available.join(", ")
    )]
    ConfigurationMismatch {
        requested: Vec<String>,
        available: Vec<String>,
    },

    /// Rejection sampling ran out of attempts.
    #[error(
        "cannot generate locations with given values: placed {placed} of {requested} after {attempts} attempts"
    )]
    GenerationTimeout {
        requested: usize,
        placed: usize,
        attempts: u32,
    },

    /// The factor schema declares a domain the layout cannot realise.
    #[error("invalid factor schema: {message}")]
    InvalidSchema { message: String },

    #[error("condition table line {line}: {message}")]
    ConditionTable { line: usize, message: String },

    #[error("trial file line {line}: {message}")]
    TrialFile { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// True for errors caused by the run-time configuration rather than by
    /// the design or the sampler.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. }
                | Self::SeedParse { .. }
                | Self::ConfigurationMismatch { .. }
        )
    }
}
