#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod generate;
pub mod inspect;
pub mod profile;
pub mod runmeta;
pub mod sample;
pub mod util;

pub use cli::run_from_env;
pub use error::{CliError, Result};
