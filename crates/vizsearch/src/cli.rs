use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::generate::{GenerateArgs, run_generate};
use crate::inspect::{InspectArgs, run_inspect};
use crate::profile::print_profiles;
use crate::sample::{SampleArgs, run_sample};

#[derive(Debug, Parser)]
#[command(
    name = "vizsearch",
    about = "Seeded trial file generation for visual search experiments",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a subject's trial file.
    Generate(GenerateArgs),

    /// Summarize a trial file and check its placement invariants.
    Inspect(InspectArgs),

    /// Sample one scattered display and print it as JSON.
    Sample(SampleArgs),

    /// Print built-in profile names.
    #[command(name = "list-profiles")]
    ListProfiles,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::Sample(args) => run_sample(args),
        Commands::ListProfiles => {
            print_profiles();
            Ok(())
        }
    }
}
