use clap::Args;
use serde::Serialize;
use vizsearch_core::geometry::Region;
use vizsearch_core::sampler::DEFAULT_MAX_ATTEMPTS;
use vizsearch_core::{SamplerConstraints, Seed, TrialRng, sample_locations};

use crate::error::{CliError, Result};

/// Draw one scattered display and print it as JSON.
#[derive(Debug, Clone, Args)]
pub struct SampleArgs {
    #[arg(long)]
    pub count: usize,

    /// Half width of the square around fixation.
    #[arg(long = "half-width")]
    pub half_width: f64,

    #[arg(long = "min-distance")]
    pub min_distance: f64,

    #[arg(long = "max-per-quad")]
    pub max_per_quad: Option<usize>,

    #[arg(long = "max-attempts", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(long, allow_hyphen_values = true)]
    pub seed: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampledLocation {
    pub x: f64,
    pub y: f64,
    pub quadrant: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub seed: i64,
    pub count: usize,
    pub draws: u64,
    pub locations: Vec<SampledLocation>,
}

pub fn sample(args: &SampleArgs) -> Result<SampleReport> {
    let seed = Seed::parse(&args.seed)?;
    let region = Region::centered_square(args.half_width).ok_or_else(|| {
        CliError::invalid(format!("half width must be positive, got {}", args.half_width))
    })?;
    let constraints = SamplerConstraints::new(region, args.min_distance)?
        .with_max_per_quadrant(args.max_per_quad)
        .with_max_attempts(args.max_attempts);

    let mut rng = TrialRng::from_seed(&seed);
    let locations = sample_locations(args.count, &constraints, &mut rng)?
        .into_iter()
        .map(|point| SampledLocation {
            x: point.x,
            y: point.y,
            quadrant: point.quadrant().index(),
        })
        .collect();

    Ok(SampleReport {
        seed: seed.value(),
        count: args.count,
        draws: rng.draws(),
        locations,
    })
}

pub fn run_sample(args: SampleArgs) -> Result<()> {
    let report = sample(&args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
