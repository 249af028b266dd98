#![forbid(unsafe_code)]

//! One generation run: validate, build, shuffle, render.
//!
//! Nothing here touches the file system. A run either produces the whole
//! trial file text or an error.

use tracing::{info, info_span};

use crate::builder::{Block, build_trials};
use crate::conditions::ConditionTable;
use crate::config::{RunConfig, check_blocks};
use crate::error::{GenerationError, Result};
use crate::rng::{Seed, TrialRng};
use crate::schema::FactorSchema;
use crate::shuffle::shuffle_blocks;
use crate::trial::TRIAL_COLUMNS;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTrials {
    pub subject: String,
    pub seed: Seed,
    pub header: Vec<String>,
    pub blocks: Vec<Block>,
    /// Draw operations consumed from the stream, for diagnostics.
    pub draws: u64,
}

impl GeneratedTrials {
    #[must_use]
    pub fn trial_count(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }

    /// Tab-separated trial file: header, then every block in order.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.header.join("\t");
        out.push('\n');
        for trial in self.blocks.iter().flat_map(|block| &block.trials) {
            out.push_str(&trial.row().join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Header of a trial file for the given configuration.
#[must_use]
pub fn trial_file_header(config: &RunConfig) -> Vec<String> {
    let mut header: Vec<String> = config.names().map(str::to_string).collect();
    header.extend(TRIAL_COLUMNS.iter().map(|column| (*column).to_string()));
    header
}

/// Run a complete generation.
///
/// Validation order: run configuration (subject, fields, seed, block
/// order), schema, then the block set against the condition table. Only
/// then is the stream seeded; it is consumed by the builder and then by
/// the shuffler, block by block in block order.
pub fn generate(
    config: &RunConfig,
    schema: &FactorSchema,
    table: &ConditionTable,
) -> Result<GeneratedTrials> {
    let run = config.validate()?;
    let _span = info_span!("generate", subject = %run.subject, seed = run.seed.value()).entered();
    schema.validate()?;
    check_blocks(&run.block_order, table)?;

    if let Some(column) = TRIAL_COLUMNS.iter().find(|column| config.get(column).is_some()) {
        return Err(GenerationError::invalid_config(format!(
            "run-time field {column} collides with a trial column"
        )));
    }
    let header = trial_file_header(config);

    let mut rng = TrialRng::from_seed(&run.seed);
    let mut blocks = build_trials(schema, table, config, &run.block_order, &mut rng)?;
    shuffle_blocks(&mut blocks, &mut rng);

    let generated = GeneratedTrials {
        subject: run.subject,
        seed: run.seed,
        header,
        blocks,
        draws: rng.draws(),
    };
    info!(
        blocks = generated.blocks.len(),
        trials = generated.trial_count(),
        draws = generated.draws,
        "trials generated"
    );
    Ok(generated)
}
