#![forbid(unsafe_code)]

//! Core: seeded, constraint-respecting trial generation for visual search
//! experiments.
//!
//! # Primary responsibilities
//! - **RunConfig**: run-time fields (subject, seed, language, block order)
//!   and their validation.
//! - **ConditionTable**: the tab-separated stimulus table that defines
//!   blocks and stimulus pairings.
//! - **FactorSchema**: presence, set sizes, layout and replications.
//! - **Builder and shuffler**: factorial expansion, location placement and
//!   within-block shuffling from one seeded stream.
//! - **Trial files**: rendering, reading back, checking and atomic writes.
//!
//! # Determinism
//! Every random draw in a run comes from a single [`rng::TrialRng`] seeded
//! from the run's seed. Given the same configuration, schema and condition
//! table, [`generate`] renders byte-identical output.
//!
//! ```
//! use vizsearch_core::{ConditionTable, FactorSchema, RunConfig, generate};
//!
//! let table = ConditionTable::parse(
//!     "block\ttargetName\ttargetPic\tdistractorName\tdistractorPic\n\
//!      L\tT\tT_1\tL\tL_1\n",
//! )?;
//! let config = RunConfig::new("s1", "20", "e", "L");
//! let trials = generate(&config, &FactorSchema::blocked_slots(), &table)?;
//! assert_eq!(trials.trial_count(), 72);
//! # Ok::<(), vizsearch_core::GenerationError>(())
//! ```

pub mod builder;
pub mod conditions;
pub mod config;
pub mod error;
pub mod geometry;
pub mod partition;
pub mod pipeline;
pub mod rng;
pub mod sampler;
pub mod schema;
pub mod shuffle;
pub mod trial;
pub mod trial_file;

pub use builder::{Block, build_trials};
pub use conditions::{ConditionTable, StimulusCombination};
pub use config::RunConfig;
pub use error::{GenerationError, Result};
pub use geometry::{Point, Region, SlotRing};
pub use pipeline::{GeneratedTrials, generate};
pub use rng::{Seed, TrialRng};
pub use sampler::{SamplerConstraints, sample_locations};
pub use schema::{FactorSchema, Layout, Orientation, Presence};
pub use trial::{Location, TrialRecord};
pub use trial_file::{TrialFile, TrialFileSummary, write_atomic};
