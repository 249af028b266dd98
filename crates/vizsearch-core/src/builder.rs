#![forbid(unsafe_code)]

//! Factorial trial builder.
//!
//! # Stream order
//!
//! Reproducibility depends only on the seed and on the order in which the
//! shared [`TrialRng`] is consumed. The builder fixes that order:
//!
//! 1. blocks, in the run's block order;
//! 2. stimulus combinations, in [`ConditionTable::stimulus_combinations`]
//!    order;
//! 3. presence, then set size, in schema order;
//! 4. target-location cell (slot index, or the single scattered cell);
//! 5. replication.
//!
//! Within one trial, slot layouts draw the left half then the right half;
//! scattered layouts draw the target index (present trials only), then the
//! positions, then one [`Orientation`] per item in sampled order. Block
//! shuffling happens afterwards, see [`crate::shuffle`].

use serde::Serialize;
use tracing::{debug, info_span};

use crate::conditions::{ConditionTable, StimulusCombination};
use crate::config::{RunConfig, check_blocks};
use crate::error::Result;
use crate::partition::partition_positions;
use crate::rng::TrialRng;
use crate::sampler::sample_locations;
use crate::schema::{FactorSchema, Layout, Orientation, Presence};
use crate::trial::{Location, TrialRecord, response_key};

/// Trials sharing a block label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub label: String,
    pub trials: Vec<TrialRecord>,
}

impl Block {
    #[inline]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

/// Build every block of the design, in `block_order`, before shuffling.
pub fn build_trials(
    schema: &FactorSchema,
    table: &ConditionTable,
    config: &RunConfig,
    block_order: &[String],
    rng: &mut TrialRng,
) -> Result<Vec<Block>> {
    schema.validate()?;
    check_blocks(block_order, table)?;

    let config_values: Vec<String> = config.values().map(str::to_string).collect();
    let mut blocks = Vec::with_capacity(block_order.len());

    for label in block_order {
        let _span = info_span!("build_block", block = %label).entered();
        let combinations = table.stimulus_combinations(label);
        let mut trials =
            Vec::with_capacity(combinations.len() * schema.trials_per_stimulus_combination());

        for stimulus in &combinations {
            for &presence in &schema.presence {
                for &set_size in &schema.set_sizes {
                    for cell in 0..schema.layout.location_cells() {
                        for _ in 0..schema.replications {
                            let placement =
                                place_stimuli(&schema.layout, presence, set_size, cell, rng)?;
                            trials.push(TrialRecord {
                                config_values: config_values.clone(),
                                block: label.clone(),
                                stimulus: stimulus.clone(),
                                presence,
                                set_size,
                                target_location: placement.target,
                                distractor_locations: placement.distractors,
                                target_orientation: placement.target_orientation,
                                distractor_orientations: placement.distractor_orientations,
                                response_key: response_key(
                                    presence,
                                    placement.target_orientation,
                                ),
                            });
                        }
                    }
                }
            }
        }

        debug!(
            trials = trials.len(),
            combinations = combinations.len(),
            "block built"
        );
        blocks.push(Block {
            label: label.clone(),
            trials,
        });
    }
    Ok(blocks)
}

/// Number of trials a block of `combinations` stimulus pairings holds.
#[must_use]
pub fn expected_block_len(schema: &FactorSchema, combinations: &[StimulusCombination]) -> usize {
    combinations.len() * schema.trials_per_stimulus_combination()
}

struct Placement {
    target: Option<Location>,
    distractors: Vec<Location>,
    target_orientation: Option<Orientation>,
    distractor_orientations: Vec<Orientation>,
}

/// Resolve the target and distractor locations of one trial.
fn place_stimuli(
    layout: &Layout,
    presence: Presence,
    set_size: usize,
    cell: usize,
    rng: &mut TrialRng,
) -> Result<Placement> {
    match layout {
        Layout::Slots { num_positions } => {
            let target = (presence == Presence::Present).then_some(cell);
            let partition = partition_positions(*num_positions, set_size, target, rng)?;
            Ok(Placement {
                target: target.map(Location::Slot),
                distractors: partition.distractors().into_iter().map(Location::Slot).collect(),
                target_orientation: None,
                distractor_orientations: Vec::new(),
            })
        }
        Layout::Scattered(constraints) => {
            let target_index = (presence == Presence::Present).then(|| rng.index(set_size));
            let mut points = sample_locations(set_size, constraints, rng)?;
            let mut orientations: Vec<Orientation> = (0..set_size)
                .map(|_| Orientation::ALL[rng.index(Orientation::ALL.len())])
                .collect();
            let (target, target_orientation) = match target_index {
                Some(i) => (
                    Some(Location::Point(points.remove(i))),
                    Some(orientations.remove(i)),
                ),
                None => (None, None),
            };
            Ok(Placement {
                target,
                distractors: points.into_iter().map(Location::Point).collect(),
                target_orientation,
                distractor_orientations: orientations,
            })
        }
    }
}
