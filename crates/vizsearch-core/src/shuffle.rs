#![forbid(unsafe_code)]

//! Within-block shuffling.

use tracing::trace;

use crate::builder::Block;
use crate::rng::TrialRng;

/// Permute a block's trials in place. Label and trial count are unchanged.
pub fn shuffle_block(block: &mut Block, rng: &mut TrialRng) {
    rng.shuffle(&mut block.trials);
    trace!(block = %block.label, trials = block.trials.len(), "block shuffled");
}

/// Shuffle every block in slice order, one after another, from the same
/// stream. The slice order must be the run's block order.
pub fn shuffle_blocks(blocks: &mut [Block], rng: &mut TrialRng) {
    for block in blocks {
        shuffle_block(block, rng);
    }
}
