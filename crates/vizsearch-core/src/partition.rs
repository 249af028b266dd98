#![forbid(unsafe_code)]

//! Left/right partition of discrete display slots.
//!
//! Slots `0..n/2` form the left half and `n/2..n` the right half. The half
//! holding the target gives up one slot to it, so a present trial of set
//! size `s` draws `floor((s-1)/2)` distractors from the target's half and
//! `s - 1 - floor((s-1)/2)` from the other. An absent trial draws `s/2`
//! from each half.

use serde::Serialize;

use crate::error::{GenerationError, Result};
use crate::rng::TrialRng;

/// Half of the slot list. `Left` is the first half, `0..n/2`.
///
/// The names follow the order of the slot list, not the screen: on a
/// [`SlotRing`](crate::geometry::SlotRing) the first half sits at x > 0,
/// right of fixation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Half of an `num_positions`-slot ring that `slot` belongs to.
    #[inline]
    pub const fn of(slot: usize, num_positions: usize) -> Self {
        if slot < num_positions / 2 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Slot assignment for one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPartition {
    pub target: Option<usize>,
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

impl SlotPartition {
    /// Distractor slots, left picks first.
    #[must_use]
    pub fn distractors(&self) -> Vec<usize> {
        self.left.iter().chain(&self.right).copied().collect()
    }

    /// Side holding the target, if any.
    #[must_use]
    pub fn target_side(&self, num_positions: usize) -> Option<Side> {
        self.target.map(|slot| Side::of(slot, num_positions))
    }
}

/// Number of distractors each half contributes: `(left, right)`.
pub fn half_counts(
    num_positions: usize,
    set_size: usize,
    target_side: Option<Side>,
) -> Result<(usize, usize)> {
    let half = num_positions / 2;
    let (left, right) = match target_side {
        Some(side) => {
            if set_size == 0 {
                return Err(GenerationError::invalid_schema(
                    "a present trial needs a set size of at least 1",
                ));
            }
            let with_target = (set_size - 1) / 2;
            let other = set_size - 1 - with_target;
            match side {
                Side::Left => (with_target, other),
                Side::Right => (other, with_target),
            }
        }
        None => {
            if set_size % 2 != 0 {
                return Err(GenerationError::invalid_schema(format!(
                    "absent trials need an even set size to split across halves, got {set_size}"
                )));
            }
            (set_size / 2, set_size / 2)
        }
    };

    let (left_room, right_room) = match target_side {
        Some(Side::Left) => (half.saturating_sub(1), half),
        Some(Side::Right) => (half, half.saturating_sub(1)),
        None => (half, half),
    };
    if left > left_room || right > right_room {
        return Err(GenerationError::invalid_schema(format!(
            "set size {set_size} does not fit {num_positions} slots ({left}+{right} distractors)"
        )));
    }
    Ok((left, right))
}

/// Assign distractor slots for one trial.
///
/// `target` is the target slot for present trials and `None` for absent
/// ones. Draws are made from the left half first, then the right.
pub fn partition_positions(
    num_positions: usize,
    set_size: usize,
    target: Option<usize>,
    rng: &mut TrialRng,
) -> Result<SlotPartition> {
    if num_positions == 0 || num_positions % 2 != 0 {
        return Err(GenerationError::invalid_schema(format!(
            "slot layouts need a positive even number of positions, got {num_positions}"
        )));
    }
    if let Some(slot) = target
        && slot >= num_positions
    {
        return Err(GenerationError::invalid_schema(format!(
            "target slot {slot} is outside 0..{num_positions}"
        )));
    }

    let half = num_positions / 2;
    let mut left_pool: Vec<usize> = (0..half).collect();
    let mut right_pool: Vec<usize> = (half..num_positions).collect();
    let side = target.map(|slot| Side::of(slot, num_positions));
    if let Some(slot) = target {
        match side {
            Some(Side::Left) => left_pool.retain(|&s| s != slot),
            _ => right_pool.retain(|&s| s != slot),
        }
    }

    let (left_count, right_count) = half_counts(num_positions, set_size, side)?;
    let left = rng.sample_without_replacement(&left_pool, left_count)?;
    let right = rng.sample_without_replacement(&right_pool, right_count)?;

    Ok(SlotPartition {
        target,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use super::{Side, half_counts, partition_positions};
    use crate::error::GenerationError;
    use crate::geometry::SlotRing;
    use crate::rng::TrialRng;

    #[test]
    fn left_half_is_list_order_not_screen_side() {
        let ring = SlotRing::new(12, 200.0);
        for slot in 0..12 {
            let point = ring.position(slot).expect("slot on ring");
            let side = Side::of(slot, 12);
            assert_eq!(side == Side::Left, point.x > 0.0, "slot {slot}");
        }
    }

    #[test]
    fn six_items_target_left_splits_two_and_three() {
        let mut rng = TrialRng::from_u64(20);
        let partition = partition_positions(12, 6, Some(2), &mut rng).expect("partition");

        assert_eq!(partition.left.len(), 2);
        assert_eq!(partition.right.len(), 3);
        assert!(!partition.left.contains(&2));
        assert!(partition.left.iter().all(|&s| s < 6));
        assert!(partition.right.iter().all(|&s| (6..12).contains(&s)));
        assert_eq!(partition.distractors().len(), 5);
        assert_eq!(partition.target_side(12), Some(Side::Left));
    }

    #[test]
    fn target_right_mirrors_the_split() {
        assert_eq!(half_counts(12, 6, Some(Side::Right)).expect("counts"), (3, 2));
        assert_eq!(half_counts(12, 12, Some(Side::Left)).expect("counts"), (5, 6));
        assert_eq!(half_counts(12, 5, Some(Side::Left)).expect("counts"), (2, 2));
    }

    #[test]
    fn absent_trials_split_evenly_and_reject_odd_sizes() {
        assert_eq!(half_counts(12, 4, None).expect("counts"), (2, 2));
        assert!(matches!(
            half_counts(12, 5, None).expect_err("odd"),
            GenerationError::InvalidSchema { .. }
        ));

        let mut rng = TrialRng::from_u64(1);
        let partition = partition_positions(12, 12, None, &mut rng).expect("full display");
        let mut all = partition.distractors();
        all.sort_unstable();
        assert_eq!(all, (0..12).collect::<Vec<_>>());
        assert_eq!(partition.target, None);
    }

    #[test]
    fn oversized_set_sizes_are_rejected() {
        assert!(half_counts(12, 13, Some(Side::Left)).is_err());
        assert!(half_counts(12, 14, None).is_err());
        assert!(half_counts(12, 0, Some(Side::Left)).is_err());
    }

    #[test]
    fn odd_or_out_of_range_geometry_is_rejected() {
        let mut rng = TrialRng::from_u64(1);
        assert!(partition_positions(11, 4, None, &mut rng).is_err());
        assert!(partition_positions(12, 4, Some(12), &mut rng).is_err());
    }
}
