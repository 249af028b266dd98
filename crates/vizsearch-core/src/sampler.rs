#![forbid(unsafe_code)]

//! Constrained location sampler for scattered displays.
//!
//! Positions are drawn uniformly from a square around fixation and kept
//! only if they clear fixation and every previously accepted position by
//! at least `min_distance`, and (optionally) if their quadrant still has
//! room. Every attempt counts against a fixed ceiling; running out is a
//! hard [`GenerationError::GenerationTimeout`].

use tracing::{trace, warn};

use crate::error::{GenerationError, Result};
use crate::geometry::{Point, Region};
use crate::rng::TrialRng;

/// Default attempt ceiling per trial.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

/// Geometric constraints for one scattered display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConstraints {
    pub region: Region,
    pub min_distance: f64,
    pub max_per_quadrant: Option<usize>,
    pub max_attempts: u32,
}

impl SamplerConstraints {
    pub fn new(region: Region, min_distance: f64) -> Result<Self> {
        if !(min_distance.is_finite() && min_distance > 0.0) {
            return Err(GenerationError::invalid_config(format!(
                "min_distance must be a positive number, got {min_distance}"
            )));
        }
        Ok(Self {
            region,
            min_distance,
            max_per_quadrant: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    #[must_use]
    pub fn with_max_per_quadrant(mut self, cap: Option<usize>) -> Self {
        self.max_per_quadrant = cap;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// True when `candidate` is within `min_distance` of fixation or of
    /// any accepted location.
    fn too_close(&self, candidate: &Point, accepted: &[Point]) -> bool {
        candidate.norm() < self.min_distance
            || accepted
                .iter()
                .any(|loc| candidate.distance(loc) < self.min_distance)
    }
}

/// Sample `count` positions satisfying `constraints`.
///
/// Each attempt draws `x` then `y` from the stream. Returned positions are
/// in acceptance order.
pub fn sample_locations(
    count: usize,
    constraints: &SamplerConstraints,
    rng: &mut TrialRng,
) -> Result<Vec<Point>> {
    let half = constraints.region.half_width();
    let mut quad_count = [0usize; 4];
    let mut locs = Vec::with_capacity(count);
    let mut attempts = 0u32;

    while locs.len() < count {
        attempts += 1;
        if attempts > constraints.max_attempts {
            warn!(
                requested = count,
                placed = locs.len(),
                attempts = constraints.max_attempts,
                "location sampling exhausted its attempt budget"
            );
            return Err(GenerationError::GenerationTimeout {
                requested: count,
                placed: locs.len(),
                attempts: constraints.max_attempts,
            });
        }

        let x = rng.uniform(-half, half);
        let y = rng.uniform(-half, half);
        let candidate = Point::new(x, y);

        if constraints.too_close(&candidate, &locs) {
            continue;
        }

        if let Some(cap) = constraints.max_per_quadrant {
            let quad = candidate.quadrant().index();
            if quad_count[quad] >= cap {
                continue;
            }
            quad_count[quad] += 1;
        }
        locs.push(candidate);
    }

    trace!(count, attempts, "locations sampled");
    Ok(locs)
}
