#![forbid(unsafe_code)]

//! Declared factor domains for an experiment.
//!
//! The condition table supplies stimulus identities; everything else about
//! the factorial design is declared here and checked once by
//! [`FactorSchema::validate`] before any randomness is consumed.

use std::fmt;

use serde::Serialize;

use crate::error::{GenerationError, Result};
use crate::geometry::Region;
use crate::partition::{Side, half_counts};
use crate::sampler::SamplerConstraints;

/// Whether the target appears in the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub const ALL: [Self; 2] = [Self::Present, Self::Absent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    /// Correct response key for displays without item orientations.
    #[must_use]
    pub const fn response_key(self) -> &'static str {
        match self {
            Self::Present => "up",
            Self::Absent => "down",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction the top of a scattered item points.
///
/// Scattered displays draw one per item; participants answer with the
/// arrow key matching the target's orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Left,
    Up,
    Right,
    Down,
}

impl Orientation {
    /// Draw order: an index into this array is what the stream picks.
    pub const ALL: [Self; 4] = [Self::Left, Self::Up, Self::Right, Self::Down];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
        }
    }

    /// Clockwise rotation of the drawn item.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Left => 270,
            Self::Up => 0,
            Self::Right => 90,
            Self::Down => 180,
        }
    }

    /// Arrow key answering a target with this orientation.
    #[inline]
    #[must_use]
    pub const fn response_key(self) -> &'static str {
        self.as_str()
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|orientation| orientation.as_str() == raw.trim())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How stimuli are arranged on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    /// Discrete slots on a ring, split into left and right halves.
    Slots { num_positions: usize },
    /// Free positions sampled inside a square around fixation.
    Scattered(SamplerConstraints),
}

impl Layout {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Slots { .. } => "slots",
            Self::Scattered(_) => "scattered",
        }
    }

    /// Number of target-location cells per presence/set-size combination.
    ///
    /// Slot layouts cross every slot; absent trials repeat once per slot so
    /// present and absent trials stay balanced. Scattered layouts have a
    /// single free cell.
    #[must_use]
    pub const fn location_cells(&self) -> usize {
        match self {
            Self::Slots { num_positions } => *num_positions,
            Self::Scattered(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorSchema {
    pub presence: Vec<Presence>,
    pub set_sizes: Vec<usize>,
    pub layout: Layout,
    pub replications: usize,
}

impl FactorSchema {
    /// The grid design: twelve ring slots, set sizes 4/6/12, both presence
    /// values, one replication.
    #[must_use]
    pub fn blocked_slots() -> Self {
        Self {
            presence: Presence::ALL.to_vec(),
            set_sizes: vec![4, 6, 12],
            layout: Layout::Slots { num_positions: 12 },
            replications: 1,
        }
    }

    /// The free-layout design: positions within 6 units of fixation, at
    /// least 2 units apart, target always present.
    pub fn scattered(half_width: f64, min_distance: f64) -> Result<Self> {
        let region = Region::centered_square(half_width).ok_or_else(|| {
            GenerationError::invalid_schema(format!(
                "allowed distance from fixation must be positive, got {half_width}"
            ))
        })?;
        Ok(Self {
            presence: vec![Presence::Present],
            set_sizes: vec![2, 6, 10, 14, 18],
            layout: Layout::Scattered(SamplerConstraints::new(region, min_distance)?),
            replications: 2,
        })
    }

    /// Trials contributed by one stimulus combination.
    #[must_use]
    pub fn trials_per_stimulus_combination(&self) -> usize {
        self.presence.len()
            * self.set_sizes.len()
            * self.layout.location_cells()
            * self.replications
    }

    /// Reject domains that the layout cannot realise.
    ///
    /// Odd set sizes are refused for absent slot trials, which must split
    /// evenly across the halves.
    pub fn validate(&self) -> Result<()> {
        if self.presence.is_empty() {
            return Err(GenerationError::invalid_schema("presence domain is empty"));
        }
        if self.set_sizes.is_empty() {
            return Err(GenerationError::invalid_schema("set size domain is empty"));
        }
        if self.replications == 0 {
            return Err(GenerationError::invalid_schema(
                "replications must be at least 1",
            ));
        }
        for (i, presence) in self.presence.iter().enumerate() {
            if self.presence[..i].contains(presence) {
                return Err(GenerationError::invalid_schema(format!(
                    "presence value {presence} listed twice"
                )));
            }
        }
        for (i, size) in self.set_sizes.iter().enumerate() {
            if self.set_sizes[..i].contains(size) {
                return Err(GenerationError::invalid_schema(format!(
                    "set size {size} listed twice"
                )));
            }
        }

        match self.layout {
            Layout::Slots { num_positions } => {
                if num_positions == 0 || num_positions % 2 != 0 {
                    return Err(GenerationError::invalid_schema(format!(
                        "slot layouts need a positive even number of positions, got {num_positions}"
                    )));
                }
                for &size in &self.set_sizes {
                    for &presence in &self.presence {
                        match presence {
                            Presence::Present => {
                                half_counts(num_positions, size, Some(Side::Left))?;
                                half_counts(num_positions, size, Some(Side::Right))?;
                            }
                            Presence::Absent => {
                                half_counts(num_positions, size, None)?;
                            }
                        }
                    }
                }
            }
            Layout::Scattered(constraints) => {
                if self.presence.contains(&Presence::Present) && self.set_sizes.contains(&0) {
                    return Err(GenerationError::invalid_schema(
                        "a present trial needs a set size of at least 1",
                    ));
                }
                if let Some(cap) = constraints.max_per_quadrant
                    && let Some(&largest) = self.set_sizes.iter().max()
                    && largest > cap * 4
                {
                    return Err(GenerationError::invalid_schema(format!(
                        "set size {largest} exceeds four quadrants of {cap}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FactorSchema, Layout, Orientation, Presence};
    use crate::error::GenerationError;

    #[test]
    fn built_in_designs_validate() {
        FactorSchema::blocked_slots().validate().expect("slots");
        FactorSchema::scattered(6.0, 2.0)
            .expect("scattered")
            .validate()
            .expect("scattered valid");
    }

    #[test]
    fn blocked_design_cell_count() {
        // 2 presence x 3 set sizes x 12 slots.
        assert_eq!(FactorSchema::blocked_slots().trials_per_stimulus_combination(), 72);
    }

    #[test]
    fn odd_absent_set_size_is_rejected_for_slots() {
        let schema = FactorSchema {
            set_sizes: vec![4, 5],
            ..FactorSchema::blocked_slots()
        };
        assert!(matches!(
            schema.validate().expect_err("odd absent"),
            GenerationError::InvalidSchema { .. }
        ));

        let present_only = FactorSchema {
            presence: vec![Presence::Present],
            set_sizes: vec![5],
            ..FactorSchema::blocked_slots()
        };
        present_only.validate().expect("odd present sizes split asymmetrically");
    }

    #[test]
    fn duplicate_and_empty_domains_are_rejected() {
        let dup = FactorSchema {
            set_sizes: vec![4, 4],
            ..FactorSchema::blocked_slots()
        };
        assert!(dup.validate().is_err());

        let empty = FactorSchema {
            presence: Vec::new(),
            ..FactorSchema::blocked_slots()
        };
        assert!(empty.validate().is_err());

        let zero_reps = FactorSchema {
            replications: 0,
            ..FactorSchema::blocked_slots()
        };
        assert!(zero_reps.validate().is_err());
    }

    #[test]
    fn odd_slot_count_is_rejected() {
        let schema = FactorSchema {
            layout: Layout::Slots { num_positions: 11 },
            set_sizes: vec![4],
            ..FactorSchema::blocked_slots()
        };
        assert!(schema.validate().is_err());
    }

    #[test]
    fn quadrant_cap_must_hold_largest_set_size() {
        let mut schema = FactorSchema::scattered(6.0, 1.0).expect("scattered");
        if let Layout::Scattered(constraints) = &mut schema.layout {
            constraints.max_per_quadrant = Some(4);
        }
        assert!(schema.validate().is_err());
    }

    #[test]
    fn presence_parses_and_maps_to_keys() {
        assert_eq!(Presence::parse("present"), Some(Presence::Present));
        assert_eq!(Presence::parse("absent"), Some(Presence::Absent));
        assert_eq!(Presence::parse("maybe"), None);
        assert_eq!(Presence::Present.response_key(), "up");
        assert_eq!(Presence::Absent.response_key(), "down");
    }

    #[test]
    fn orientations_map_to_arrow_keys_and_rotations() {
        let keys: Vec<&str> = Orientation::ALL.iter().map(|o| o.response_key()).collect();
        assert_eq!(keys, vec!["left", "up", "right", "down"]);
        assert_eq!(Orientation::Left.degrees(), 270);
        assert_eq!(Orientation::Up.degrees(), 0);
        assert_eq!(Orientation::parse(" right"), Some(Orientation::Right));
        assert_eq!(Orientation::parse("sideways"), None);
    }
}
