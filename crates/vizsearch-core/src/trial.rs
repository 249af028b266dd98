#![forbid(unsafe_code)]

//! Trial records and their text encoding.
//!
//! Orientations ride inside the location cells of scattered trials as a
//! third list element (`[1.500, -2.000, up]`), so the header keeps the
//! same nine trial columns for every layout.

use std::fmt;

use serde::Serialize;

use crate::conditions::StimulusCombination;
use crate::geometry::Point;
use crate::schema::{Orientation, Presence};

/// Trial columns written after the run-time configuration fields.
pub const TRIAL_COLUMNS: [&str; 9] = [
    "block",
    "targetName",
    "targetPic",
    "distractorName",
    "distractorPic",
    "targetLocation",
    "isPresent",
    "numItems",
    "distractorLocations",
];

/// Written in place of a target location on absent trials.
pub const ABSENT_LOCATION: &str = "NA";

/// Where one stimulus goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Location {
    /// Index of a ring slot.
    Slot(usize),
    /// Free position in visual-angle units.
    Point(Point),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Point(point) => write!(f, "[{:.3}, {:.3}]", point.x, point.y),
        }
    }
}

/// One location cell, with the item's orientation when it has one.
#[must_use]
pub fn format_item(location: &Location, orientation: Option<Orientation>) -> String {
    match (location, orientation) {
        (Location::Point(point), Some(orientation)) => {
            format!("[{:.3}, {:.3}, {orientation}]", point.x, point.y)
        }
        _ => location.to_string(),
    }
}

/// `[a, b, c]`, the list encoding used for distractor locations.
/// `orientations` is either empty or parallel to `locations`.
#[must_use]
pub fn format_items(locations: &[Location], orientations: &[Orientation]) -> String {
    let items: Vec<String> = locations
        .iter()
        .enumerate()
        .map(|(i, loc)| format_item(loc, orientations.get(i).copied()))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Correct key for a trial: the target's orientation when the display
/// draws orientations, the presence key otherwise.
#[must_use]
pub fn response_key(presence: Presence, target_orientation: Option<Orientation>) -> &'static str {
    target_orientation.map_or_else(|| presence.response_key(), Orientation::response_key)
}

/// One fully resolved trial. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub config_values: Vec<String>,
    pub block: String,
    #[serde(flatten)]
    pub stimulus: StimulusCombination,
    pub presence: Presence,
    pub set_size: usize,
    pub target_location: Option<Location>,
    pub distractor_locations: Vec<Location>,
    /// Set on scattered present trials.
    pub target_orientation: Option<Orientation>,
    /// Empty for slot layouts, parallel to `distractor_locations` otherwise.
    pub distractor_orientations: Vec<Orientation>,
    pub response_key: &'static str,
}

impl TrialRecord {
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.presence == Presence::Present
    }

    /// Cells of the trial-file row, configuration values first.
    #[must_use]
    pub fn row(&self) -> Vec<String> {
        let mut cells = self.config_values.clone();
        cells.extend([
            self.block.clone(),
            self.stimulus.target_name.clone(),
            self.stimulus.target_pic.clone(),
            self.stimulus.distractor_name.clone(),
            self.stimulus.distractor_pic.clone(),
            self.target_location.map_or_else(
                || ABSENT_LOCATION.to_string(),
                |loc| format_item(&loc, self.target_orientation),
            ),
            self.presence.to_string(),
            self.set_size.to_string(),
            format_items(&self.distractor_locations, &self.distractor_orientations),
        ]);
        cells
    }
}
