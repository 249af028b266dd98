#![forbid(unsafe_code)]

//! Reading, checking and writing trial files.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::conditions::StimulusCombination;
use crate::error::{GenerationError, Result};
use crate::geometry::Point;
use crate::schema::{Layout, Orientation, Presence};
use crate::trial::{ABSENT_LOCATION, Location, TRIAL_COLUMNS, TrialRecord, response_key};

/// Slack for coordinates rounded to three decimals on write: two points
/// can each move by half a unit in the last place on both axes.
pub const PLACEMENT_TOLERANCE: f64 = 1.5e-3;

/// A trial file read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialFile {
    /// Names of the run-time configuration columns, in file order.
    pub config_fields: Vec<String>,
    pub trials: Vec<TrialRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub label: String,
    pub trials: usize,
    pub present: usize,
    pub absent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialFileSummary {
    pub trials: usize,
    pub blocks: Vec<BlockSummary>,
    pub set_sizes: BTreeMap<usize, usize>,
    pub violations: Vec<String>,
}

impl TrialFileSummary {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

impl TrialFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a trial file. The trial columns must be the last nine header
    /// cells; everything before them is run-time configuration.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.is_empty());

        let Some((_, header)) = lines.next() else {
            return Err(GenerationError::TrialFile {
                line: 1,
                message: "file is empty".to_string(),
            });
        };
        let header: Vec<&str> = header.split('\t').collect();
        let Some(config_len) = header.len().checked_sub(TRIAL_COLUMNS.len()) else {
            return Err(GenerationError::TrialFile {
                line: 1,
                message: format!("expected at least {} columns", TRIAL_COLUMNS.len()),
            });
        };
        if header[config_len..] != TRIAL_COLUMNS {
            return Err(GenerationError::TrialFile {
                line: 1,
                message: format!("header must end with {}", TRIAL_COLUMNS.join(", ")),
            });
        }

        let mut trials = Vec::new();
        for (line, raw) in lines {
            let cells: Vec<&str> = raw.split('\t').collect();
            if cells.len() != header.len() {
                return Err(GenerationError::TrialFile {
                    line,
                    message: format!("expected {} cells, found {}", header.len(), cells.len()),
                });
            }
            trials.push(parse_row(&cells, config_len).map_err(|message| {
                GenerationError::TrialFile { line, message }
            })?);
        }

        Ok(Self {
            config_fields: header[..config_len].iter().map(|s| (*s).to_string()).collect(),
            trials,
        })
    }

    /// Per-block counts and any rows that break the trial invariants.
    #[must_use]
    pub fn summarize(&self) -> TrialFileSummary {
        self.summarize_for(None)
    }

    /// Like [`summarize`](Self::summarize), also checking every row
    /// against the geometry of `layout`: slot indices in range for slot
    /// layouts; distance from fixation, pairwise distance, region and
    /// quadrant cap for scattered ones.
    #[must_use]
    pub fn summarize_for(&self, layout: Option<&Layout>) -> TrialFileSummary {
        let mut blocks: Vec<BlockSummary> = Vec::new();
        let mut set_sizes = BTreeMap::new();
        let mut violations = Vec::new();

        for (index, trial) in self.trials.iter().enumerate() {
            let row = index + 1;
            match blocks.last_mut() {
                Some(current) if current.label == trial.block => current.trials += 1,
                _ => {
                    if blocks.iter().any(|b| b.label == trial.block) {
                        violations.push(format!(
                            "row {row}: block {} is not contiguous",
                            trial.block
                        ));
                    }
                    blocks.push(BlockSummary {
                        label: trial.block.clone(),
                        trials: 1,
                        present: 0,
                        absent: 0,
                    });
                }
            }
            if let Some(current) = blocks.last_mut() {
                match trial.presence {
                    Presence::Present => current.present += 1,
                    Presence::Absent => current.absent += 1,
                }
            }
            *set_sizes.entry(trial.set_size).or_insert(0) += 1;
            let mut problems = trial_violations(trial);
            if let Some(layout) = layout {
                problems.extend(layout_violations(trial, layout));
            }
            violations.extend(
                problems
                    .into_iter()
                    .map(|message| format!("row {row}: {message}")),
            );
        }

        TrialFileSummary {
            trials: self.trials.len(),
            blocks,
            set_sizes,
            violations,
        }
    }
}

fn trial_violations(trial: &TrialRecord) -> Vec<String> {
    let mut problems = Vec::new();
    let expected = match trial.presence {
        Presence::Present => trial.set_size.saturating_sub(1),
        Presence::Absent => trial.set_size,
    };
    if trial.distractor_locations.len() != expected {
        problems.push(format!(
            "{} distractors for a {} trial of set size {}",
            trial.distractor_locations.len(),
            trial.presence,
            trial.set_size
        ));
    }
    match (trial.presence, trial.target_location) {
        (Presence::Present, None) => problems.push("present trial has no target".to_string()),
        (Presence::Absent, Some(_)) => problems.push("absent trial has a target".to_string()),
        (Presence::Present, Some(target)) if trial.distractor_locations.contains(&target) => {
            problems.push("target location is also a distractor location".to_string());
        }
        _ => {}
    }
    for (i, loc) in trial.distractor_locations.iter().enumerate() {
        if trial.distractor_locations[..i].contains(loc) {
            problems.push(format!("distractor location {loc} repeats"));
        }
    }
    let oriented = trial.target_orientation.is_some() || !trial.distractor_orientations.is_empty();
    if oriented
        && (trial.target_orientation.is_some() != trial.target_location.is_some()
            || trial.distractor_orientations.len() != trial.distractor_locations.len())
    {
        problems.push("orientations given for only some items".to_string());
    }
    problems
}

fn layout_violations(trial: &TrialRecord, layout: &Layout) -> Vec<String> {
    let mut problems = Vec::new();
    let items: Vec<&Location> = trial
        .target_location
        .iter()
        .chain(&trial.distractor_locations)
        .collect();

    match layout {
        Layout::Slots { num_positions } => {
            for loc in items {
                match loc {
                    Location::Slot(slot) if slot >= num_positions => problems.push(format!(
                        "slot {slot} is outside a ring of {num_positions}"
                    )),
                    Location::Slot(_) => {}
                    Location::Point(_) => {
                        problems.push(format!("point location {loc} in a slot layout"));
                    }
                }
            }
        }
        Layout::Scattered(constraints) => {
            let min = constraints.min_distance - PLACEMENT_TOLERANCE;
            let half = constraints.region.half_width() + PLACEMENT_TOLERANCE;
            let mut points = Vec::with_capacity(items.len());
            for loc in items {
                match loc {
                    Location::Point(point) => points.push(*point),
                    Location::Slot(_) => {
                        problems.push(format!("slot location {loc} in a scattered layout"));
                    }
                }
            }

            let mut quad_count = [0usize; 4];
            for (i, point) in points.iter().enumerate() {
                if point.norm() < min {
                    problems.push(format!(
                        "[{:.3}, {:.3}] is {:.3} from fixation, below {}",
                        point.x,
                        point.y,
                        point.norm(),
                        constraints.min_distance
                    ));
                }
                if point.x.abs() > half || point.y.abs() > half {
                    problems.push(format!(
                        "[{:.3}, {:.3}] lies outside the sampling region",
                        point.x, point.y
                    ));
                }
                for other in &points[i + 1..] {
                    if point.distance(other) < min {
                        problems.push(format!(
                            "[{:.3}, {:.3}] and [{:.3}, {:.3}] are {:.3} apart, below {}",
                            point.x,
                            point.y,
                            other.x,
                            other.y,
                            point.distance(other),
                            constraints.min_distance
                        ));
                    }
                }
                quad_count[point.quadrant().index()] += 1;
            }
            if let Some(cap) = constraints.max_per_quadrant {
                for (quad, &count) in quad_count.iter().enumerate() {
                    if count > cap {
                        problems.push(format!("quadrant {quad} holds {count} items, cap is {cap}"));
                    }
                }
            }
        }
    }
    problems
}

fn parse_row(cells: &[&str], config_len: usize) -> std::result::Result<TrialRecord, String> {
    let trial = &cells[config_len..];
    let presence = Presence::parse(trial[6]).ok_or_else(|| format!("bad isPresent {:?}", trial[6]))?;
    let set_size = trial[7]
        .parse::<usize>()
        .map_err(|_| format!("bad numItems {:?}", trial[7]))?;
    let (target_location, target_orientation) = if trial[5] == ABSENT_LOCATION {
        (None, None)
    } else {
        let (loc, orientation) =
            parse_item(trial[5]).ok_or_else(|| format!("bad targetLocation {:?}", trial[5]))?;
        (Some(loc), orientation)
    };
    let items = parse_item_list(trial[8])
        .ok_or_else(|| format!("bad distractorLocations {:?}", trial[8]))?;
    let distractor_locations: Vec<Location> = items.iter().map(|(loc, _)| *loc).collect();
    let distractor_orientations: Vec<Orientation> =
        items.iter().filter_map(|(_, orientation)| *orientation).collect();
    if !distractor_orientations.is_empty() && distractor_orientations.len() != items.len() {
        return Err(format!(
            "distractorLocations {:?} mixes oriented and bare items",
            trial[8]
        ));
    }

    Ok(TrialRecord {
        config_values: cells[..config_len].iter().map(|s| (*s).to_string()).collect(),
        block: trial[0].to_string(),
        stimulus: StimulusCombination {
            target_name: trial[1].to_string(),
            target_pic: trial[2].to_string(),
            distractor_name: trial[3].to_string(),
            distractor_pic: trial[4].to_string(),
        },
        presence,
        set_size,
        target_location,
        distractor_locations,
        target_orientation,
        distractor_orientations,
        response_key: response_key(presence, target_orientation),
    })
}

/// `7`, `[x, y]` or `[x, y, orientation]`.
#[must_use]
pub fn parse_item(raw: &str) -> Option<(Location, Option<Orientation>)> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        let (x, y, orientation) = match parts.as_slice() {
            [x, y] => (x, y, None),
            [x, y, orientation] => (x, y, Some(Orientation::parse(orientation)?)),
            _ => return None,
        };
        let point = Point::new(x.parse().ok()?, y.parse().ok()?);
        return Some((Location::Point(point), orientation));
    }
    raw.parse().ok().map(|slot| (Location::Slot(slot), None))
}

/// `[1, 2]`, `[[x, y], [x, y, up]]` or `[]`.
#[must_use]
pub fn parse_item_list(raw: &str) -> Option<Vec<(Location, Option<Orientation>)>> {
    let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    if inner.starts_with('[') {
        inner
            .split("],")
            .map(|part| {
                let part = part.trim();
                if part.ends_with(']') {
                    parse_item(part)
                } else {
                    parse_item(&format!("{part}]"))
                }
            })
            .collect()
    } else {
        inner
            .split(',')
            .map(|part| part.trim().parse().ok().map(|slot| (Location::Slot(slot), None)))
            .collect()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `content` to `path` through a sibling temp file and a rename, so
/// readers see either the previous file or the complete new one.
///
/// Fails with [`io::ErrorKind::AlreadyExists`] when `path` exists and
/// `overwrite` is false.
pub fn write_atomic(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        )
        .into());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let temp = temp_path_for(path);
    fs::write(&temp, content)?;
    if let Err(error) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(error.into());
    }
    Ok(())
}
