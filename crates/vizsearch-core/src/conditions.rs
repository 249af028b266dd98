#![forbid(unsafe_code)]

//! Condition table: the stimulus-identity domain of the design.
//!
//! A tab-separated file with a header row. The columns `block`,
//! `targetName`, `targetPic`, `distractorName` and `distractorPic` are
//! required; any others are ignored. Stimulus names and pictures are
//! opaque tokens resolved by the presentation program.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::error::{GenerationError, Result};

pub const CONDITION_COLUMNS: [&str; 5] = [
    "block",
    "targetName",
    "targetPic",
    "distractorName",
    "distractorPic",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionRow {
    pub block: String,
    pub target_name: String,
    pub target_pic: String,
    pub distractor_name: String,
    pub distractor_pic: String,
}

/// One target/distractor pairing the builder crosses with the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusCombination {
    pub target_name: String,
    pub target_pic: String,
    pub distractor_name: String,
    pub distractor_pic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionTable {
    rows: Vec<ConditionRow>,
}

impl ConditionTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((header_line, header)) = lines.next() else {
            return Err(GenerationError::ConditionTable {
                line: 1,
                message: "table is empty".to_string(),
            });
        };
        let header: Vec<&str> = header.split('\t').map(str::trim).collect();
        let mut indices = [0usize; 5];
        for (slot, column) in indices.iter_mut().zip(CONDITION_COLUMNS) {
            *slot = header.iter().position(|name| *name == column).ok_or_else(|| {
                GenerationError::ConditionTable {
                    line: header_line,
                    message: format!("missing column {column}"),
                }
            })?;
        }

        let mut rows = Vec::new();
        for (line, raw) in lines {
            let cells: Vec<&str> = raw.split('\t').collect();
            let mut values: [String; 5] = Default::default();
            let columns = values.iter_mut().zip(&indices).zip(CONDITION_COLUMNS);
            for ((value, &index), column) in columns {
                let cell = cells.get(index).map(|cell| cell.trim()).unwrap_or_default();
                if cell.is_empty() {
                    return Err(GenerationError::ConditionTable {
                        line,
                        message: format!("empty {column}"),
                    });
                }
                *value = cell.to_string();
            }
            let [block, target_name, target_pic, distractor_name, distractor_pic] = values;
            rows.push(ConditionRow {
                block,
                target_name,
                target_pic,
                distractor_name,
                distractor_pic,
            });
        }

        if rows.is_empty() {
            return Err(GenerationError::ConditionTable {
                line: header_line,
                message: "table has a header but no rows".to_string(),
            });
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[ConditionRow] {
        &self.rows
    }

    /// Distinct block labels.
    #[must_use]
    pub fn blocks(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.block.as_str()).collect()
    }

    /// Stimulus combinations of one block, in enumeration order.
    ///
    /// Within the block: each target name; each picture of that target;
    /// each distractor paired with that target; each picture of that
    /// distractor. Every level is sorted, which fixes the order the
    /// builder consumes the random stream in.
    #[must_use]
    pub fn stimulus_combinations(&self, block: &str) -> Vec<StimulusCombination> {
        let in_block: Vec<&ConditionRow> =
            self.rows.iter().filter(|row| row.block == block).collect();

        let mut combinations = Vec::new();
        for target_name in distinct(&in_block, |row| Some(&row.target_name)) {
            let target_pics = distinct(&in_block, |row| {
                (row.target_name == target_name).then_some(&row.target_pic)
            });
            let distractor_names = distinct(&in_block, |row| {
                (row.target_name == target_name).then_some(&row.distractor_name)
            });
            for target_pic in &target_pics {
                for distractor_name in &distractor_names {
                    let distractor_pics = distinct(&in_block, |row| {
                        (row.distractor_name == *distractor_name).then_some(&row.distractor_pic)
                    });
                    for distractor_pic in distractor_pics {
                        combinations.push(StimulusCombination {
                            target_name: target_name.to_string(),
                            target_pic: target_pic.to_string(),
                            distractor_name: distractor_name.to_string(),
                            distractor_pic: distractor_pic.to_string(),
                        });
                    }
                }
            }
        }
        combinations
    }
}

/// Sorted distinct values picked from `rows`.
fn distinct<'a>(
    rows: &[&'a ConditionRow],
    pick: impl Fn(&'a ConditionRow) -> Option<&'a String>,
) -> Vec<&'a str> {
    rows.iter()
        .filter_map(|&row| pick(row))
        .map(String::as_str)
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect()
}
