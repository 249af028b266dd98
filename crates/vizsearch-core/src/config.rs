#![forbid(unsafe_code)]

//! Run-time configuration supplied by the experimenter.
//!
//! Fields are kept as ordered `(name, value)` pairs: every trial row
//! repeats them in this order, ahead of the trial columns.

use crate::conditions::ConditionTable;
use crate::error::{GenerationError, Result};
use crate::rng::Seed;

pub const SUBJECT_FIELD: &str = "subjCode";
pub const SEED_FIELD: &str = "seed";
pub const LANG_FIELD: &str = "lang";
pub const BLOCK_ORDER_FIELD: &str = "blockOrder";

/// Placeholder left in a dropdown the experimenter never answered.
pub const UNANSWERED: &str = "Choose";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    fields: Vec<(String, String)>,
}

/// A configuration that passed [`RunConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRun {
    pub subject: String,
    pub seed: Seed,
    pub block_order: Vec<String>,
}

impl RunConfig {
    /// Configuration with the four required fields, in canonical order.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        seed: impl Into<String>,
        lang: impl Into<String>,
        block_order: impl Into<String>,
    ) -> Self {
        Self {
            fields: vec![
                (SUBJECT_FIELD.to_string(), subject.into()),
                (SEED_FIELD.to_string(), seed.into()),
                (LANG_FIELD.to_string(), lang.into()),
                (BLOCK_ORDER_FIELD.to_string(), block_order.into()),
            ],
        }
    }

    /// Configuration from explicit pairs; the order is kept as given.
    #[must_use]
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Replace an existing field or append a new one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// Check required fields, the seed and the block order.
    ///
    /// Checks run in a fixed order so the first problem reported is
    /// stable: subject code, field names and values, seed, block order.
    pub fn validate(&self) -> Result<ValidatedRun> {
        let subject = self.get(SUBJECT_FIELD).unwrap_or_default();
        if subject.trim().is_empty() {
            return Err(GenerationError::invalid_config(
                "please provide a new subject code",
            ));
        }

        for (i, (name, value)) in self.fields.iter().enumerate() {
            if name.trim().is_empty() || has_delimiter(name) {
                return Err(GenerationError::invalid_config(format!(
                    "field name {name:?} must be non-empty and free of tabs and newlines"
                )));
            }
            if self.fields[..i].iter().any(|(earlier, _)| earlier == name) {
                return Err(GenerationError::invalid_config(format!(
                    "field {name} is set twice"
                )));
            }
            if has_delimiter(value) {
                return Err(GenerationError::invalid_config(format!(
                    "value of {name} must not contain tabs or newlines"
                )));
            }
            if value == UNANSWERED {
                return Err(GenerationError::invalid_config(format!(
                    "need to choose a value for {name}"
                )));
            }
        }

        let seed_raw = self
            .get(SEED_FIELD)
            .ok_or_else(|| GenerationError::invalid_config("missing seed"))?;
        let seed = Seed::parse(seed_raw)?;

        let block_order = parse_block_order(self.get(BLOCK_ORDER_FIELD).unwrap_or_default())?;

        Ok(ValidatedRun {
            subject: subject.to_string(),
            seed,
            block_order,
        })
    }
}

fn has_delimiter(text: &str) -> bool {
    text.contains(['\t', '\n', '\r'])
}

/// Split a block order into labels.
///
/// Comma-separated labels are used as given; otherwise every character is
/// one block, so `LR` means block `L` then block `R`.
pub fn parse_block_order(raw: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = if raw.contains(',') {
        raw.split(',').map(|label| label.trim().to_string()).collect()
    } else {
        raw.trim().chars().map(String::from).collect()
    };

    if labels.is_empty() {
        return Err(GenerationError::invalid_config("block order is empty"));
    }
    for (i, label) in labels.iter().enumerate() {
        if label.is_empty() {
            return Err(GenerationError::invalid_config(format!(
                "block order {raw:?} contains an empty label"
            )));
        }
        if labels[..i].contains(label) {
            return Err(GenerationError::invalid_config(format!(
                "block order lists block {label} twice"
            )));
        }
    }
    Ok(labels)
}

/// Fail unless `block_order` names exactly the blocks of `table`.
pub fn check_blocks(block_order: &[String], table: &ConditionTable) -> Result<()> {
    let available = table.blocks();
    let matches = block_order.len() == available.len()
        && block_order
            .iter()
            .all(|label| available.contains(label.as_str()));
    if matches {
        Ok(())
    } else {
        Err(GenerationError::ConfigurationMismatch {
            requested: block_order.to_vec(),
            available: available.into_iter().map(str::to_string).collect(),
        })
    }
}
