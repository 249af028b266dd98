//! Experiment profiles: env-style `KEY=value` files that declare the
//! factorial design and the display geometry.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use vizsearch_core::geometry::{Region, SlotRing};
use vizsearch_core::sampler::DEFAULT_MAX_ATTEMPTS;
use vizsearch_core::{FactorSchema, Layout, Presence, SamplerConstraints};

use crate::error::{CliError, Result};

/// Ring radius in pixels when a slot profile does not set one.
pub const DEFAULT_SLOT_RADIUS: f64 = 200.0;

#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: String,
    pub values: BTreeMap<String, String>,
}

impl Profile {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    fn parse_value<T: FromStr>(&self, key: &str, raw: &str) -> Result<T> {
        raw.trim().parse::<T>().map_err(|_| {
            CliError::invalid(format!("profile {}: invalid {key} value {raw:?}", self.name))
        })
    }

    fn require<T: FromStr>(&self, key: &str) -> Result<T> {
        let raw = self.get(key).ok_or_else(|| {
            CliError::invalid(format!("profile {}: missing {key}", self.name))
        })?;
        self.parse_value(key, raw)
    }

    fn optional<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            Some(raw) => self.parse_value(key, raw),
            None => Ok(default),
        }
    }

    fn list<T: FromStr>(&self, key: &str) -> Result<Vec<T>> {
        let raw = self.get(key).ok_or_else(|| {
            CliError::invalid(format!("profile {}: missing {key}", self.name))
        })?;
        raw.split(',')
            .filter(|item| !item.trim().is_empty())
            .map(|item| self.parse_value(key, item))
            .collect()
    }

    /// `none`, empty or absent means no quadrant cap.
    fn quadrant_cap(&self) -> Result<Option<usize>> {
        match self.get("max_per_quad").map(str::trim) {
            None | Some("" | "none") => Ok(None),
            Some(raw) => self.parse_value("max_per_quad", raw).map(Some),
        }
    }

    /// Build the factor schema this profile declares.
    pub fn to_schema(&self) -> Result<FactorSchema> {
        let layout = match self.get("layout").map(str::trim).unwrap_or("slots") {
            "slots" => Layout::Slots {
                num_positions: self.optional("num_positions", 12usize)?,
            },
            "scattered" => {
                let half_width: f64 = self.require("allowed_deg_from_fix")?;
                let region = Region::centered_square(half_width).ok_or_else(|| {
                    CliError::invalid(format!(
                        "profile {}: allowed_deg_from_fix must be positive",
                        self.name
                    ))
                })?;
                let constraints = SamplerConstraints::new(region, self.require("min_distance")?)?
                    .with_max_per_quadrant(self.quadrant_cap()?)
                    .with_max_attempts(self.optional("max_attempts", DEFAULT_MAX_ATTEMPTS)?);
                Layout::Scattered(constraints)
            }
            other => {
                return Err(CliError::invalid(format!(
                    "profile {}: unknown layout {other:?} (expected slots or scattered)",
                    self.name
                )));
            }
        };

        let presence = self
            .get("presence")
            .unwrap_or("present,absent")
            .split(',')
            .filter(|item| !item.trim().is_empty())
            .map(|item| {
                Presence::parse(item).ok_or_else(|| {
                    CliError::invalid(format!(
                        "profile {}: invalid presence value {item:?}",
                        self.name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let schema = FactorSchema {
            presence,
            set_sizes: self.list("set_sizes")?,
            layout,
            replications: self.optional("replications", 1usize)?,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Ring geometry for slot profiles.
    pub fn slot_ring(&self) -> Result<Option<SlotRing>> {
        match self.to_schema()?.layout {
            Layout::Slots { num_positions } => Ok(Some(SlotRing::new(
                num_positions,
                self.optional("slot_radius", DEFAULT_SLOT_RADIUS)?,
            ))),
            Layout::Scattered(_) => Ok(None),
        }
    }
}

const BLOCKED_SEARCH: &str = include_str!("../profiles/blocked-search.env");
const SCATTERED_SEARCH: &str = include_str!("../profiles/scattered-search.env");

const BUILTIN_PROFILES: [(&str, &str); 2] = [
    ("blocked-search", BLOCKED_SEARCH),
    ("scattered-search", SCATTERED_SEARCH),
];

pub const DEFAULT_PROFILE: &str = "blocked-search";

#[must_use]
pub fn list_profile_names() -> Vec<String> {
    BUILTIN_PROFILES
        .iter()
        .map(|(name, _)| (*name).to_string())
        .collect()
}

pub fn print_profiles() {
    for name in list_profile_names() {
        println!("{name}");
    }
}

pub fn load_profile(name: &str) -> Result<Profile> {
    let (_, content) = BUILTIN_PROFILES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .ok_or_else(|| CliError::ProfileNotFound {
            name: name.to_string(),
        })?;

    Ok(Profile {
        name: name.to_string(),
        values: parse_profile_content(content),
    })
}

pub fn load_profile_file(path: &Path) -> Result<Profile> {
    let content = std::fs::read_to_string(path)?;
    Ok(Profile {
        name: path.display().to_string(),
        values: parse_profile_content(&content),
    })
}

#[must_use]
pub fn parse_profile_content(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim().to_string();
        let mut value = value_raw.trim().to_string();

        if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
            value = value[1..value.len() - 1].to_string();
        }

        values.insert(key, value);
    }

    values
}

#[cfg(test)]
mod tests {
    use vizsearch_core::{Layout, Presence};

    use crate::error::CliError;

    use super::{Profile, list_profile_names, load_profile, parse_profile_content};

    fn profile(content: &str) -> Profile {
        Profile {
            name: "test".to_string(),
            values: parse_profile_content(content),
        }
    }

    #[test]
    fn parse_env_fragment() {
        let parsed = parse_profile_content(
            r#"
                # comment
                key1=value1
                key2="value 2"
                not a pair
            "#,
        );

        assert_eq!(parsed.get("key1"), Some(&"value1".to_string()));
        assert_eq!(parsed.get("key2"), Some(&"value 2".to_string()));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn builtins_listed_and_loadable() {
        let names = list_profile_names();
        assert_eq!(names, vec!["blocked-search", "scattered-search"]);
        for name in names {
            load_profile(&name)
                .expect("builtin loads")
                .to_schema()
                .expect("builtin schema is valid");
        }
    }

    #[test]
    fn blocked_search_matches_the_grid_design() {
        let schema = load_profile("blocked-search")
            .expect("profile")
            .to_schema()
            .expect("schema");
        assert_eq!(schema, vizsearch_core::FactorSchema::blocked_slots());
    }

    #[test]
    fn scattered_search_matches_the_free_design() {
        let profile = load_profile("scattered-search").expect("profile");
        let schema = profile.to_schema().expect("schema");
        assert_eq!(schema.presence, vec![Presence::Present]);
        assert_eq!(schema.set_sizes, vec![2, 6, 10, 14, 18]);
        assert_eq!(schema.replications, 2);
        let Layout::Scattered(constraints) = schema.layout else {
            panic!("expected scattered layout");
        };
        assert_eq!(constraints.region.half_width(), 6.0);
        assert_eq!(constraints.min_distance, 2.0);
        assert_eq!(constraints.max_per_quadrant, None);
        assert!(profile.slot_ring().expect("ring").is_none());
    }

    #[test]
    fn overrides_replace_profile_values() {
        let mut profile = load_profile("blocked-search").expect("profile");
        profile.set("set_sizes", "4,6");
        profile.set("replications", "2");
        let schema = profile.to_schema().expect("schema");
        assert_eq!(schema.set_sizes, vec![4, 6]);
        assert_eq!(schema.trials_per_stimulus_combination(), 2 * 2 * 12 * 2);
    }

    #[test]
    fn slot_ring_uses_profile_radius() {
        let ring = profile("layout=slots\nnum_positions=8\nslot_radius=150\nset_sizes=4")
            .slot_ring()
            .expect("ring")
            .expect("slot layout");
        assert_eq!(ring.len(), 8);
        let first = ring.position(0).expect("slot 0");
        assert!((first.norm() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_values_name_the_key() {
        let error = profile("set_sizes=4,x").to_schema().expect_err("bad list");
        assert!(error.to_string().contains("set_sizes"));

        let error = profile("layout=spiral\nset_sizes=4")
            .to_schema()
            .expect_err("bad layout");
        assert!(error.to_string().contains("spiral"));

        let error = profile("layout=scattered\nset_sizes=4\nmin_distance=2")
            .to_schema()
            .expect_err("missing half width");
        assert!(error.to_string().contains("allowed_deg_from_fix"));

        let error = profile("set_sizes=5\npresence=absent")
            .to_schema()
            .expect_err("odd absent size");
        assert!(matches!(error, CliError::Generation(_)));
    }

    #[test]
    fn load_profile_unknown_name_returns_profile_not_found() {
        match load_profile("definitely-not-a-real-profile").expect_err("unknown profile") {
            CliError::ProfileNotFound { name } => {
                assert_eq!(name, "definitely-not-a-real-profile")
            }
            other => panic!("expected ProfileNotFound error, got {other}"),
        }
    }
}
