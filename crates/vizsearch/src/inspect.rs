use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::debug;
use vizsearch_core::{SlotRing, TrialFile, TrialFileSummary};

use crate::error::{CliError, Result};
use crate::profile::{DEFAULT_PROFILE, Profile, load_profile, load_profile_file};
use crate::runmeta::{RunMeta, meta_path_for};
use crate::util::{OutputIntegration, ensure_exists, output_for};

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Trial file to read.
    pub file: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Include the display position of every ring slot.
    #[arg(long = "resolve-slots")]
    pub resolve_slots: bool,

    /// Profile whose geometry the file is checked against. Defaults to the
    /// profile recorded in the run metadata sidecar, if there is one.
    #[arg(long)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotPosition {
    pub slot: usize,
    pub angle_deg: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file: String,
    /// Profile the placement checks used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub config_fields: Vec<String>,
    #[serde(flatten)]
    pub summary: TrialFileSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots: Option<Vec<SlotPosition>>,
}

#[must_use]
pub fn slot_positions(ring: &SlotRing) -> Vec<SlotPosition> {
    (0..ring.len())
        .filter_map(|slot| {
            ring.position(slot).map(|point| SlotPosition {
                slot,
                angle_deg: ring.angle_deg(slot),
                x: point.x,
                y: point.y,
            })
        })
        .collect()
}

/// Profile named in the `.meta.json` sidecar next to `file`.
fn sidecar_profile(file: &Path) -> Option<Profile> {
    let meta = RunMeta::from_path(&meta_path_for(file)).ok()?;
    match load_profile(&meta.profile) {
        Ok(profile) => Some(profile),
        Err(_) => load_profile_file(Path::new(&meta.profile)).ok(),
    }
}

pub fn build_report(args: &InspectArgs) -> Result<InspectReport> {
    ensure_exists(&args.file)?;
    let file = TrialFile::from_path(&args.file)?;

    let profile = match &args.profile {
        Some(name) => Some(load_profile(name)?),
        None => sidecar_profile(&args.file),
    };
    let layout = profile
        .as_ref()
        .map(|profile| profile.to_schema().map(|schema| schema.layout))
        .transpose()?;
    if profile.is_none() {
        debug!(file = %args.file.display(), "no profile; skipping placement geometry checks");
    }

    let slots = if args.resolve_slots {
        let profile = match profile.clone() {
            Some(profile) => profile,
            None => load_profile(DEFAULT_PROFILE)?,
        };
        let ring = profile.slot_ring()?.ok_or_else(|| {
            CliError::invalid(format!("profile {} has no slot ring", profile.name))
        })?;
        Some(slot_positions(&ring))
    } else {
        None
    };

    Ok(InspectReport {
        file: args.file.display().to_string(),
        profile: profile.map(|profile| profile.name),
        config_fields: file.config_fields.clone(),
        summary: file.summarize_for(layout.as_ref()),
        slots,
    })
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let report = build_report(&args)?;

    if args.json || integration.should_emit_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let ui = output_for(&integration);
        ui.rule(Some("vizsearch inspect"));
        ui.info(&format!("{}: {} trials", report.file, report.summary.trials));
        match &report.profile {
            Some(profile) => ui.info(&format!("placement checked against profile {profile}")),
            None => ui.warning("no profile given or recorded; placement geometry not checked"),
        }
        for block in &report.summary.blocks {
            ui.info(&format!(
                "block {}: {} trials ({} present, {} absent)",
                block.label, block.trials, block.present, block.absent
            ));
        }
        for (size, count) in &report.summary.set_sizes {
            ui.info(&format!("set size {size}: {count} trials"));
        }
        for slot in report.slots.iter().flatten() {
            ui.info(&format!(
                "slot {:>2}: {:>7.2} deg  ({:>8.2}, {:>8.2})",
                slot.slot, slot.angle_deg, slot.x, slot.y
            ));
        }
        for violation in &report.summary.violations {
            ui.warning(violation);
        }
        if report.summary.is_clean() {
            ui.success("all trials satisfy the placement invariants");
        }
    }

    if report.summary.is_clean() {
        Ok(())
    } else {
        Err(CliError::exit(
            1,
            format!(
                "{} invariant violation(s) in {}",
                report.summary.violations.len(),
                report.file
            ),
        ))
    }
}
