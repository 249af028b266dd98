use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{info, warn};
use vizsearch_core::{ConditionTable, GeneratedTrials, RunConfig, generate, write_atomic};

use crate::error::{CliError, Result};
use crate::profile::{DEFAULT_PROFILE, Profile, load_profile, load_profile_file};
use crate::runmeta::{BlockCount, RunMeta, meta_path_for};
use crate::util::{
    OutputIntegration, ensure_exists, ensure_file_component, now_utc_iso, output_for,
    parse_key_value, sha256_hex,
};

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Subject code; also names the output file.
    #[arg(long)]
    pub subject: String,

    /// Integer seed. Parsed strictly: surrounding whitespace is an error.
    #[arg(long, allow_hyphen_values = true)]
    pub seed: String,

    /// Language code selecting `trialList_<lang>.txt`.
    #[arg(long)]
    pub lang: String,

    /// Block labels in presentation order, e.g. `LR` or `left,right`.
    #[arg(long = "block-order")]
    pub block_order: String,

    /// Built-in profile name (default: blocked-search).
    #[arg(long, conflicts_with = "profile_file")]
    pub profile: Option<String>,

    /// Profile file in KEY=value form.
    #[arg(long = "profile-file")]
    pub profile_file: Option<PathBuf>,

    /// Condition table; overrides `--conditions-dir`.
    #[arg(long)]
    pub conditions: Option<PathBuf>,

    #[arg(long = "conditions-dir", default_value = ".")]
    pub conditions_dir: PathBuf,

    #[arg(long = "output-dir", default_value = "trials")]
    pub output_dir: PathBuf,

    /// Extra run-time field, written as a leading column. Repeatable.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Override the profile's set sizes (comma separated).
    #[arg(long = "set-sizes")]
    pub set_sizes: Option<String>,

    /// Override the profile's replication count.
    #[arg(long)]
    pub replications: Option<usize>,

    /// Override the sampler's attempt ceiling.
    #[arg(long = "max-attempts")]
    pub max_attempts: Option<u32>,

    /// Replace an existing trial file.
    #[arg(long)]
    pub force: bool,
}

impl GenerateArgs {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::new(
            self.subject.as_str(),
            self.seed.as_str(),
            self.lang.as_str(),
            self.block_order.as_str(),
        );
        for raw in &self.vars {
            let (name, value) = parse_key_value(raw)?;
            if config.get(&name).is_some() {
                return Err(CliError::invalid(format!("field {name} given more than once")));
            }
            config.set(name, value);
        }
        Ok(config)
    }

    fn profile(&self) -> Result<Profile> {
        let mut profile = match &self.profile_file {
            Some(path) => {
                ensure_exists(path)?;
                load_profile_file(path)?
            }
            None => load_profile(self.profile.as_deref().unwrap_or(DEFAULT_PROFILE))?,
        };
        if let Some(sizes) = &self.set_sizes {
            profile.set("set_sizes", sizes.as_str());
        }
        if let Some(replications) = self.replications {
            profile.set("replications", replications.to_string());
        }
        if let Some(attempts) = self.max_attempts {
            profile.set("max_attempts", attempts.to_string());
        }
        Ok(profile)
    }

    fn conditions_path(&self) -> PathBuf {
        self.conditions
            .clone()
            .unwrap_or_else(|| self.conditions_dir.join(format!("trialList_{}.txt", self.lang)))
    }

    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_trials.txt", self.subject))
    }
}

pub fn run_generate(args: GenerateArgs) -> Result<()> {
    let integration = OutputIntegration::detect();
    let ui = output_for(&integration);
    let started_at = now_utc_iso();

    let config = args.run_config()?;
    config.validate()?;
    ensure_file_component("subject", &args.subject)?;
    ensure_file_component("lang", &args.lang)?;

    let profile = args.profile()?;
    let schema = profile.to_schema()?;

    let output = args.output_path();
    if output.exists() && !args.force {
        return Err(CliError::OutputExists { path: output });
    }

    let conditions = args.conditions_path();
    ensure_exists(&conditions)?;
    let table = ConditionTable::from_path(&conditions)?;

    ui.rule(Some("vizsearch generate"));
    ui.info(&format!("profile: {} ({})", profile.name, schema.layout.name()));
    ui.info(&format!("conditions: {}", conditions.display()));

    let generated = generate(&config, &schema, &table)?;
    let text = generated.render();
    write_atomic(&output, &text, args.force)?;

    let meta = build_meta(
        &generated,
        &profile,
        schema.layout.name(),
        &conditions,
        &output,
        &text,
        started_at,
        &integration,
    );
    if let Err(error) = meta.write_to_path(&meta_path_for(&output)) {
        warn!(output = %output.display(), "metadata write failed; removing trial file");
        let _ = fs::remove_file(&output);
        return Err(error);
    }
    info!(output = %output.display(), trials = meta.trial_count, "trial file written");

    if integration.should_emit_json() {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "output": output.display().to_string(),
                "trial_count": meta.trial_count,
                "blocks": meta.blocks,
                "sha256": meta.sha256,
            })
        );
    } else {
        for block in &meta.blocks {
            ui.info(&format!("block {}: {} trials", block.label, block.trials));
        }
        ui.success(&format!(
            "wrote {} trials to {}",
            meta.trial_count,
            output.display()
        ));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_meta(
    generated: &GeneratedTrials,
    profile: &Profile,
    layout: &str,
    conditions: &Path,
    output: &Path,
    text: &str,
    started_at: String,
    integration: &OutputIntegration,
) -> RunMeta {
    RunMeta {
        status: "ok".to_string(),
        started_at,
        finished_at: Some(now_utc_iso()),
        subject: generated.subject.clone(),
        seed: generated.seed.value(),
        profile: profile.name.clone(),
        layout: layout.to_string(),
        conditions: conditions.display().to_string(),
        output: output.display().to_string(),
        header: generated.header.clone(),
        trial_count: generated.trial_count(),
        blocks: generated
            .blocks
            .iter()
            .map(|block| BlockCount {
                label: block.label.clone(),
                trials: block.len(),
            })
            .collect(),
        draws: generated.draws,
        sha256: sha256_hex(text.as_bytes()),
        fastapi_output_mode: Some(integration.fastapi_mode.clone()),
        sqlmodel_output_mode: Some(integration.sqlmodel_mode.clone()),
    }
}
