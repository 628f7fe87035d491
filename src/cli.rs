use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use coop_sim::config::{ProviderKind, ScenarioConfig};

/// Hourly energy and token settlement simulator for a renewable-energy cooperative.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (demo, sunny, lean).
    #[clap(long)]
    pub preset: Option<String>,

    /// Override the number of simulated hours.
    #[clap(long)]
    pub steps: Option<usize>,

    /// Override the synthetic profile seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Ask a remote policy at this URL for every decision.
    #[clap(long, env = "COOP_SIM_REMOTE_URL")]
    pub remote: Option<String>,

    /// Write the settlement log to this file.
    #[clap(long = "log-out")]
    pub log_out: Option<PathBuf>,

    /// Export recorded history as CSV to this file.
    #[clap(long = "history-out")]
    pub history_out: Option<PathBuf>,

    /// Start the REST API server after the simulation.
    #[cfg(feature = "api")]
    #[clap(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[clap(long, default_value = "3000")]
    pub port: u16,
}

impl Args {
    /// Resolves the scenario source and applies command-line overrides.
    pub fn scenario(&self) -> Result<ScenarioConfig> {
        let mut scenario = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)
                .with_context(|| format!("failed to load scenario {}", path.display()))?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::demo(),
        };

        if let Some(steps) = self.steps {
            scenario.simulation.steps = steps;
        }
        if let Some(seed) = self.seed {
            scenario.simulation.seed = seed;
        }
        if let Some(url) = &self.remote {
            scenario.decision.provider = ProviderKind::Remote;
            scenario.decision.endpoint = Some(url.clone());
        }
        Ok(scenario)
    }
}
