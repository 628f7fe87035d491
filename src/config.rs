//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::sim::types::{EconomicParams, SettlementBasis};

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the `demo` preset. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use [`ScenarioConfig::demo`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation horizon and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Storage units and opening token balance.
    #[serde(default)]
    pub cooperative: CooperativeConfig,
    /// Token economics.
    #[serde(default)]
    pub economics: EconomicsConfig,
    /// Decision provider selection.
    #[serde(default)]
    pub decision: DecisionConfig,
    /// External data files.
    #[serde(default)]
    pub data: DataConfig,
    /// Synthetic hourly profile, used when no hourly CSV is given.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Simulation horizon and seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of hourly steps to settle (must be > 0).
    pub steps: usize,
    /// Seed for the synthetic hourly profile.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 48,
            seed: 42,
        }
    }
}

/// One storage unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Unique storage name.
    pub name: String,
    /// Capacity (kWh).
    pub capacity: f64,
    /// Starting level (kWh).
    #[serde(default)]
    pub initial_level: f64,
}

impl StorageConfig {
    fn new(name: &str, capacity: f64, initial_level: f64) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            initial_level,
        }
    }
}

/// Storage units (in priority order) and the opening token balance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CooperativeConfig {
    /// Opening community token balance.
    pub initial_token_balance: f64,
    /// Storage units; the first listed is charged and drained first. May be
    /// empty when no hour has surplus.
    pub storages: Vec<StorageConfig>,
}

impl Default for CooperativeConfig {
    fn default() -> Self {
        Self {
            initial_token_balance: 100.0,
            storages: vec![
                StorageConfig::new("community_a", 20.0, 5.0),
                StorageConfig::new("community_b", 10.0, 0.0),
            ],
        }
    }
}

/// Token economics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsConfig {
    /// Internal P2P price per kWh.
    pub p2p_base_price: f64,
    /// Tokens minted per self-consumed kWh.
    pub token_mint_rate: f64,
    /// Tokens burned per kWh bought from the grid, on top of its cost.
    pub token_burn_rate: f64,
    /// `"requested"` or `"applied"`.
    pub settlement_basis: SettlementBasis,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            p2p_base_price: 0.55,
            token_mint_rate: 0.1,
            token_burn_rate: 0.05,
            settlement_basis: SettlementBasis::Requested,
        }
    }
}

/// Decision provider kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Local,
    Remote,
}

/// Decision provider selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecisionConfig {
    /// `"local"` or `"remote"`.
    pub provider: ProviderKind,
    /// Remote decision endpoint URL (required for `remote`).
    pub endpoint: Option<String>,
    /// Remote request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Local,
            endpoint: None,
            timeout_ms: 2_000,
        }
    }
}

/// External data files; relative paths resolve against the working directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Hourly CSV with `hour,date,consumption,production` columns.
    pub hourly: Option<PathBuf>,
    /// Grid price CSV with `purchase,sale` columns.
    pub grid_prices: Option<PathBuf>,
}

/// Synthetic hourly profile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Mean hourly consumption (kWh).
    pub base_consumption_kwh: f64,
    /// Daily consumption swing amplitude (kWh).
    pub consumption_amp_kwh: f64,
    /// Production at solar noon (kWh).
    pub peak_production_kwh: f64,
    /// First producing hour (inclusive).
    pub sunrise_hour: u32,
    /// Last producing hour (exclusive).
    pub sunset_hour: u32,
    /// Gaussian noise standard deviation, relative to the clean value.
    pub noise_std: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_consumption_kwh: 4.0,
            consumption_amp_kwh: 2.0,
            peak_production_kwh: 9.0,
            sunrise_hour: 6,
            sunset_hour: 20,
            noise_std: 0.1,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.steps"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the demo scenario: two storages, balanced sunny days.
    pub fn demo() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            cooperative: CooperativeConfig::default(),
            economics: EconomicsConfig::default(),
            decision: DecisionConfig::default(),
            data: DataConfig::default(),
            profile: ProfileConfig::default(),
        }
    }

    /// Returns the sunny preset: strong production that saturates storage.
    pub fn sunny() -> Self {
        Self {
            profile: ProfileConfig {
                peak_production_kwh: 16.0,
                sunrise_hour: 5,
                sunset_hour: 21,
                ..ProfileConfig::default()
            },
            cooperative: CooperativeConfig {
                storages: vec![
                    StorageConfig::new("community_a", 15.0, 0.0),
                    StorageConfig::new("community_b", 15.0, 0.0),
                    StorageConfig::new("school_roof", 8.0, 0.0),
                ],
                ..CooperativeConfig::default()
            },
            ..Self::demo()
        }
    }

    /// Returns the lean preset: small balance and weak production, so grid
    /// purchases run into insolvency.
    pub fn lean() -> Self {
        Self {
            cooperative: CooperativeConfig {
                initial_token_balance: 5.0,
                storages: vec![StorageConfig::new("community_a", 6.0, 2.0)],
            },
            economics: EconomicsConfig {
                token_burn_rate: 0.1,
                ..EconomicsConfig::default()
            },
            profile: ProfileConfig {
                base_consumption_kwh: 6.0,
                peak_production_kwh: 4.0,
                ..ProfileConfig::default()
            },
            ..Self::demo()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["demo", "sunny", "lean"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "demo" => Ok(Self::demo()),
            "sunny" => Ok(Self::sunny()),
            "lean" => Ok(Self::lean()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Economic rules for the engine.
    pub fn economic_params(&self) -> EconomicParams {
        let e = &self.economics;
        EconomicParams::new(e.p2p_base_price, e.token_mint_rate, e.token_burn_rate)
            .with_basis(e.settlement_basis)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.steps == 0 {
            errors.push(ConfigError::new("simulation.steps", "must be > 0"));
        }

        let coop = &self.cooperative;
        if !coop.initial_token_balance.is_finite() || coop.initial_token_balance < 0.0 {
            errors.push(ConfigError::new(
                "cooperative.initial_token_balance",
                "must be >= 0",
            ));
        }
        let mut names = HashSet::new();
        for (i, s) in coop.storages.iter().enumerate() {
            let field = format!("cooperative.storages[{i}]");
            if s.name.trim().is_empty() {
                errors.push(ConfigError::new(format!("{field}.name"), "must not be empty"));
            } else if !names.insert(s.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("{field}.name"),
                    format!("duplicate storage name \"{}\"", s.name),
                ));
            }
            if !(s.capacity.is_finite() && s.capacity > 0.0) {
                errors.push(ConfigError::new(format!("{field}.capacity"), "must be > 0"));
            } else if !(0.0..=s.capacity).contains(&s.initial_level) {
                errors.push(ConfigError::new(
                    format!("{field}.initial_level"),
                    "must be in [0, capacity]",
                ));
            }
        }

        let e = &self.economics;
        for (field, value) in [
            ("economics.p2p_base_price", e.p2p_base_price),
            ("economics.token_mint_rate", e.token_mint_rate),
            ("economics.token_burn_rate", e.token_burn_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        let d = &self.decision;
        if d.provider == ProviderKind::Remote {
            match d.endpoint.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(url) => errors.push(ConfigError::new(
                    "decision.endpoint",
                    format!("must be an http(s) URL, got \"{url}\""),
                )),
                None => errors.push(ConfigError::new(
                    "decision.endpoint",
                    "required when decision.provider is \"remote\"",
                )),
            }
            if d.timeout_ms == 0 {
                errors.push(ConfigError::new("decision.timeout_ms", "must be > 0"));
            }
        }

        let p = &self.profile;
        if p.sunrise_hour >= p.sunset_hour || p.sunset_hour > 24 {
            errors.push(ConfigError::new(
                "profile.sunrise_hour",
                "must be < profile.sunset_hour <= 24",
            ));
        }
        for (field, value) in [
            ("profile.base_consumption_kwh", p.base_consumption_kwh),
            ("profile.consumption_amp_kwh", p.consumption_amp_kwh),
            ("profile.peak_production_kwh", p.peak_production_kwh),
            ("profile.noise_std", p.noise_std),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        errors
    }
}
