//! Assembles an engine from a scenario and runs it end to end.

use std::time::Duration;

use tracing::info;

use crate::config::{ConfigError, ProviderKind, ScenarioConfig};
use crate::io::DataError;
use crate::io::data::{default_grid_prices, load_grid_prices_csv, load_hourly_csv, synthetic_hourly};
use crate::sim::decision::{DecisionProvider, LocalHeuristic, Provider, RemotePolicy};
use crate::sim::engine::Engine;
use crate::sim::error::SimError;
use crate::sim::history::HistoryRecorder;
use crate::sim::kpi::SettlementSummary;
use crate::sim::settlement::SimulationState;
use crate::sim::types::StepResult;
use crate::storage::{StoragePool, StorageUnit};

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub steps: Vec<StepResult>,
    pub history: HistoryRecorder,
    pub logs: Vec<String>,
    pub summary: SettlementSummary,
}

/// Failure while preparing or running a scenario.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid scenario: {}", describe(.0))]
    Config(Vec<ConfigError>),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Sim(#[from] SimError),
}

fn describe(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Builds the storage pool and ledger described by the scenario.
///
/// # Panics
///
/// Panics if a storage entry fails [`ScenarioConfig::validate`].
pub fn build_state(cfg: &ScenarioConfig) -> SimulationState {
    let units = cfg
        .cooperative
        .storages
        .iter()
        .map(|s| StorageUnit::new(s.name.clone(), s.capacity, s.initial_level))
        .collect();
    SimulationState::new(
        StoragePool::new(units),
        cfg.cooperative.initial_token_balance,
    )
}

/// Builds the decision provider selected by the scenario.
///
/// A remote provider without an endpoint falls back to the local heuristic.
pub fn build_provider(cfg: &ScenarioConfig) -> Provider {
    match (cfg.decision.provider, cfg.decision.endpoint.as_deref()) {
        (ProviderKind::Remote, Some(endpoint)) => Provider::Remote(RemotePolicy::new(
            endpoint,
            Duration::from_millis(cfg.decision.timeout_ms),
        )),
        _ => Provider::Local(LocalHeuristic),
    }
}

/// Builds a ready-to-run engine, loading data files when configured and
/// falling back to the synthetic profile and default tariff otherwise.
///
/// # Errors
///
/// Returns a [`DataError`] if a configured data file cannot be read.
pub fn build_engine(cfg: &ScenarioConfig) -> Result<Engine<Provider>, DataError> {
    let hourly = match &cfg.data.hourly {
        Some(path) => load_hourly_csv(path)?,
        None => synthetic_hourly(cfg.simulation.steps, &cfg.profile, cfg.simulation.seed),
    };
    let grid = match &cfg.data.grid_prices {
        Some(path) => load_grid_prices_csv(path)?,
        None => default_grid_prices(),
    };

    Ok(Engine::new(
        build_state(cfg),
        cfg.economic_params(),
        build_provider(cfg),
        hourly,
        grid,
    ))
}

/// Validates the scenario, runs it for `simulation.steps` steps, and
/// collects history, logs, and the summary.
///
/// # Errors
///
/// Returns [`RunError::Config`] for an invalid scenario, [`RunError::Data`]
/// for unreadable inputs, and [`RunError::Sim`] when the engine rejects them.
pub fn run_scenario(cfg: &ScenarioConfig) -> Result<SimulationResult, RunError> {
    let errors = cfg.validate();
    if !errors.is_empty() {
        return Err(RunError::Config(errors));
    }

    let mut engine = build_engine(cfg)?;
    info!(
        provider = engine.provider().name(),
        storages = cfg.cooperative.storages.len(),
        "engine ready"
    );
    let steps = engine.simulate(cfg.simulation.steps)?;
    let history = engine.history().clone();

    Ok(SimulationResult {
        summary: SettlementSummary::from_history(&history),
        logs: engine.logs().to_vec(),
        history,
        steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::export::write_history_csv;

    #[test]
    fn same_scenario_and_seed_is_deterministic() {
        let mut scenario = ScenarioConfig::demo();
        scenario.simulation.steps = 24;
        scenario.simulation.seed = 777;

        let run_a = run_scenario(&scenario).expect("first run should succeed");
        let run_b = run_scenario(&scenario).expect("second run should succeed");

        let mut out_a = Vec::new();
        write_history_csv(&run_a.history, &mut out_a).expect("first export should succeed");
        let mut out_b = Vec::new();
        write_history_csv(&run_b.history, &mut out_b).expect("second export should succeed");

        assert!(!out_a.is_empty());
        assert_eq!(out_a, out_b);
        assert_eq!(run_a.logs, run_b.logs);
    }

    #[test]
    fn invalid_scenario_is_rejected_before_running() {
        let mut scenario = ScenarioConfig::demo();
        scenario.simulation.steps = 0;
        let err = run_scenario(&scenario).expect_err("zero steps should be rejected");
        assert!(matches!(err, RunError::Config(_)));
        assert!(err.to_string().contains("simulation.steps"));
    }

    #[test]
    fn missing_data_file_is_a_data_error() {
        let mut scenario = ScenarioConfig::demo();
        scenario.data.hourly = Some("/nonexistent/hourly.csv".into());
        assert!(matches!(run_scenario(&scenario), Err(RunError::Data(_))));
    }

    #[test]
    fn no_storage_runs_when_no_hour_has_surplus() {
        let mut scenario = ScenarioConfig::demo();
        scenario.cooperative.storages.clear();
        scenario.profile.peak_production_kwh = 0.0;
        let result = run_scenario(&scenario).expect("run without surplus should succeed");
        assert_eq!(result.steps.len(), 48);
        assert!(result.history.storage.is_empty());
    }

    #[test]
    fn no_storage_with_surplus_fails_in_the_engine() {
        let mut scenario = ScenarioConfig::demo();
        scenario.cooperative.storages.clear();
        assert!(scenario.validate().is_empty());
        let err = run_scenario(&scenario).expect_err("surplus without storage should fail");
        assert!(matches!(
            err,
            RunError::Sim(SimError::NoStorageForSurplus { .. })
        ));
    }

    #[test]
    fn provider_follows_config() {
        let mut scenario = ScenarioConfig::demo();
        assert_eq!(build_provider(&scenario).name(), "local");
        scenario.decision.provider = ProviderKind::Remote;
        scenario.decision.endpoint = Some("http://127.0.0.1:9/decide".to_string());
        assert_eq!(build_provider(&scenario).name(), "remote");
    }

    #[test]
    fn result_lengths_agree() {
        let result = run_scenario(&ScenarioConfig::demo()).expect("demo should run");
        assert_eq!(result.steps.len(), 48);
        assert_eq!(result.logs.len(), 48);
        assert_eq!(result.summary.steps, 48);
    }
}
