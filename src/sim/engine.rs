//! Settlement engine that drives decisions, storage, tokens, and history per step.

use tracing::{debug, info, warn};

use super::decision::{DecisionProvider, local_allocation};
use super::error::SimError;
use super::history::HistoryRecorder;
use super::log::render_block;
use super::settlement::{SimulationState, settle};
use super::types::{DecisionSource, EconomicParams, GridPrice, HourlyRecord, StepResult};

/// Simulation engine owning the cooperative state, its inputs, and its records.
///
/// Generic over `P: DecisionProvider` for static dispatch; tests inject stub
/// providers, the binary uses [`super::decision::Provider`].
pub struct Engine<P: DecisionProvider> {
    state: SimulationState,
    params: EconomicParams,
    provider: P,
    hourly_data: Vec<HourlyRecord>,
    grid_costs: Vec<GridPrice>,
    history: HistoryRecorder,
    logs: Vec<String>,
}

impl<P: DecisionProvider> Engine<P> {
    /// Creates a new settlement engine.
    ///
    /// # Arguments
    ///
    /// * `state` - Storage pool and token ledger at the start of the run
    /// * `params` - Economic rules
    /// * `provider` - Decision provider consulted every step
    /// * `hourly_data` - Hourly feed, indexed by step
    /// * `grid_costs` - Grid tariff table, indexed cyclically by step
    pub fn new(
        state: SimulationState,
        params: EconomicParams,
        provider: P,
        hourly_data: Vec<HourlyRecord>,
        grid_costs: Vec<GridPrice>,
    ) -> Self {
        let history = HistoryRecorder::new(state.pool.units().iter().map(|u| u.name.as_str()));
        Self {
            state,
            params,
            provider,
            hourly_data,
            grid_costs,
            history,
            logs: Vec::new(),
        }
    }

    /// Checks that `steps` steps can run without hitting bad or missing input.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimError`] found.
    pub fn validate(&self, steps: usize) -> Result<(), SimError> {
        if steps == 0 {
            return Ok(());
        }
        if self.hourly_data.len() < steps {
            return Err(SimError::InsufficientHourlyData {
                steps,
                available: self.hourly_data.len(),
            });
        }
        if self.grid_costs.is_empty() {
            return Err(SimError::EmptyGridPrices);
        }

        for (step, record) in self.hourly_data[..steps].iter().enumerate() {
            for (field, value) in [
                ("consumption", record.consumption),
                ("production", record.production),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SimError::InvalidHourlyRecord {
                        step,
                        reason: format!("{field} must be a finite value >= 0, got {value}"),
                    });
                }
            }
            if self.state.pool.is_empty() && record.production > record.consumption {
                return Err(SimError::NoStorageForSurplus { step });
            }
        }

        for (index, price) in self.grid_costs.iter().enumerate() {
            for (field, value) in [("purchase", price.purchase), ("sale", price.sale)] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SimError::InvalidGridPrice {
                        index,
                        reason: format!("{field} must be a finite value >= 0, got {value}"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Grid price in effect at `step`; the table wraps around.
    ///
    /// Returns `None` only when the table is empty.
    pub fn grid_price_at(&self, step: usize) -> Option<GridPrice> {
        if self.grid_costs.is_empty() {
            return None;
        }
        Some(self.grid_costs[step % self.grid_costs.len()])
    }

    /// Settles one step and appends it to history and the log.
    ///
    /// # Errors
    ///
    /// Returns an error when the hourly record for `step` is missing or the
    /// grid price table is empty. Nothing is mutated in that case.
    pub fn step(&mut self, step: usize) -> Result<StepResult, SimError> {
        // 1. Inputs
        let record = self.hourly_data.get(step).cloned().ok_or(
            SimError::InsufficientHourlyData {
                steps: step + 1,
                available: self.hourly_data.len(),
            },
        )?;
        let price = self.grid_price_at(step).ok_or(SimError::EmptyGridPrices)?;

        // 2. Decision
        let input = self.state.decision_input(&record, price, &self.params);
        let (decision, decision_source) = match self.provider.decide(&input) {
            Ok(decision) => (decision, DecisionSource::Provider),
            Err(error) => {
                warn!(step, provider = self.provider.name(), %error, "decision failed, using local heuristic");
                (local_allocation(&input), DecisionSource::Fallback)
            }
        };
        let decision = decision.normalized();

        // 3-4. Storage and tokens
        let settlement = settle(&mut self.state, &record, &decision, price, &self.params);

        // 5. Record
        let result = StepResult {
            step,
            hour: record.hour,
            date: record.date,
            consumption: record.consumption,
            production: record.production,
            energy_surplus: input.energy_surplus(),
            energy_deficit: input.energy_deficit(),
            decision,
            decision_source,
            energy_stored: settlement.energy_stored,
            energy_drawn: settlement.energy_drawn,
            grid_purchase_applied: settlement.grid_purchase_applied,
            p2p_price: self.params.p2p_base_price,
            grid_purchase_price: price.purchase,
            grid_sale_price: price.sale,
            tokens: settlement.tokens,
            token_balance: self.state.ledger.community_balance(),
            storage_levels: self
                .state
                .pool
                .units()
                .iter()
                .map(|u| (u.name.clone(), u.current_level()))
                .collect(),
        };
        self.history.record(&result);
        self.logs.push(render_block(&result));

        debug!(
            step,
            balance = result.token_balance,
            grid_kwh = result.grid_purchase_applied,
            source = %result.decision_source,
            "step settled"
        );
        Ok(result)
    }

    /// Validates inputs, then settles steps `0..steps` in order.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] before any step runs if the inputs cannot
    /// support `steps` steps.
    pub fn simulate(&mut self, steps: usize) -> Result<Vec<StepResult>, SimError> {
        self.validate(steps)?;
        info!(
            steps,
            storages = self.state.pool.units().len(),
            provider = self.provider.name(),
            balance = self.state.ledger.community_balance(),
            "starting simulation"
        );

        let mut results = Vec::with_capacity(steps);
        for step in 0..steps {
            results.push(self.step(step)?);
        }

        info!(
            steps,
            balance = self.state.ledger.community_balance(),
            fallbacks = self.fallback_count(),
            "simulation finished"
        );
        Ok(results)
    }

    /// Number of recorded steps settled with the local fallback.
    pub fn fallback_count(&self) -> usize {
        self.history
            .decision_source
            .iter()
            .filter(|s| **s == DecisionSource::Fallback)
            .count()
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    /// Log blocks, one per settled step.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn params(&self) -> &EconomicParams {
        &self.params
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
