//! Post-hoc settlement summary computed from recorded history.

use std::fmt;

use serde::Serialize;

use super::history::HistoryRecorder;
use super::types::DecisionSource;

/// Aggregate indicators derived from a complete simulation run.
///
/// Computed from [`HistoryRecorder`] so reported totals always agree with the
/// exported series.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettlementSummary {
    /// Number of settled steps.
    pub steps: usize,
    pub total_consumption_kwh: f64,
    pub total_production_kwh: f64,
    pub total_surplus_kwh: f64,
    pub total_deficit_kwh: f64,
    /// Energy the decisions placed into storage (kWh, requested).
    pub stored_kwh: f64,
    /// Energy the decisions drew from storage (kWh, requested).
    pub drawn_kwh: f64,
    pub sold_to_grid_kwh: f64,
    /// Grid energy actually paid for (kWh).
    pub bought_from_grid_kwh: f64,
    /// Requested grid energy the balance could not cover (kWh).
    pub unmet_demand_kwh: f64,
    pub tokens_minted: f64,
    pub tokens_burned: f64,
    pub final_balance: f64,
    pub min_balance: f64,
    /// Steps settled by the local fallback after a provider failure.
    pub fallback_steps: usize,
    /// Share of consumption not bought from the grid (%).
    pub self_sufficiency_pct: f64,
}

impl SettlementSummary {
    /// Computes all indicators from recorded history.
    pub fn from_history(history: &HistoryRecorder) -> Self {
        if history.is_empty() {
            return Self::default();
        }

        let total_consumption_kwh: f64 = history.consumption.iter().sum();
        let bought_from_grid_kwh: f64 = history.grid_purchase_applied.iter().sum();

        let self_sufficiency_pct = if total_consumption_kwh > 0.0 {
            100.0 * (1.0 - bought_from_grid_kwh / total_consumption_kwh).clamp(0.0, 1.0)
        } else {
            100.0
        };

        Self {
            steps: history.len(),
            total_consumption_kwh,
            total_production_kwh: history.production.iter().sum(),
            total_surplus_kwh: history.energy_surplus.iter().sum(),
            total_deficit_kwh: history.energy_deficit.iter().sum(),
            stored_kwh: history.energy_added_to_storage.iter().sum(),
            drawn_kwh: history.energy_bought_from_storages.iter().sum(),
            sold_to_grid_kwh: history.energy_sold_to_grid.iter().sum(),
            bought_from_grid_kwh,
            unmet_demand_kwh: history.unmet_demand.iter().sum(),
            tokens_minted: history.tokens_minted.iter().sum(),
            tokens_burned: history.tokens_burned.iter().sum(),
            final_balance: history.token_balance.last().copied().unwrap_or_default(),
            min_balance: history
                .token_balance
                .iter()
                .copied()
                .fold(f64::INFINITY, f64::min),
            fallback_steps: history
                .decision_source
                .iter()
                .filter(|s| **s == DecisionSource::Fallback)
                .count(),
            self_sufficiency_pct,
        }
    }
}

impl fmt::Display for SettlementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Settlement Summary ({} steps) ---", self.steps)?;
        writeln!(
            f,
            "Consumption / production: {:.2} / {:.2} kWh",
            self.total_consumption_kwh, self.total_production_kwh
        )?;
        writeln!(
            f,
            "Surplus / deficit:        {:.2} / {:.2} kWh",
            self.total_surplus_kwh, self.total_deficit_kwh
        )?;
        writeln!(
            f,
            "Storage in / out:         {:.2} / {:.2} kWh",
            self.stored_kwh, self.drawn_kwh
        )?;
        writeln!(
            f,
            "Grid sold / bought:       {:.2} / {:.2} kWh (unmet {:.2} kWh)",
            self.sold_to_grid_kwh, self.bought_from_grid_kwh, self.unmet_demand_kwh
        )?;
        writeln!(
            f,
            "Tokens minted / burned:   {:.2} / {:.2} CT",
            self.tokens_minted, self.tokens_burned
        )?;
        writeln!(
            f,
            "Token balance:            {:.2} CT (min {:.2} CT)",
            self.final_balance, self.min_balance
        )?;
        writeln!(f, "Self-sufficiency:         {:.1}%", self.self_sufficiency_pct)?;
        write!(f, "Fallback decisions:       {}", self.fallback_steps)
    }
}
