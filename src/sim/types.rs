//! Core settlement types: inputs, decisions, economic parameters, and step records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::pool::StorageLevel;

/// One entry of the hourly data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Calendar date label, carried through to logs.
    pub date: String,
    /// Community consumption (kWh, >= 0).
    pub consumption: f64,
    /// Community renewable production (kWh, >= 0).
    pub production: f64,
}

/// One entry of the grid tariff table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPrice {
    /// Price paid to buy from the grid (per kWh).
    pub purchase: f64,
    /// Price received when selling to the grid (per kWh).
    pub sale: f64,
}

/// Which decision amounts drive token accounting for storage flows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementBasis {
    /// Mint/burn on the amounts the provider asked for, even when storage
    /// could not absorb or deliver all of it.
    #[default]
    Requested,
    /// Mint/burn on the energy the storage pool actually moved.
    Applied,
}

/// Economic rules applied at every step.
///
/// # Examples
///
/// ```
/// use coop_sim::sim::types::{EconomicParams, SettlementBasis};
///
/// let params = EconomicParams::new(0.5, 0.1, 0.05);
/// assert_eq!(params.settlement_basis, SettlementBasis::Requested);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct EconomicParams {
    /// Internal community price for storage transactions (per kWh).
    pub p2p_base_price: f64,
    /// Tokens minted per kWh of self-consumed renewable energy.
    pub token_mint_rate: f64,
    /// Tokens burned per kWh bought from the grid, on top of its cost.
    pub token_burn_rate: f64,
    /// Amount basis for storage-related mint and burn.
    pub settlement_basis: SettlementBasis,
}

impl EconomicParams {
    pub fn new(p2p_base_price: f64, token_mint_rate: f64, token_burn_rate: f64) -> Self {
        Self {
            p2p_base_price,
            token_mint_rate,
            token_burn_rate,
            settlement_basis: SettlementBasis::Requested,
        }
    }

    /// Returns a copy using the given settlement basis.
    pub fn with_basis(mut self, basis: SettlementBasis) -> Self {
        self.settlement_basis = basis;
        self
    }
}

/// Snapshot handed to a decision provider; also the remote request body.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionInput {
    pub hour: u32,
    /// Production this hour (kWh).
    pub production: f64,
    /// Consumption this hour (kWh).
    pub consumption: f64,
    /// Storage levels keyed by storage name.
    pub storage_levels: BTreeMap<String, StorageLevel>,
    pub grid_purchase_price: f64,
    pub grid_sale_price: f64,
    pub p2p_base_price: f64,
    /// Community token balance before settlement.
    pub token_balance: f64,
}

impl DecisionInput {
    /// Surplus energy available this hour (kWh, >= 0).
    pub fn energy_surplus(&self) -> f64 {
        (self.production - self.consumption).max(0.0)
    }

    /// Unmet demand before any allocation (kWh, >= 0).
    pub fn energy_deficit(&self) -> f64 {
        (self.consumption - self.production).max(0.0)
    }
}

/// Allocation decided for one step; also the remote response body.
///
/// Missing fields deserialize as `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionOutput {
    pub energy_added_to_storage: f64,
    pub energy_sold_to_grid: f64,
    pub energy_bought_from_storages: f64,
    pub energy_bought_from_grid: f64,
}

impl DecisionOutput {
    /// Replaces negative and non-finite amounts with `0.0`.
    pub fn normalized(self) -> Self {
        fn clean(value: f64) -> f64 {
            if value.is_finite() { value.max(0.0) } else { 0.0 }
        }
        Self {
            energy_added_to_storage: clean(self.energy_added_to_storage),
            energy_sold_to_grid: clean(self.energy_sold_to_grid),
            energy_bought_from_storages: clean(self.energy_bought_from_storages),
            energy_bought_from_grid: clean(self.energy_bought_from_grid),
        }
    }
}

/// Origin of the decision applied at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    /// The configured provider answered.
    Provider,
    /// The provider failed and the local heuristic stood in.
    Fallback,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider => f.write_str("provider"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Token movements of one step, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenFlows {
    /// Reward for self-consumed renewable energy.
    pub self_consumption_reward: f64,
    /// Reward for energy placed into community storage.
    pub p2p_reward: f64,
    /// Tokens gained by selling to the grid.
    pub grid_sale_reward: f64,
    /// Tokens burned for energy drawn from community storage.
    pub storage_draw_burn: f64,
    /// Grid purchase settlement.
    pub grid_purchase_spent: f64,
    /// Fee burned on top of the grid purchase.
    pub grid_purchase_fee: f64,
}

impl TokenFlows {
    pub fn minted(&self) -> f64 {
        self.self_consumption_reward + self.p2p_reward + self.grid_sale_reward
    }

    pub fn burned(&self) -> f64 {
        self.storage_draw_burn + self.grid_purchase_spent + self.grid_purchase_fee
    }
}

/// Complete record of one settled step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: usize,
    pub hour: u32,
    pub date: String,
    pub consumption: f64,
    pub production: f64,
    /// `max(0, production - consumption)` (kWh).
    pub energy_surplus: f64,
    /// `max(0, consumption - production)` (kWh).
    pub energy_deficit: f64,
    /// Normalized decision as requested by the provider.
    pub decision: DecisionOutput,
    pub decision_source: DecisionSource,
    /// Energy the pool actually absorbed (kWh).
    pub energy_stored: f64,
    /// Energy the pool actually released (kWh).
    pub energy_drawn: f64,
    /// Grid purchase after insolvency handling (kWh).
    pub grid_purchase_applied: f64,
    pub p2p_price: f64,
    pub grid_purchase_price: f64,
    pub grid_sale_price: f64,
    pub tokens: TokenFlows,
    /// Community balance after settlement.
    pub token_balance: f64,
    /// Storage levels after settlement, in pool order.
    pub storage_levels: Vec<(String, f64)>,
}

impl StepResult {
    /// Requested grid energy the balance could not pay for (kWh).
    pub fn unmet_demand(&self) -> f64 {
        (self.decision.energy_bought_from_grid - self.grid_purchase_applied).max(0.0)
    }

    pub fn tokens_gained_from_grid(&self) -> f64 {
        self.tokens.grid_sale_reward
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step={:>3} (h{:>2}) | cons={:>6.2}  prod={:>6.2} kWh | \
             store={:.2}  sell={:.2}  draw={:.2}  grid={:.2}/{:.2} kWh | \
             +{:.2} -{:.2} CT  bal={:.2} CT [{}]",
            self.step,
            self.hour,
            self.consumption,
            self.production,
            self.decision.energy_added_to_storage,
            self.decision.energy_sold_to_grid,
            self.decision.energy_bought_from_storages,
            self.grid_purchase_applied,
            self.decision.energy_bought_from_grid,
            self.tokens.minted(),
            self.tokens.burned(),
            self.token_balance,
            self.decision_source,
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_step(step: usize) -> StepResult {
        StepResult {
            step,
            hour: (step % 24) as u32,
            date: "2024-06-01".to_string(),
            consumption: 3.0,
            production: 5.0,
            energy_surplus: 2.0,
            energy_deficit: 0.0,
            decision: DecisionOutput {
                energy_added_to_storage: 1.5,
                energy_sold_to_grid: 0.5,
                ..DecisionOutput::default()
            },
            decision_source: DecisionSource::Provider,
            energy_stored: 1.5,
            energy_drawn: 0.0,
            grid_purchase_applied: 0.0,
            p2p_price: 0.5,
            grid_purchase_price: 0.9,
            grid_sale_price: 0.3,
            tokens: TokenFlows {
                self_consumption_reward: 0.3,
                p2p_reward: 0.75,
                grid_sale_reward: 0.15,
                storage_draw_burn: 0.0,
                grid_purchase_spent: 0.0,
                grid_purchase_fee: 0.0,
            },
            token_balance: 101.2,
            storage_levels: vec![("A".to_string(), 1.5)],
        }
    }

    #[test]
    fn normalized_clears_negative_and_nan() {
        let d = DecisionOutput {
            energy_added_to_storage: -1.0,
            energy_sold_to_grid: f64::NAN,
            energy_bought_from_storages: 2.0,
            energy_bought_from_grid: f64::INFINITY,
        }
        .normalized();
        assert_eq!(d.energy_added_to_storage, 0.0);
        assert_eq!(d.energy_sold_to_grid, 0.0);
        assert_eq!(d.energy_bought_from_storages, 2.0);
        assert_eq!(d.energy_bought_from_grid, 0.0);
    }

    #[test]
    fn decision_output_missing_fields_default_to_zero() {
        let d: DecisionOutput =
            serde_json::from_str(r#"{"energy_sold_to_grid": 1.25}"#).expect("valid json");
        assert_eq!(d.energy_sold_to_grid, 1.25);
        assert_eq!(d.energy_added_to_storage, 0.0);
        assert_eq!(d.energy_bought_from_grid, 0.0);
    }

    #[test]
    fn decision_input_serializes_wire_fields() {
        let input = DecisionInput {
            hour: 7,
            production: 2.0,
            consumption: 3.5,
            storage_levels: BTreeMap::from([(
                "A".to_string(),
                StorageLevel {
                    current_level: 1.0,
                    capacity: 10.0,
                },
            )]),
            grid_purchase_price: 0.9,
            grid_sale_price: 0.3,
            p2p_base_price: 0.5,
            token_balance: 40.0,
        };
        let json = serde_json::to_value(&input).expect("serializable");
        assert_eq!(json["hour"], 7);
        assert_eq!(json["storage_levels"]["A"]["capacity"], 10.0);
        assert_eq!(json["token_balance"], 40.0);
        assert_eq!(input.energy_deficit(), 1.5);
        assert_eq!(input.energy_surplus(), 0.0);
    }

    #[test]
    fn unmet_demand_is_requested_minus_applied() {
        let mut r = sample_step(0);
        r.decision.energy_bought_from_grid = 10.0;
        r.grid_purchase_applied = 5.0;
        assert_eq!(r.unmet_demand(), 5.0);
    }

    #[test]
    fn step_result_display_does_not_panic() {
        let s = format!("{}", sample_step(3));
        assert!(s.contains("step=  3"));
    }
}
