//! Per-step state transition: apply a decision to storage and tokens.

use tracing::warn;

use crate::ledger::TokenLedger;
use crate::storage::StoragePool;

use super::types::{
    DecisionInput, DecisionOutput, EconomicParams, GridPrice, HourlyRecord, SettlementBasis,
    TokenFlows,
};

/// Mutable cooperative state carried from one step to the next.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub pool: StoragePool,
    pub ledger: TokenLedger,
}

impl SimulationState {
    /// Builds the state, registering an informational ledger entry per storage.
    pub fn new(pool: StoragePool, initial_balance: f64) -> Self {
        let ledger = TokenLedger::with_storages(
            initial_balance,
            pool.units().iter().map(|u| u.name.as_str()),
        );
        Self { pool, ledger }
    }

    /// Snapshot for a decision provider at the current state.
    pub fn decision_input(
        &self,
        record: &HourlyRecord,
        price: GridPrice,
        params: &EconomicParams,
    ) -> DecisionInput {
        DecisionInput {
            hour: record.hour,
            production: record.production,
            consumption: record.consumption,
            storage_levels: self.pool.levels(),
            grid_purchase_price: price.purchase,
            grid_sale_price: price.sale,
            p2p_base_price: params.p2p_base_price,
            token_balance: self.ledger.community_balance(),
        }
    }
}

/// What a settled step actually moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Energy absorbed by the pool (kWh).
    pub energy_stored: f64,
    /// Energy released by the pool (kWh).
    pub energy_drawn: f64,
    /// Grid energy obtained after insolvency handling (kWh).
    pub grid_purchase_applied: f64,
    pub tokens: TokenFlows,
}

/// Applies a normalized decision to `state`.
///
/// Storage is charged before it is discharged. Tokens then move in a fixed
/// order, each step adjusting the balance left by the previous one:
/// self-consumption reward, P2P reward, grid sale, storage draw burn, grid
/// purchase. The grid purchase may be cut down when the balance cannot pay
/// for it.
pub fn settle(
    state: &mut SimulationState,
    record: &HourlyRecord,
    decision: &DecisionOutput,
    price: GridPrice,
    params: &EconomicParams,
) -> Settlement {
    let energy_stored = state.pool.charge_across(decision.energy_added_to_storage);
    let energy_drawn = state
        .pool
        .discharge_across(decision.energy_bought_from_storages);

    let (stored_basis, drawn_basis) = match params.settlement_basis {
        SettlementBasis::Requested => (
            decision.energy_added_to_storage,
            decision.energy_bought_from_storages,
        ),
        SettlementBasis::Applied => (energy_stored, energy_drawn),
    };

    let ledger = &mut state.ledger;
    let self_consumed = record.consumption.min(record.production);
    let self_consumption_reward = ledger.mint(self_consumed * params.token_mint_rate);
    let p2p_reward = ledger.mint(stored_basis * params.p2p_base_price);
    let grid_sale_reward = ledger.mint(decision.energy_sold_to_grid * price.sale);
    let storage_draw_burn = ledger.burn(drawn_basis * params.p2p_base_price);
    let purchase = ledger.burn_for_purchase(
        decision.energy_bought_from_grid,
        price.purchase,
        params.token_burn_rate,
    );

    if purchase.energy < decision.energy_bought_from_grid {
        warn!(
            requested_kwh = decision.energy_bought_from_grid,
            affordable_kwh = purchase.energy,
            "insufficient tokens for grid purchase"
        );
    }

    Settlement {
        energy_stored,
        energy_drawn,
        grid_purchase_applied: purchase.energy,
        tokens: TokenFlows {
            self_consumption_reward,
            p2p_reward,
            grid_sale_reward,
            storage_draw_burn,
            grid_purchase_spent: purchase.tokens_spent,
            grid_purchase_fee: purchase.tokens_burned,
        },
    }
}
