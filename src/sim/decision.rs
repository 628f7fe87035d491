//! Decision providers: the local allocation heuristic and the remote policy client.

use std::time::Duration;

use ureq::Agent;

use super::types::{DecisionInput, DecisionOutput};

/// Failure of a decision provider to produce an allocation.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// Transport failure, non-2xx status, timeout, or undecodable body.
    #[error("remote decision request failed: {0}")]
    Remote(#[from] ureq::Error),
}

/// Produces an energy allocation for one settlement step.
///
/// Implementations receive the snapshot by reference and must not keep it
/// beyond the call. An `Err` never stops a simulation: the engine settles the
/// step with [`local_allocation`] instead.
pub trait DecisionProvider {
    /// Decides the allocation for the given snapshot.
    fn decide(&mut self, input: &DecisionInput) -> Result<DecisionOutput, DecisionError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

/// Greedy allocation: storage first, grid second.
///
/// Surplus fills the pool's total headroom and the remainder is sold to the
/// grid. Deficit is drawn from the pool's total stored energy and the
/// remainder is bought from the grid.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use coop_sim::sim::decision::local_allocation;
/// use coop_sim::sim::types::DecisionInput;
///
/// let input = DecisionInput {
///     hour: 12,
///     production: 8.0,
///     consumption: 3.0,
///     storage_levels: BTreeMap::new(),
///     grid_purchase_price: 1.0,
///     grid_sale_price: 0.4,
///     p2p_base_price: 0.6,
///     token_balance: 10.0,
/// };
/// let decision = local_allocation(&input);
/// assert_eq!(decision.energy_sold_to_grid, 5.0);
/// ```
pub fn local_allocation(input: &DecisionInput) -> DecisionOutput {
    let (headroom, available) = input
        .storage_levels
        .values()
        .fold((0.0, 0.0), |(headroom, available), level| {
            (
                headroom + (level.capacity - level.current_level).max(0.0),
                available + level.current_level.max(0.0),
            )
        });

    let surplus = input.energy_surplus();
    let deficit = input.energy_deficit();

    let energy_added_to_storage = surplus.min(headroom);
    let energy_bought_from_storages = deficit.min(available);

    DecisionOutput {
        energy_added_to_storage,
        energy_sold_to_grid: surplus - energy_added_to_storage,
        energy_bought_from_storages,
        energy_bought_from_grid: deficit - energy_bought_from_storages,
    }
}

/// Deterministic provider backed by [`local_allocation`]. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHeuristic;

impl DecisionProvider for LocalHeuristic {
    fn decide(&mut self, input: &DecisionInput) -> Result<DecisionOutput, DecisionError> {
        Ok(local_allocation(input))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Client for an external decision service.
///
/// Each step POSTs the [`DecisionInput`] as JSON and expects a
/// [`DecisionOutput`] JSON object back. Requests are bounded by a global
/// timeout and never retried.
#[derive(Debug, Clone)]
pub struct RemotePolicy {
    agent: Agent,
    endpoint: String,
}

impl RemotePolicy {
    /// Creates a client for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DecisionProvider for RemotePolicy {
    fn decide(&mut self, input: &DecisionInput) -> Result<DecisionOutput, DecisionError> {
        let decision = self
            .agent
            .post(&self.endpoint)
            .send_json(input)?
            .body_mut()
            .read_json::<DecisionOutput>()?;
        Ok(decision)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Provider selected at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Provider {
    Local(LocalHeuristic),
    Remote(RemotePolicy),
}

impl DecisionProvider for Provider {
    fn decide(&mut self, input: &DecisionInput) -> Result<DecisionOutput, DecisionError> {
        match self {
            Self::Local(p) => p.decide(input),
            Self::Remote(p) => p.decide(input),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Local(p) => p.name(),
            Self::Remote(p) => p.name(),
        }
    }
}
