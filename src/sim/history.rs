//! Append-only time series of every settled quantity.

use serde::Serialize;

use super::types::{DecisionSource, StepResult};

/// Parallel per-step series. Every series grows by exactly one entry per
/// recorded step, so all of them always share the same length.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryRecorder {
    pub hour: Vec<u32>,
    pub consumption: Vec<f64>,
    pub production: Vec<f64>,
    pub energy_surplus: Vec<f64>,
    pub energy_deficit: Vec<f64>,
    pub energy_added_to_storage: Vec<f64>,
    pub energy_sold_to_grid: Vec<f64>,
    pub energy_bought_from_storages: Vec<f64>,
    /// Grid energy requested by the decision (kWh).
    pub energy_bought_from_grid: Vec<f64>,
    /// Grid energy actually paid for (kWh).
    pub grid_purchase_applied: Vec<f64>,
    pub unmet_demand: Vec<f64>,
    pub p2p_price: Vec<f64>,
    pub grid_purchase_price: Vec<f64>,
    pub grid_sale_price: Vec<f64>,
    pub tokens_minted: Vec<f64>,
    pub tokens_burned: Vec<f64>,
    pub tokens_gained_from_grid: Vec<f64>,
    pub token_balance: Vec<f64>,
    pub decision_source: Vec<DecisionSource>,
    /// Level series per storage, in pool order.
    pub storage: Vec<(String, Vec<f64>)>,
}

/// One step of history, assembled across all series.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub step: usize,
    pub hour: u32,
    pub consumption: f64,
    pub production: f64,
    pub energy_surplus: f64,
    pub energy_deficit: f64,
    pub energy_added_to_storage: f64,
    pub energy_sold_to_grid: f64,
    pub energy_bought_from_storages: f64,
    pub energy_bought_from_grid: f64,
    pub grid_purchase_applied: f64,
    pub unmet_demand: f64,
    pub p2p_price: f64,
    pub grid_purchase_price: f64,
    pub grid_sale_price: f64,
    pub tokens_minted: f64,
    pub tokens_burned: f64,
    pub tokens_gained_from_grid: f64,
    pub token_balance: f64,
    pub decision_source: DecisionSource,
    pub storage_levels: Vec<(String, f64)>,
}

impl HistoryRecorder {
    /// Creates an empty recorder with one level series per storage name.
    pub fn new<'a>(storage_names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            storage: storage_names
                .into_iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect(),
            ..Self::default()
        }
    }

    /// Appends one entry to every series.
    ///
    /// # Panics
    ///
    /// Panics if `result` reports a different set of storages than the
    /// recorder was created with.
    pub fn record(&mut self, result: &StepResult) {
        assert_eq!(
            result.storage_levels.len(),
            self.storage.len(),
            "storage set changed during the run"
        );

        self.hour.push(result.hour);
        self.consumption.push(result.consumption);
        self.production.push(result.production);
        self.energy_surplus.push(result.energy_surplus);
        self.energy_deficit.push(result.energy_deficit);
        self.energy_added_to_storage
            .push(result.decision.energy_added_to_storage);
        self.energy_sold_to_grid
            .push(result.decision.energy_sold_to_grid);
        self.energy_bought_from_storages
            .push(result.decision.energy_bought_from_storages);
        self.energy_bought_from_grid
            .push(result.decision.energy_bought_from_grid);
        self.grid_purchase_applied.push(result.grid_purchase_applied);
        self.unmet_demand.push(result.unmet_demand());
        self.p2p_price.push(result.p2p_price);
        self.grid_purchase_price.push(result.grid_purchase_price);
        self.grid_sale_price.push(result.grid_sale_price);
        self.tokens_minted.push(result.tokens.minted());
        self.tokens_burned.push(result.tokens.burned());
        self.tokens_gained_from_grid
            .push(result.tokens_gained_from_grid());
        self.token_balance.push(result.token_balance);
        self.decision_source.push(result.decision_source);
        for ((_, series), (_, level)) in self.storage.iter_mut().zip(&result.storage_levels) {
            series.push(*level);
        }
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.consumption.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumption.is_empty()
    }

    /// Lengths of every series, storage series last.
    pub fn series_lengths(&self) -> Vec<usize> {
        let mut lengths = vec![
            self.hour.len(),
            self.consumption.len(),
            self.production.len(),
            self.energy_surplus.len(),
            self.energy_deficit.len(),
            self.energy_added_to_storage.len(),
            self.energy_sold_to_grid.len(),
            self.energy_bought_from_storages.len(),
            self.energy_bought_from_grid.len(),
            self.grid_purchase_applied.len(),
            self.unmet_demand.len(),
            self.p2p_price.len(),
            self.grid_purchase_price.len(),
            self.grid_sale_price.len(),
            self.tokens_minted.len(),
            self.tokens_burned.len(),
            self.tokens_gained_from_grid.len(),
            self.token_balance.len(),
            self.decision_source.len(),
        ];
        lengths.extend(self.storage.iter().map(|(_, s)| s.len()));
        lengths
    }

    /// Level series of the named storage.
    pub fn storage_levels(&self, name: &str) -> Option<&[f64]> {
        self.storage
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_slice())
    }

    /// Assembles step `step` across all series.
    pub fn row(&self, step: usize) -> Option<HistoryRow> {
        if step >= self.len() {
            return None;
        }
        Some(HistoryRow {
            step,
            hour: self.hour[step],
            consumption: self.consumption[step],
            production: self.production[step],
            energy_surplus: self.energy_surplus[step],
            energy_deficit: self.energy_deficit[step],
            energy_added_to_storage: self.energy_added_to_storage[step],
            energy_sold_to_grid: self.energy_sold_to_grid[step],
            energy_bought_from_storages: self.energy_bought_from_storages[step],
            energy_bought_from_grid: self.energy_bought_from_grid[step],
            grid_purchase_applied: self.grid_purchase_applied[step],
            unmet_demand: self.unmet_demand[step],
            p2p_price: self.p2p_price[step],
            grid_purchase_price: self.grid_purchase_price[step],
            grid_sale_price: self.grid_sale_price[step],
            tokens_minted: self.tokens_minted[step],
            tokens_burned: self.tokens_burned[step],
            tokens_gained_from_grid: self.tokens_gained_from_grid[step],
            token_balance: self.token_balance[step],
            decision_source: self.decision_source[step],
            storage_levels: self
                .storage
                .iter()
                .map(|(name, s)| (name.clone(), s[step]))
                .collect(),
        })
    }

    /// Iterates over all recorded rows in step order.
    pub fn rows(&self) -> impl Iterator<Item = HistoryRow> + '_ {
        (0..self.len()).filter_map(|step| self.row(step))
    }
}
