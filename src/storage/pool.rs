use std::collections::BTreeMap;

use serde::Serialize;

use super::unit::StorageUnit;

/// Level and capacity of one storage unit, as exposed to decision providers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageLevel {
    /// Stored energy (kWh).
    pub current_level: f64,
    /// Maximum stored energy (kWh).
    pub capacity: f64,
}

/// An ordered collection of storage units.
///
/// Allocation is greedy in construction order: the first unit is filled and
/// drained before the second is touched. The order is part of the economic
/// contract since it decides which storages absorb surplus first.
#[derive(Debug, Clone, Default)]
pub struct StoragePool {
    units: Vec<StorageUnit>,
}

impl StoragePool {
    /// Creates a pool from units in priority order.
    pub fn new(units: Vec<StorageUnit>) -> Self {
        Self { units }
    }

    /// Returns the units in priority order.
    pub fn units(&self) -> &[StorageUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sum of all unit levels (kWh).
    pub fn total_level(&self) -> f64 {
        self.units.iter().map(StorageUnit::current_level).sum()
    }

    /// Sum of all unit headrooms (kWh).
    pub fn total_headroom(&self) -> f64 {
        self.units.iter().map(StorageUnit::headroom).sum()
    }

    /// Snapshot of every unit keyed by name.
    pub fn levels(&self) -> BTreeMap<String, StorageLevel> {
        self.units
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    StorageLevel {
                        current_level: u.current_level(),
                        capacity: u.capacity(),
                    },
                )
            })
            .collect()
    }

    /// Charges units in order until `amount` is absorbed or all are full.
    ///
    /// Returns the total energy accepted (kWh).
    pub fn charge_across(&mut self, amount: f64) -> f64 {
        let mut remaining = amount;
        let mut accepted = 0.0;
        for unit in &mut self.units {
            if remaining.is_nan() || remaining <= 0.0 {
                break;
            }
            let taken = unit.charge(remaining);
            remaining -= taken;
            accepted += taken;
        }
        accepted
    }

    /// Discharges units in order until `amount` is released or all are empty.
    ///
    /// Returns the total energy released (kWh).
    pub fn discharge_across(&mut self, amount: f64) -> f64 {
        let mut remaining = amount;
        let mut released = 0.0;
        for unit in &mut self.units {
            if remaining.is_nan() || remaining <= 0.0 {
                break;
            }
            let given = unit.discharge(remaining);
            remaining -= given;
            released += given;
        }
        released
    }
}
