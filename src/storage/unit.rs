/// A single energy buffer with bounded capacity.
///
/// `StorageUnit` tracks its fill level in kWh and never lets it leave the
/// `[0, capacity]` interval. Requests beyond the available headroom or stored
/// energy are capped silently; the return value reports what was actually
/// moved.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageUnit {
    /// Unique storage identifier.
    pub name: String,

    /// Maximum stored energy in kWh (> 0).
    capacity: f64,

    /// Stored energy in kWh, always within `[0, capacity]`.
    current_level: f64,
}

impl StorageUnit {
    /// Creates a new storage unit.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique identifier
    /// * `capacity` - Maximum energy in kWh (must be > 0)
    /// * `initial_level` - Starting energy in kWh (must be within `[0, capacity]`)
    ///
    /// # Panics
    ///
    /// Panics if capacity is not positive or the initial level is out of range.
    /// Configuration validation rejects both cases before units are built.
    pub fn new(name: impl Into<String>, capacity: f64, initial_level: f64) -> Self {
        assert!(capacity > 0.0, "capacity must be > 0");
        assert!(
            (0.0..=capacity).contains(&initial_level),
            "initial level must be within [0, capacity]"
        );

        Self {
            name: name.into(),
            capacity,
            current_level: initial_level,
        }
    }

    /// Creates an empty storage unit.
    pub fn empty(name: impl Into<String>, capacity: f64) -> Self {
        Self::new(name, capacity, 0.0)
    }

    /// Maximum stored energy in kWh.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Currently stored energy in kWh.
    pub fn current_level(&self) -> f64 {
        self.current_level
    }

    /// Energy the unit can still absorb in kWh.
    pub fn headroom(&self) -> f64 {
        self.capacity - self.current_level
    }

    /// Absorbs up to `amount` kWh and returns the energy actually accepted.
    ///
    /// Non-positive and NaN requests are ignored and return 0.
    pub fn charge(&mut self, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let accepted = amount.min(self.headroom());
        self.current_level = (self.current_level + accepted).min(self.capacity);
        accepted
    }

    /// Releases up to `amount` kWh and returns the energy actually released.
    ///
    /// Non-positive and NaN requests are ignored and return 0.
    pub fn discharge(&mut self, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let released = amount.min(self.current_level);
        self.current_level = (self.current_level - released).max(0.0);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_unit() {
        let unit = StorageUnit::new("A", 10.0, 4.0);
        assert_eq!(unit.name, "A");
        assert_eq!(unit.capacity(), 10.0);
        assert_eq!(unit.current_level(), 4.0);
        assert_eq!(unit.headroom(), 6.0);
    }

    #[test]
    #[should_panic]
    fn test_invalid_capacity() {
        StorageUnit::new("A", 0.0, 0.0);
    }

    #[test]
    #[should_panic]
    fn test_initial_level_above_capacity() {
        StorageUnit::new("A", 10.0, 10.5);
    }

    #[test]
    fn test_charge_within_headroom() {
        let mut unit = StorageUnit::empty("A", 10.0);
        assert_eq!(unit.charge(3.0), 3.0);
        assert_eq!(unit.current_level(), 3.0);
    }

    #[test]
    fn test_charge_capped_by_headroom() {
        let mut unit = StorageUnit::new("A", 10.0, 8.0);
        assert_eq!(unit.charge(5.0), 2.0);
        assert_eq!(unit.current_level(), 10.0);
        assert_eq!(unit.charge(1.0), 0.0);
    }

    #[test]
    fn test_discharge_capped_by_level() {
        let mut unit = StorageUnit::new("A", 10.0, 1.5);
        assert_eq!(unit.discharge(4.0), 1.5);
        assert_eq!(unit.current_level(), 0.0);
        assert_eq!(unit.discharge(1.0), 0.0);
    }

    #[test]
    fn test_non_positive_requests_are_no_ops() {
        let mut unit = StorageUnit::new("A", 10.0, 5.0);
        assert_eq!(unit.charge(0.0), 0.0);
        assert_eq!(unit.charge(-2.0), 0.0);
        assert_eq!(unit.discharge(-2.0), 0.0);
        assert_eq!(unit.charge(f64::NAN), 0.0);
        assert_eq!(unit.current_level(), 5.0);
    }

    #[test]
    fn test_level_stays_in_bounds_over_cycles() {
        let mut unit = StorageUnit::new("A", 7.5, 2.0);
        for amount in [3.0, 9.0, 0.4, 12.0, 1.1, 6.6] {
            unit.charge(amount);
            assert!((0.0..=unit.capacity()).contains(&unit.current_level()));
            unit.discharge(amount * 0.7);
            assert!((0.0..=unit.capacity()).contains(&unit.current_level()));
        }
    }
}
