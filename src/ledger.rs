//! Community token ledger with insolvency-safe mint and burn rules.

use std::collections::BTreeMap;

/// Result of settling a grid purchase against the community balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Purchase {
    /// Energy actually obtained (kWh); below the request when insolvent.
    pub energy: f64,
    /// Tokens paid for the energy itself.
    pub tokens_spent: f64,
    /// Additional tokens burned on top of the purchase cost.
    pub tokens_burned: f64,
}

impl Purchase {
    /// Total tokens removed from the balance by this purchase.
    pub fn total_tokens(&self) -> f64 {
        self.tokens_spent + self.tokens_burned
    }
}

/// The cooperative's token balances.
///
/// `community_balance` is authoritative for settlement and never goes
/// negative. Per-storage balances are informational and keep the value they
/// were opened with.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    community_balance: f64,
    storage_balances: BTreeMap<String, f64>,
}

impl TokenLedger {
    /// Opens a ledger with the given community balance (negative values clamp to 0).
    pub fn new(initial_balance: f64) -> Self {
        Self {
            community_balance: initial_balance.max(0.0),
            storage_balances: BTreeMap::new(),
        }
    }

    /// Opens a ledger and registers an informational balance per storage name.
    pub fn with_storages<'a>(
        initial_balance: f64,
        storage_names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut ledger = Self::new(initial_balance);
        for name in storage_names {
            ledger
                .storage_balances
                .insert(name.to_string(), ledger.community_balance);
        }
        ledger
    }

    pub fn community_balance(&self) -> f64 {
        self.community_balance
    }

    pub fn storage_balances(&self) -> &BTreeMap<String, f64> {
        &self.storage_balances
    }

    /// Adds `max(amount, 0)` tokens and returns the minted amount.
    pub fn mint(&mut self, amount: f64) -> f64 {
        let minted = non_negative(amount);
        self.community_balance += minted;
        minted
    }

    /// Removes up to `amount` tokens, flooring the balance at 0.
    ///
    /// Returns the tokens actually burned.
    pub fn burn(&mut self, amount: f64) -> f64 {
        let burned = non_negative(amount).min(self.community_balance);
        self.community_balance -= burned;
        burned
    }

    /// Pays for `energy` kWh at `unit_price` and burns `energy * burn_rate` on top.
    ///
    /// When the balance cannot cover `energy * unit_price`, the whole balance
    /// buys `balance / unit_price` kWh, no fee is burned and the balance ends
    /// at 0. A non-positive price makes the energy free: the purchase is always
    /// solvent and only the burn fee applies.
    pub fn burn_for_purchase(&mut self, energy: f64, unit_price: f64, burn_rate: f64) -> Purchase {
        let energy = non_negative(energy);
        let unit_price = non_negative(unit_price);
        let required = energy * unit_price;

        if self.community_balance >= required {
            self.community_balance -= required;
            let tokens_burned = self.burn(energy * burn_rate);
            return Purchase {
                energy,
                tokens_spent: required,
                tokens_burned,
            };
        }

        let affordable = if unit_price > 0.0 {
            self.community_balance / unit_price
        } else {
            0.0
        };
        let tokens_spent = self.community_balance;
        self.community_balance = 0.0;
        Purchase {
            energy: affordable,
            tokens_spent,
            tokens_burned: 0.0,
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}
