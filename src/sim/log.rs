//! Fixed-format settlement report, one block per step.

use std::fmt;

use super::types::StepResult;

/// Renders the settlement block for one step.
///
/// Lines are separated by `\n`, without a trailing newline, so blocks can be
/// joined with a blank line between them.
pub fn render_block(r: &StepResult) -> String {
    SettlementBlock(r).to_string()
}

/// Display adapter producing the fixed-format block of one step.
pub struct SettlementBlock<'a>(pub &'a StepResult);

impl fmt::Display for SettlementBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        let d = &r.decision;
        let t = &r.tokens;

        writeln!(f, "=== Settlement step {} ({} {:02}:00) ===", r.step, r.date, r.hour)?;
        writeln!(f, "Consumption: {:.2} kWh", r.consumption)?;
        writeln!(f, "Production: {:.2} kWh", r.production)?;
        writeln!(
            f,
            "Surplus: {:.2} kWh, deficit: {:.2} kWh",
            r.energy_surplus, r.energy_deficit
        )?;
        writeln!(
            f,
            "Decision ({}): to storage {:.2} kWh, to grid {:.2} kWh, from storage {:.2} kWh, from grid {:.2} kWh",
            r.decision_source,
            d.energy_added_to_storage,
            d.energy_sold_to_grid,
            d.energy_bought_from_storages,
            d.energy_bought_from_grid
        )?;
        writeln!(
            f,
            "Storage moved: stored {:.2} kWh, drawn {:.2} kWh",
            r.energy_stored, r.energy_drawn
        )?;
        writeln!(
            f,
            "Prices: P2P {:.2}/kWh, grid purchase {:.2}/kWh, grid sale {:.2}/kWh",
            r.p2p_price, r.grid_purchase_price, r.grid_sale_price
        )?;
        writeln!(
            f,
            "Tokens minted: {:.2} (self-consumption {:.2}, P2P {:.2}, grid sale {:.2})",
            t.minted(),
            t.self_consumption_reward,
            t.p2p_reward,
            t.grid_sale_reward
        )?;
        writeln!(
            f,
            "Tokens burned: {:.2} (storage draw {:.2}, grid purchase {:.2}, burn fee {:.2})",
            t.burned(),
            t.storage_draw_burn,
            t.grid_purchase_spent,
            t.grid_purchase_fee
        )?;
        writeln!(
            f,
            "Grid purchase: {:.2} of {:.2} kWh requested (unmet {:.2} kWh)",
            r.grid_purchase_applied,
            d.energy_bought_from_grid,
            r.unmet_demand()
        )?;
        for (name, level) in &r.storage_levels {
            writeln!(f, "Storage {name} level: {level:.2} kWh")?;
        }
        write!(f, "Token balance: {:.2} CT", r.token_balance)
    }
}

/// Joins blocks with one blank line between them and a final newline.
pub fn join_blocks(blocks: &[String]) -> String {
    if blocks.is_empty() {
        return String::new();
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}
