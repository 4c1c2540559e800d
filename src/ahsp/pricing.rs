use thiserror::Error;

use super::matcher::match_price;
use crate::model::{Category, LineItem, PriceTable, ResolvedResource, ResolvedResources, WorkItem};

pub const DEFAULT_OVERHEAD_PCT: f64 = 15.0;
pub const DEFAULT_TAX_PCT: f64 = 11.0;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("work item {code} not found in the loaded catalog")]
    UnknownWorkItem { code: String },

    #[error("volume must be a positive number, got {volume}")]
    InvalidVolume { volume: f64 },

    #[error("{label} percentage must be a non-negative number, got {value}")]
    InvalidRate { label: &'static str, value: f64 },
}

/// Overhead/profit and tax layers, both in percent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkupRates {
    pub overhead_pct: f64,
    pub tax_pct: f64,
}

impl Default for MarkupRates {
    fn default() -> Self {
        Self {
            overhead_pct: DEFAULT_OVERHEAD_PCT,
            tax_pct: DEFAULT_TAX_PCT,
        }
    }
}

impl MarkupRates {
    pub fn validate(&self) -> Result<(), PricingError> {
        validate_rate("overhead", self.overhead_pct)?;
        validate_rate("tax", self.tax_pct)
    }
}

fn validate_rate(label: &'static str, value: f64) -> Result<(), PricingError> {
    if !value.is_finite() || value < 0.0 {
        return Err(PricingError::InvalidRate { label, value });
    }
    Ok(())
}

/// Costs one work item at `volume`. Unmatched resources contribute zero and
/// stay marked `Unresolved` on the line item.
pub fn price_work_item(
    item: &WorkItem,
    volume: f64,
    prices: &PriceTable,
    rates: MarkupRates,
) -> Result<LineItem, PricingError> {
    if !volume.is_finite() || volume <= 0.0 {
        return Err(PricingError::InvalidVolume { volume });
    }
    rates.validate()?;

    let mut resolved_prices = ResolvedResources::default();
    let mut subtotals = [0.0_f64; 3];

    for (slot, category) in Category::ALL.into_iter().enumerate() {
        let resolved = resolve_category(item, category, prices);
        subtotals[slot] = resolved.iter().fold(0.0, |total, resource| total + resource.cost);
        *resolved_prices.get_mut(category) = resolved;
    }

    let [subtotal_labor, subtotal_material, subtotal_equipment] = subtotals;
    let base_direct_cost = subtotal_labor + subtotal_material + subtotal_equipment;
    let overhead_amount = base_direct_cost * (rates.overhead_pct / 100.0);
    let unit_price_pre_tax = base_direct_cost + overhead_amount;
    let tax_amount = unit_price_pre_tax * (rates.tax_pct / 100.0);
    let unit_price_final = unit_price_pre_tax + tax_amount;
    let line_total = unit_price_final * volume;

    Ok(LineItem {
        code: item.code.clone(),
        description: item.description.clone(),
        unit: item.unit.clone(),
        volume,
        resolved_prices,
        subtotal_labor,
        subtotal_material,
        subtotal_equipment,
        base_direct_cost,
        overhead_pct: rates.overhead_pct,
        overhead_amount,
        unit_price_pre_tax,
        tax_pct: rates.tax_pct,
        tax_amount,
        unit_price_final,
        line_total,
    })
}

fn resolve_category(
    item: &WorkItem,
    category: Category,
    prices: &PriceTable,
) -> Vec<ResolvedResource> {
    item.resources
        .get(category)
        .iter()
        .map(|entry| {
            let found = match_price(&entry.name, prices);
            ResolvedResource {
                name: entry.name.clone(),
                coefficient: entry.coefficient,
                resolution: found.resolution,
                cost: entry.coefficient * found.price(),
                matched_key: found.matched_key,
                match_tier: found.tier,
            }
        })
        .collect()
}
