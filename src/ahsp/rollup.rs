use serde::{Deserialize, Serialize};

use crate::model::{Category, LineItem, RollupTotals};

/// Project bill: line items in insertion order. The same work item may
/// appear more than once, each entry totalled on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRollup {
    line_items: Vec<LineItem>,
}

impl ProjectRollup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line_item: LineItem) {
        self.line_items.push(line_item);
    }

    pub fn clear(&mut self) {
        self.line_items.clear();
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn len(&self) -> usize {
        self.line_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    pub fn grand_total(&self) -> f64 {
        self.line_items
            .iter()
            .fold(0.0, |total, item| total + item.line_total)
    }

    /// Category subtotals are per unit, so every figure here is scaled by the
    /// line's volume before summing.
    pub fn category_total(&self, category: Category) -> f64 {
        self.line_items
            .iter()
            .fold(0.0, |total, item| total + item.subtotal(category) * item.volume)
    }

    pub fn totals(&self) -> RollupTotals {
        let mut totals = RollupTotals {
            labor: self.category_total(Category::Labor),
            material: self.category_total(Category::Material),
            equipment: self.category_total(Category::Equipment),
            ..RollupTotals::default()
        };

        for item in &self.line_items {
            totals.direct_cost += item.base_direct_cost * item.volume;
            totals.overhead += item.overhead_amount * item.volume;
            totals.tax += item.tax_amount * item.volume;
        }
        totals.grand_total = self.grand_total();
        totals
    }

    pub fn unresolved_count(&self) -> usize {
        self.line_items
            .iter()
            .map(|item| item.unresolved_resources().len())
            .sum()
    }
}
