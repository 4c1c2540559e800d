use super::pricing::PricingError;
use crate::model::WorkItem;

/// Loaded work items keyed by code. Rebuilt wholesale, never patched.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<WorkItem>,
}

impl Catalog {
    /// Keeps the first item per code; the returned warnings name the
    /// duplicates that were dropped.
    pub fn from_items(items: Vec<WorkItem>) -> (Self, Vec<String>) {
        let mut kept: Vec<WorkItem> = Vec::with_capacity(items.len());
        let mut warnings = Vec::new();

        for item in items {
            if kept.iter().any(|existing| existing.code == item.code) {
                warnings.push(format!(
                    "duplicate work item code {} ({}) ignored",
                    item.code, item.description
                ));
                continue;
            }
            kept.push(item);
        }

        (Self { items: kept }, warnings)
    }

    pub fn get(&self, code: &str) -> Result<&WorkItem, PricingError> {
        let wanted = code.trim();
        self.items
            .iter()
            .find(|item| item.code == wanted)
            .ok_or_else(|| PricingError::UnknownWorkItem {
                code: wanted.to_string(),
            })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<WorkItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
