use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UNIT: &str = "ls";
pub const CATALOG_MANIFEST_VERSION: u32 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Labor,
    Material,
    Equipment,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Labor, Category::Material, Category::Equipment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Labor => "labor",
            Self::Material => "material",
            Self::Equipment => "equipment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub coefficient: f64,
}

/// Resource name to coefficient, in first-seen order. Re-inserting a name
/// replaces its coefficient in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceMap {
    entries: Vec<ResourceEntry>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, name: &str, coefficient: f64) {
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.name == name) {
            existing.coefficient = coefficient;
            return;
        }

        self.entries.push(ResourceEntry {
            name: name.to_string(),
            coefficient,
        });
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.coefficient)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = ResourceMap::new();
        for (name, coefficient) in iter {
            map.upsert(name.as_ref(), coefficient);
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSet {
    pub labor: ResourceMap,
    pub material: ResourceMap,
    pub equipment: ResourceMap,
}

impl ResourceSet {
    pub fn get(&self, category: Category) -> &ResourceMap {
        match category {
            Category::Labor => &self.labor,
            Category::Material => &self.material,
            Category::Equipment => &self.equipment,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut ResourceMap {
        match category {
            Category::Labor => &mut self.labor,
            Category::Material => &mut self.material,
            Category::Equipment => &mut self.equipment,
        }
    }

    pub fn resource_count(&self) -> usize {
        self.labor.len() + self.material.len() + self.equipment.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub resources: ResourceSet,
}

impl WorkItem {
    pub fn new(code: &str, description: &str, unit: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            unit: unit.unwrap_or(DEFAULT_UNIT).to_string(),
            resources: ResourceSet::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub name: String,
    pub price: f64,
}

/// Resource name to unit price, kept in insertion order because containment
/// matching takes the first hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    entries: Vec<PriceEntry>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, price: f64) {
        let name = name.trim();
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.name == name) {
            existing.price = price;
            return;
        }

        self.entries.push(PriceEntry {
            name: name.to_string(),
            price,
        });
    }

    pub fn extend_from(&mut self, other: &PriceTable) {
        for entry in other.iter() {
            self.insert(&entry.name, entry.price);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = PriceTable::new();
        for (name, price) in iter {
            table.insert(name.as_ref(), price);
        }
        table
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "price", rename_all = "snake_case")]
pub enum PriceResolution {
    Resolved(f64),
    Unresolved,
}

impl PriceResolution {
    pub fn price(self) -> f64 {
        match self {
            Self::Resolved(price) => price,
            Self::Unresolved => 0.0,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    Containment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub name: String,
    pub coefficient: f64,
    pub resolution: PriceResolution,
    pub matched_key: Option<String>,
    pub match_tier: Option<MatchTier>,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResources {
    pub labor: Vec<ResolvedResource>,
    pub material: Vec<ResolvedResource>,
    pub equipment: Vec<ResolvedResource>,
}

impl ResolvedResources {
    pub fn get(&self, category: Category) -> &[ResolvedResource] {
        match category {
            Category::Labor => &self.labor,
            Category::Material => &self.material,
            Category::Equipment => &self.equipment,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut Vec<ResolvedResource> {
        match category {
            Category::Labor => &mut self.labor,
            Category::Material => &mut self.material,
            Category::Equipment => &mut self.equipment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub volume: f64,
    pub resolved_prices: ResolvedResources,
    pub subtotal_labor: f64,
    pub subtotal_material: f64,
    pub subtotal_equipment: f64,
    pub base_direct_cost: f64,
    pub overhead_pct: f64,
    pub overhead_amount: f64,
    pub unit_price_pre_tax: f64,
    pub tax_pct: f64,
    pub tax_amount: f64,
    pub unit_price_final: f64,
    pub line_total: f64,
}

impl LineItem {
    pub fn subtotal(&self, category: Category) -> f64 {
        match category {
            Category::Labor => self.subtotal_labor,
            Category::Material => self.subtotal_material,
            Category::Equipment => self.subtotal_equipment,
        }
    }

    pub fn unresolved_resources(&self) -> Vec<(Category, &str)> {
        Category::ALL
            .iter()
            .flat_map(|category| {
                self.resolved_prices
                    .get(*category)
                    .iter()
                    .filter(|resource| !resource.resolution.is_resolved())
                    .map(move |resource| (*category, resource.name.as_str()))
            })
            .collect()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupTotals {
    pub labor: f64,
    pub material: f64,
    pub equipment: f64,
    pub direct_cost: f64,
    pub overhead: f64,
    pub tax: f64,
    pub grand_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub layout: String,
    pub sheets: Vec<String>,
    pub item_count: usize,
    pub warnings: Vec<String>,
    pub items: Vec<WorkItem>,
}
