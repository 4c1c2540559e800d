use crate::model::{MatchTier, PriceResolution, PriceTable};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatch {
    pub resolution: PriceResolution,
    pub matched_key: Option<String>,
    pub tier: Option<MatchTier>,
}

impl PriceMatch {
    fn unresolved() -> Self {
        Self {
            resolution: PriceResolution::Unresolved,
            matched_key: None,
            tier: None,
        }
    }

    fn hit(key: &str, price: f64, tier: MatchTier) -> Self {
        Self {
            resolution: PriceResolution::Resolved(price),
            matched_key: Some(key.to_string()),
            tier: Some(tier),
        }
    }

    pub fn price(&self) -> f64 {
        self.resolution.price()
    }
}

/// Looks a resource name up in the price table: exact, then case-insensitive,
/// then containment either way on names with parenthesized parts removed.
/// Containment takes the first table entry that hits, so "Pasir" against
/// "Pasir Beton" and "Pasir Pasang" depends on table order.
pub fn match_price(resource_name: &str, prices: &PriceTable) -> PriceMatch {
    let name = resource_name.trim();
    if name.is_empty() {
        return PriceMatch::unresolved();
    }

    if let Some(entry) = prices.iter().find(|entry| entry.name.trim() == name) {
        return PriceMatch::hit(&entry.name, entry.price, MatchTier::Exact);
    }

    let folded = name.to_lowercase();
    if let Some(entry) = prices
        .iter()
        .find(|entry| entry.name.trim().to_lowercase() == folded)
    {
        return PriceMatch::hit(&entry.name, entry.price, MatchTier::CaseInsensitive);
    }

    let normalized = normalize_for_containment(name);
    if normalized.is_empty() {
        return PriceMatch::unresolved();
    }

    prices
        .iter()
        .find(|entry| {
            let key = normalize_for_containment(&entry.name);
            !key.is_empty() && (key.contains(&normalized) || normalized.contains(&key))
        })
        .map(|entry| PriceMatch::hit(&entry.name, entry.price, MatchTier::Containment))
        .unwrap_or_else(PriceMatch::unresolved)
}

/// "Semen (PC)" -> "semen", "Pekerja  (L.01)" -> "pekerja".
pub fn normalize_for_containment(name: &str) -> String {
    let mut stripped = String::with_capacity(name.len());
    let mut depth = 0usize;

    for ch in name.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }

    stripped
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}
