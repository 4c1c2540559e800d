//! AHSP unit-price extraction and RAB pricing.
//!
//! Data flows one way: raw cell grid -> [`GridScanner`] -> [`Catalog`] ->
//! [`match_price`] + [`price_work_item`] -> [`ProjectRollup`].

mod catalog;
mod extract;
mod matcher;
mod numeric;
mod pricing;
mod resource_line;
mod rollup;
#[cfg(test)]
mod tests;

pub use catalog::Catalog;
pub use extract::{GridScanner, ScanStats};
pub use matcher::match_price;
pub use numeric::{format_coefficient, is_numeric_text, normalize_number};
pub use pricing::{DEFAULT_OVERHEAD_PCT, DEFAULT_TAX_PCT, MarkupRates, PricingError, price_work_item};
pub use resource_line::{ResourceLineParser, format_resource_detail};
pub use rollup::ProjectRollup;
