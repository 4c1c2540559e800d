use anyhow::{Context, Result};
use regex::Regex;

use super::numeric::parse_coefficient;
use crate::model::ResourceMap;

/// Placeholder the catalog tables use for "no resources in this category".
pub const EMPTY_DETAIL: &str = "-";

/// Parses `;`-separated resource detail strings such as
/// `Pekerja (L.01) 0.750 OH; Mandor (L.04) 0.025 OH`.
pub struct ResourceLineParser {
    segment_regex: Regex,
}

impl ResourceLineParser {
    pub fn new() -> Result<Self> {
        // name, whitespace, first number whose remainder is only unit words
        // (`OH`, `kg`, `m3`, `m'`). `Keramik 40x40 1,05` keeps `40x40` in the name.
        let segment_regex = Regex::new(
            r"^(?P<name>.*?\S)\s+(?P<coef>\d+(?:[.,]\d+)*)(?:\s*[\p{L}%'/][\p{L}%'/.]*\d?)*\s*$",
        )
        .context("failed to compile resource segment regex")?;

        Ok(Self { segment_regex })
    }

    pub fn parse(&self, detail: Option<&str>) -> ResourceMap {
        let mut resources = ResourceMap::new();

        let Some(detail) = detail.map(str::trim) else {
            return resources;
        };
        if detail.is_empty() || detail == EMPTY_DETAIL {
            return resources;
        }

        for segment in detail.split(';').map(str::trim) {
            if segment.is_empty() {
                continue;
            }

            if let Some((name, coefficient)) = self.parse_segment(segment) {
                resources.upsert(&name, coefficient);
            }
        }

        resources
    }

    fn parse_segment(&self, segment: &str) -> Option<(String, f64)> {
        let captures = self.segment_regex.captures(segment)?;
        let name = captures.name("name")?.as_str().trim();
        if !name.chars().any(char::is_alphabetic) {
            return None;
        }

        let coefficient = parse_coefficient(captures.name("coef")?.as_str());
        Some((name.to_string(), coefficient))
    }
}

/// Renders resources back into the `;`-joined detail form; empty maps become `-`.
pub fn format_resource_detail(resources: &ResourceMap) -> String {
    if resources.is_empty() {
        return EMPTY_DETAIL.to_string();
    }

    resources
        .iter()
        .map(|entry| {
            format!(
                "{} {}",
                entry.name,
                super::numeric::format_coefficient(entry.coefficient)
            )
        })
        .collect::<Vec<String>>()
        .join("; ")
}
