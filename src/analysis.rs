//! Display-ready aggregates derived from fetched rows.
//!
//! Everything here is pure, single-pass work on the small in-memory lists the
//! API returns; the backend owns the real statistics.

use crate::models::{ComparisonRow, FilterOptions};

/// A region paired with the value that made it stand out.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionValue {
    pub region: String,
    pub value: f64,
}

/// Headline figures derived from a comparison response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonHighlights {
    pub highest_price: Option<RegionValue>,
    pub lowest_price: Option<RegionValue>,
    pub highest_volume: Option<RegionValue>,
    /// Spread between max and min average price, as a percentage of the min.
    pub price_spread_percent: Option<f64>,
}

/// Derive the comparison highlights from rows in API order.
///
/// Rows with a missing or non-positive average price are ignored for the
/// price figures. Ties keep the first row in the returned order; rows are
/// never re-sorted.
pub fn comparison_highlights(rows: &[ComparisonRow]) -> ComparisonHighlights {
    let mut highlights = ComparisonHighlights::default();

    for row in rows {
        if let Some(price) = row.estadisticas.precio_promedio {
            if price > 0.0 {
                if highlights.highest_price.as_ref().map_or(true, |best| price > best.value) {
                    highlights.highest_price = Some(RegionValue {
                        region: row.region_nombre.clone(),
                        value: price,
                    });
                }
                if highlights.lowest_price.as_ref().map_or(true, |best| price < best.value) {
                    highlights.lowest_price = Some(RegionValue {
                        region: row.region_nombre.clone(),
                        value: price,
                    });
                }
            }
        }

        if let Some(volume) = row.estadisticas.volumen_total {
            if highlights.highest_volume.as_ref().map_or(true, |best| volume > best.value) {
                highlights.highest_volume = Some(RegionValue {
                    region: row.region_nombre.clone(),
                    value: volume,
                });
            }
        }
    }

    if let (Some(max), Some(min)) = (&highlights.highest_price, &highlights.lowest_price) {
        if min.value > 0.0 {
            highlights.price_spread_percent = Some((max.value - min.value) / min.value * 100.0);
        }
    }

    highlights
}

/// Filter values normalized for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChoices {
    /// Distinct years, newest first.
    pub years: Vec<i32>,
    pub subsectors: Vec<String>,
    pub products: Vec<String>,
}

impl FilterChoices {
    /// Normalize raw `/api/filtros/` values: years deduplicated and sorted
    /// descending, name lists deduplicated and sorted alphabetically.
    pub fn from_options(options: FilterOptions) -> Self {
        Self {
            years: dedup_years(options.years),
            subsectors: dedup_names(options.subsectores.into_iter().map(|e| e.nombre)),
            products: dedup_names(options.productos.into_iter().map(|e| e.nombre)),
        }
    }
}

/// Distinct years, newest first.
pub fn dedup_years(mut years: Vec<i32>) -> Vec<i32> {
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Distinct non-empty names, sorted alphabetically.
pub fn dedup_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<String> = names
        .into_iter()
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();
    unique.sort();
    unique
}
