use crate::model::{Comparison, PriceRecord};
use crate::utils::round_to_cents;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Total order on records: price ascending, ties by retailer name, then
/// record id. Input order can never leak into the result.
fn price_then_retailer(a: &PriceRecord, b: &PriceRecord) -> Ordering {
    a.price
        .partial_cmp(&b.price)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.retailer_name.cmp(&b.retailer_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Ranks matched records by price. An empty match set is a normal
/// outcome: empty results, no cheapest.
pub fn compare(matches: &[PriceRecord]) -> Comparison {
    let mut results = matches.to_vec();
    results.sort_by(price_then_retailer);
    let cheapest = results.first().cloned();
    Comparison { results, cheapest }
}

/// Comparison view the UI renders: one row per retailer, each retailer
/// represented by its cheapest matching offer.
pub fn compare_across_retailers(matches: &[PriceRecord]) -> Comparison {
    let mut best_per_retailer: HashMap<&str, &PriceRecord> = HashMap::new();
    for record in matches {
        best_per_retailer
            .entry(record.retailer_id.as_str())
            .and_modify(|current| {
                if price_then_retailer(record, current) == Ordering::Less {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    let reduced: Vec<PriceRecord> = best_per_retailer.into_values().cloned().collect();
    compare(&reduced)
}

impl Comparison {
    /// Spread between the most and least expensive offer; 0.0 with fewer
    /// than two results.
    pub fn savings(&self) -> f64 {
        match (self.results.first(), self.results.last()) {
            (Some(cheapest), Some(dearest)) if self.results.len() >= 2 => {
                round_to_cents(dearest.price - cheapest.price)
            }
            _ => 0.0,
        }
    }
}
