use crate::engine::comparison::compare;
use crate::matcher::find_matches;
use crate::model::{PriceAlert, PriceRecord};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Re-evaluates an alert against a catalog snapshot and returns the
/// updated copy; persisting it is the caller's job. Safe to run on every
/// cycle: for an unchanged catalog the result is identical.
pub fn evaluate(
    alert: &PriceAlert,
    records: &[PriceRecord],
    active_retailer_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> PriceAlert {
    let scope: HashSet<String> = if alert.retailer_ids.is_empty() {
        active_retailer_ids.clone()
    } else {
        active_retailer_ids
            .iter()
            .filter(|id| alert.retailer_ids.contains(id))
            .cloned()
            .collect()
    };

    let matches = find_matches(&alert.product_name, records, &scope, now);
    let current_price = compare(&matches).cheapest.map(|r| r.price);
    let triggered = current_price.is_some_and(|price| price <= alert.target_price);

    PriceAlert {
        current_price,
        triggered,
        ..alert.clone()
    }
}
