use crate::model::PriceRecord;
use crate::normalizer::normalize;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Resolves a free-text query to the records that represent the same
/// product across retailers.
///
/// A record matches when its normalized name contains the normalized
/// query as a substring, so "Butter" finds "Markenbutter 250g". Only
/// records from retailers in `active_retailer_ids` whose validity window
/// contains `now` are eligible. Result order follows the input; sorting
/// is the comparator's job.
pub fn find_matches(
    query: &str,
    records: &[PriceRecord],
    active_retailer_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> Vec<PriceRecord> {
    let needle = normalize(query);
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| active_retailer_ids.contains(&r.retailer_id))
        .filter(|r| r.is_valid_at(now))
        .filter(|r| normalize(&r.name).contains(&needle))
        .cloned()
        .collect()
}
