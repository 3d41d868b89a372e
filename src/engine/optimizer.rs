use crate::engine::comparison::compare;
use crate::matcher::find_matches;
use crate::model::{
    OptimizeError, OptimizedPlan, PlanItem, PriceRecord, RetailerGroup, ShoppingListItem,
};
use crate::utils::round_to_cents;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Display name of the sentinel group collecting items no retailer
/// currently offers.
pub const NOT_FOUND_GROUP: &str = "Nicht gefunden";

/// Turns a shopping list into a per-retailer buying plan.
///
/// Each item is assigned independently to the retailer with the cheapest
/// matching offer (greedy per item, no cross-item store-count trade-off).
/// Groups appear in the order their first item was assigned; the
/// "Nicht gefunden" group, if any, comes last and never counts toward
/// totals. `potential_savings` measures the captured discount against
/// the regular prices of the same matched offers.
pub fn optimize(
    items: &[ShoppingListItem],
    records: &[PriceRecord],
    active_retailer_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<OptimizedPlan, OptimizeError> {
    for item in items {
        if item.quantity == 0 {
            return Err(OptimizeError::InvalidQuantity {
                product_name: item.product_name.clone(),
            });
        }
    }

    let mut groups: Vec<RetailerGroup> = Vec::new();
    let mut not_found: Vec<PlanItem> = Vec::new();
    let mut total = 0.0;
    let mut list_price_total = 0.0;

    for item in items {
        let matches = find_matches(&item.product_name, records, active_retailer_ids, now);
        match compare(&matches).cheapest {
            Some(best) => {
                let quantity = item.quantity as f64;
                let line_total = best.price * quantity;
                total += line_total;
                list_price_total += best.list_price() * quantity;

                let idx = match groups
                    .iter()
                    .position(|g| g.retailer_id.as_deref() == Some(best.retailer_id.as_str()))
                {
                    Some(idx) => idx,
                    None => {
                        groups.push(RetailerGroup {
                            retailer_id: Some(best.retailer_id.clone()),
                            retailer_name: best.retailer_name.clone(),
                            items: Vec::new(),
                            subtotal: 0.0,
                        });
                        groups.len() - 1
                    }
                };
                groups[idx].subtotal += line_total;
                groups[idx].items.push(PlanItem {
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price: Some(best.price),
                    total_price: Some(round_to_cents(line_total)),
                    original_price: best.original_price,
                });
            }
            None => not_found.push(PlanItem {
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                price: None,
                total_price: None,
                original_price: None,
            }),
        }
    }

    for group in &mut groups {
        group.subtotal = round_to_cents(group.subtotal);
    }
    let retailer_count = groups.len();

    if !not_found.is_empty() {
        groups.push(RetailerGroup {
            retailer_id: None,
            retailer_name: NOT_FOUND_GROUP.to_string(),
            items: not_found,
            subtotal: 0.0,
        });
    }

    Ok(OptimizedPlan {
        retailer_groups: groups,
        total_cost: round_to_cents(total),
        potential_savings: round_to_cents((list_price_total - total).max(0.0)),
        retailer_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn record(id: &str, name: &str, price: f64, retailer: &str) -> PriceRecord {
        PriceRecord {
            id: id.to_string(),
            name: name.to_string(),
            price,
            original_price: None,
            unit: None,
            price_per_unit: None,
            category: Category::Sonstiges,
            retailer_id: retailer.to_lowercase(),
            retailer_name: retailer.to_string(),
            prospekt_url: None,
            valid_from: None,
            valid_until: None,
            extracted_at: Utc::now(),
        }
    }

    fn item(name: &str, quantity: u32) -> ShoppingListItem {
        ShoppingListItem {
            product_name: name.to_string(),
            quantity,
            checked: false,
        }
    }

    fn butter_catalog() -> (Vec<PriceRecord>, HashSet<String>) {
        let mut rewe = record("2", "Markenbutter", 2.49, "Rewe");
        rewe.original_price = Some(2.99);
        let records = vec![record("1", "Butter 250g", 1.99, "Aldi"), rewe];
        let scope = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        (records, scope)
    }

    #[test]
    fn test_butter_list_scenario() {
        // [Butter x2, Nichtexistent x1] -> Aldi group at 3.98 plus a
        // "Nicht gefunden" group, total 3.98.
        let (records, scope) = butter_catalog();
        let items = vec![item("Butter", 2), item("Nichtexistent", 1)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();

        assert_eq!(plan.retailer_groups.len(), 2);
        let aldi = &plan.retailer_groups[0];
        assert_eq!(aldi.retailer_name, "Aldi");
        assert_eq!(aldi.subtotal, 3.98);
        assert_eq!(aldi.items.len(), 1);
        assert_eq!(aldi.items[0].price, Some(1.99));
        assert_eq!(aldi.items[0].total_price, Some(3.98));

        let missing = &plan.retailer_groups[1];
        assert_eq!(missing.retailer_name, NOT_FOUND_GROUP);
        assert!(missing.retailer_id.is_none());
        assert_eq!(missing.subtotal, 0.0);
        assert_eq!(missing.items[0].price, None);
        assert_eq!(missing.items[0].total_price, None);

        assert_eq!(plan.total_cost, 3.98);
        assert_eq!(plan.retailer_count, 1);
    }

    #[test]
    fn test_empty_list_gives_empty_plan() {
        let (records, scope) = butter_catalog();
        let plan = optimize(&[], &records, &scope, Utc::now()).unwrap();
        assert!(plan.retailer_groups.is_empty());
        assert_eq!(plan.total_cost, 0.0);
        assert_eq!(plan.potential_savings, 0.0);
        assert_eq!(plan.retailer_count, 0);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let (records, scope) = butter_catalog();
        let items = vec![item("Butter", 0)];
        let err = optimize(&items, &records, &scope, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            OptimizeError::InvalidQuantity {
                product_name: "Butter".to_string()
            }
        );
    }

    #[test]
    fn test_subtotals_sum_to_total_cost() {
        let records = vec![
            record("1", "Butter 250g", 1.99, "Aldi"),
            record("2", "Vollmilch 1L", 1.09, "Rewe"),
            record("3", "Vollkornbrot", 1.89, "Aldi"),
        ];
        let scope: HashSet<String> = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        let items = vec![item("Butter", 1), item("Vollmilch", 3), item("Brot", 2)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();

        let sum: f64 = plan.retailer_groups.iter().map(|g| g.subtotal).sum();
        assert!((sum - plan.total_cost).abs() < 0.005);
        assert_eq!(plan.retailer_count, 2);
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let records = vec![
            record("1", "Vollmilch 1L", 1.09, "Rewe"),
            record("2", "Butter 250g", 1.99, "Aldi"),
        ];
        let scope: HashSet<String> = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        // Milk is processed first, so Rewe must come first even though
        // Aldi sorts earlier alphabetically.
        let items = vec![item("Vollmilch", 1), item("Butter", 1)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();
        let names: Vec<&str> = plan
            .retailer_groups
            .iter()
            .map(|g| g.retailer_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rewe", "Aldi"]);
    }

    #[test]
    fn test_each_item_goes_to_its_cheapest_retailer() {
        let records = vec![
            record("1", "Butter 250g", 1.99, "Aldi"),
            record("2", "Butter mild", 2.29, "Rewe"),
            record("3", "Vollmilch 1L", 1.29, "Aldi"),
            record("4", "Vollmilch frisch", 1.09, "Rewe"),
        ];
        let scope: HashSet<String> = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        let items = vec![item("Butter", 1), item("Vollmilch", 1)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();

        assert_eq!(plan.retailer_count, 2);
        assert_eq!(plan.retailer_groups[0].retailer_name, "Aldi");
        assert_eq!(plan.retailer_groups[0].items[0].price, Some(1.99));
        assert_eq!(plan.retailer_groups[1].retailer_name, "Rewe");
        assert_eq!(plan.retailer_groups[1].items[0].price, Some(1.09));
    }

    #[test]
    fn test_potential_savings_uses_regular_prices() {
        // Markenbutter is on sale for 2.49 (regular 2.99). Savings come
        // only from lines whose regular price sits above the paid price.
        let (records, scope) = butter_catalog();
        let items = vec![item("Markenbutter", 2)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();
        // 2 x (2.99 regular - 2.49 paid)
        assert_eq!(plan.potential_savings, 1.0);

        let plain = vec![item("Butter 250g", 2)];
        let plan = optimize(&plain, &records, &scope, Utc::now()).unwrap();
        assert_eq!(plan.potential_savings, 0.0);
    }

    #[test]
    fn test_unmatched_items_do_not_affect_savings() {
        let (records, scope) = butter_catalog();
        let items = vec![item("Nichtexistent", 5)];
        let plan = optimize(&items, &records, &scope, Utc::now()).unwrap();
        assert_eq!(plan.total_cost, 0.0);
        assert_eq!(plan.potential_savings, 0.0);
        assert_eq!(plan.retailer_count, 0);
        assert_eq!(plan.retailer_groups.len(), 1);
        assert_eq!(plan.retailer_groups[0].retailer_name, NOT_FOUND_GROUP);
    }

    #[test]
    fn test_checked_flag_is_ignored() {
        let (records, scope) = butter_catalog();
        let mut checked_item = item("Butter", 2);
        checked_item.checked = true;
        let plan = optimize(&[checked_item], &records, &scope, Utc::now()).unwrap();
        assert_eq!(plan.total_cost, 3.98);
    }
}
