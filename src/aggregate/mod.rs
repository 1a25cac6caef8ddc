/// Merged market view: one row per distinct commodity name, quantities
/// summed across every listing sharing that name. A reporting view only;
/// rows carry no listing identity and must never drive authorization or
/// mutation of individual listings.
// region:    --- Imports
use crate::listing::model::Listing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
// endregion: --- Imports

// region:    --- Aggregated Row

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub total_quantity: f64,
}

// endregion: --- Aggregated Row

// region:    --- Aggregation

/// Group listings by exact, case-sensitive name and sum their quantities.
/// Category and unit come from the first listing of each group in input
/// order; two listings sharing a name but differing in category or unit
/// silently collapse to the first-seen values. That is a known
/// data-quality limitation of the market and is kept as-is.
pub fn aggregate(listings: &[Listing]) -> Vec<AggregatedRow> {
    let mut rows: Vec<AggregatedRow> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for listing in listings {
        match index.get(listing.name.as_str()) {
            Some(&i) => rows[i].total_quantity += listing.quantity,
            None => {
                index.insert(listing.name.as_str(), rows.len());
                rows.push(AggregatedRow {
                    name: listing.name.clone(),
                    category: listing.category.clone(),
                    unit: listing.unit.clone(),
                    total_quantity: listing.quantity,
                });
            }
        }
    }

    rows
}

// endregion: --- Aggregation

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(id: i64, owner: i64, name: &str, category: &str, unit: &str, qty: f64) -> Listing {
        Listing {
            id,
            owner_id: owner,
            category: category.to_string(),
            name: name.to_string(),
            quantity: qty,
            unit: unit.to_string(),
            is_organic: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn distinct_names_yield_one_row_each() {
        let listings = vec![
            listing(1, 1, "Tomato", "Vegetables", "kg", 5.0),
            listing(2, 2, "Corn", "Grains", "kg", 12.5),
            listing(3, 3, "Mango", "Fruits", "kg", 3.0),
        ];
        let rows = aggregate(&listings);
        assert_eq!(rows.len(), 3);
        for (row, src) in rows.iter().zip(&listings) {
            assert_eq!(row.name, src.name);
            assert_eq!(row.total_quantity, src.quantity);
        }
    }

    #[test]
    fn shared_names_sum_quantities() {
        // Two farmers list Tomato (5 + 3); the merged view shows 8.
        let listings = vec![
            listing(1, 1, "Tomato", "Vegetables", "kg", 5.0),
            listing(2, 2, "Tomato", "Vegetables", "kg", 3.0),
        ];
        let rows = aggregate(&listings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Tomato");
        assert_eq!(rows[0].total_quantity, 8.0);
    }

    #[test]
    fn first_listing_supplies_category_and_unit() {
        // Same name, conflicting category/unit: the first-seen values win and
        // the conflict is collapsed silently. Documented limitation.
        let listings = vec![
            listing(1, 1, "Tomato", "Vegetables", "kg", 5.0),
            listing(2, 2, "Tomato", "Fruits", "crate", 3.0),
        ];
        let rows = aggregate(&listings);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "Vegetables");
        assert_eq!(rows[0].unit, "kg");
        assert_eq!(rows[0].total_quantity, 8.0);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let listings = vec![
            listing(1, 1, "Tomato", "Vegetables", "kg", 5.0),
            listing(2, 2, "tomato", "Vegetables", "kg", 3.0),
        ];
        let rows = aggregate(&listings);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rows_follow_input_order() {
        let listings = vec![
            listing(1, 1, "Corn", "Grains", "kg", 1.0),
            listing(2, 2, "Tomato", "Vegetables", "kg", 2.0),
            listing(3, 3, "Corn", "Grains", "kg", 4.0),
        ];
        let rows = aggregate(&listings);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Corn");
        assert_eq!(rows[0].total_quantity, 5.0);
        assert_eq!(rows[1].name, "Tomato");
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(aggregate(&[]).is_empty());
    }
}

// endregion: --- Tests
