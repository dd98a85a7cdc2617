//! Inventory health by SKU.

use super::rows::{number, number_any, text};
use super::{Tile, TileValue};
use crate::models::Row;
use serde::Serialize;
use std::collections::BTreeSet;

/// Below this many days of cover a SKU is critical.
pub const CRITICAL_DAYS_ON_HAND: f64 = 7.0;
/// Four times a normal 30-day cover.
pub const OVERSTOCK_DAYS_ON_HAND: f64 = 4.0 * 30.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryMetrics {
    pub total_skus: usize,
    pub critical: usize,
    pub overstocked: usize,
    pub unfulfillable_units: f64,
}

impl InventoryMetrics {
    pub fn from_rows(rows: &[Row]) -> Self {
        let skus: BTreeSet<&str> = rows.iter().filter_map(|r| text(r, "sku")).collect();
        // Rows without a SKU still count once each.
        let unnamed = rows.iter().filter(|r| text(r, "sku").is_none()).count();

        let days: Vec<f64> = rows.iter().filter_map(|r| number(r, "days_on_hand")).collect();

        Self {
            total_skus: skus.len() + unnamed,
            critical: days.iter().filter(|d| **d < CRITICAL_DAYS_ON_HAND).count(),
            overstocked: days.iter().filter(|d| **d > OVERSTOCK_DAYS_ON_HAND).count(),
            unfulfillable_units: rows
                .iter()
                .filter_map(|r| number_any(r, &["unfulfillable_quantity", "unfulfillable"]))
                .sum(),
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        vec![
            Tile::count("Total SKUs", self.total_skus),
            Tile::count("Critical Stock", self.critical).with_detail("<7 days on hand"),
            Tile::count("Overstocked", self.overstocked).with_detail(">120 days on hand"),
            Tile::new("Unfulfillable Units", TileValue::Decimal(self.unfulfillable_units)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inventory_metrics() {
        let rows: Vec<Row> = [
            json!({"sku": "A", "days_on_hand": 3, "unfulfillable_quantity": 4}),
            json!({"sku": "B", "days_on_hand": "150"}),
            json!({"sku": "C", "days_on_hand": 45, "unfulfillable": "6"}),
            json!({"sku": "A", "days_on_hand": 7}),
            json!({"days_on_hand": 121}),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();

        let metrics = InventoryMetrics::from_rows(&rows);
        assert_eq!(metrics.total_skus, 4);
        assert_eq!(metrics.critical, 1);
        assert_eq!(metrics.overstocked, 2);
        assert_eq!(metrics.unfulfillable_units, 10.0);
    }
}
