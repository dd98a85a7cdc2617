//! Inbound shipment and receiving metrics.

use super::rows::{is_one_of, number, percent, text, timestamp};
use super::{Tile, TileValue};
use crate::models::Row;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InboundMetrics {
    pub total: usize,
    pub delayed: usize,
    pub distinct_skus: usize,
    pub avg_skus_per_shipment: f64,
    /// Expected units on shipments not yet received.
    pub receiving_workload: f64,
    pub on_time_rate: f64,
}

fn is_received(row: &Row) -> bool {
    is_one_of(row, "status", &["received"])
}

impl InboundMetrics {
    pub fn from_rows(rows: &[Row], now: DateTime<Utc>) -> Self {
        let delayed = rows
            .iter()
            .filter(|r| !is_received(r))
            .filter(|r| timestamp(r, "expected_arrival_date").is_some_and(|expected| expected < now))
            .count();

        let mut by_shipment: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut skus = BTreeSet::new();
        for row in rows {
            let sku = text(row, "sku");
            if let Some(sku) = sku {
                skus.insert(sku);
            }
            if let Some(shipment) = text(row, "shipment_id") {
                let entry = by_shipment.entry(shipment).or_default();
                if let Some(sku) = sku {
                    entry.insert(sku);
                }
            }
        }
        let skus_in_shipments: usize = by_shipment.values().map(BTreeSet::len).sum();
        let avg_skus_per_shipment = if by_shipment.is_empty() {
            0.0
        } else {
            skus_in_shipments as f64 / by_shipment.len() as f64
        };

        let receiving_workload = rows
            .iter()
            .filter(|r| !is_received(r))
            .filter_map(|r| number(r, "expected_quantity"))
            .sum();

        // A received row with no arrival date is judged against now.
        let on_time = rows
            .iter()
            .filter(|r| is_received(r))
            .filter(|r| match timestamp(r, "expected_arrival_date") {
                Some(expected) => timestamp(r, "arrival_date").unwrap_or(now) <= expected,
                None => false,
            })
            .count();

        Self {
            total: rows.len(),
            delayed,
            distinct_skus: skus.len(),
            avg_skus_per_shipment,
            receiving_workload,
            on_time_rate: percent(on_time, rows.len()),
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        vec![
            Tile::count("Inbound Lines", self.total),
            Tile::count("Delayed", self.delayed).with_detail("past expected arrival"),
            Tile::count("Distinct SKUs", self.distinct_skus),
            Tile::new(
                "Avg SKUs / Shipment",
                TileValue::Decimal(self.avg_skus_per_shipment),
            ),
            Tile::new("Receiving Workload", TileValue::Decimal(self.receiving_workload))
                .with_detail("expected units not yet received"),
            Tile::percent("On-Time Rate", self.on_time_rate),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn line(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_inbound_metrics() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let rows = vec![
            line(json!({
                "shipment_id": "S1", "sku": "A", "status": "in_transit",
                "expected_arrival_date": "2026-10-10", "expected_quantity": 100
            })),
            line(json!({
                "shipment_id": "S1", "sku": "B", "status": "in_transit",
                "expected_arrival_date": "2026-10-25", "expected_quantity": "50"
            })),
            line(json!({
                "shipment_id": "S2", "sku": "A", "status": "received",
                "expected_arrival_date": "2026-10-05", "arrival_date": "2026-10-04",
                "expected_quantity": 30
            })),
            line(json!({
                "shipment_id": "S3", "sku": "C", "status": "received",
                "expected_arrival_date": "2026-10-05", "arrival_date": "2026-10-09"
            })),
        ];

        let metrics = InboundMetrics::from_rows(&rows, now);
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.delayed, 1);
        assert_eq!(metrics.distinct_skus, 3);
        // S1 has two SKUs, S2 and S3 one each.
        assert!((metrics.avg_skus_per_shipment - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.receiving_workload, 150.0);
        assert_eq!(metrics.on_time_rate, 25.0);
    }

    #[test]
    fn test_empty_inbound() {
        let metrics = InboundMetrics::from_rows(&[], Utc::now());
        assert_eq!(metrics.avg_skus_per_shipment, 0.0);
        assert_eq!(metrics.on_time_rate, 0.0);
        assert_eq!(metrics.tiles().len(), 6);
    }
}
