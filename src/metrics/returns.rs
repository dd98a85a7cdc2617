//! Return volume, status and reasons.

use super::rows::{number_any, text};
use super::Tile;
use crate::models::Row;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReturnsMetrics {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_reason: BTreeMap<String, usize>,
    pub refund_total: f64,
}

impl ReturnsMetrics {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_reason = BTreeMap::new();

        for row in rows {
            let status = text(row, "status").unwrap_or("unknown").to_lowercase();
            *by_status.entry(status).or_insert(0) += 1;

            let reason = text(row, "return_reason")
                .or_else(|| text(row, "reason"))
                .unwrap_or("unspecified");
            *by_reason.entry(reason.to_string()).or_insert(0) += 1;
        }

        Self {
            total: rows.len(),
            by_status,
            by_reason,
            refund_total: rows
                .iter()
                .filter_map(|r| number_any(r, &["refund_amount", "refund"]))
                .sum(),
        }
    }

    /// The reason with the most returns. Ties go to the first alphabetically.
    pub fn top_reason(&self) -> Option<(&str, usize)> {
        self.by_reason
            .iter()
            .fold(None, |best: Option<(&str, usize)>, (reason, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((reason.as_str(), *count)),
            })
    }

    pub fn tiles(&self) -> Vec<Tile> {
        let mut tiles = vec![
            Tile::count("Total Returns", self.total),
            Tile::money("Refunded", self.refund_total),
        ];
        if let Some((reason, count)) = self.top_reason() {
            tiles.push(Tile::count("Top Reason", count).with_detail(reason));
        }
        for (status, count) in &self.by_status {
            tiles.push(Tile::count(format!("Status: {}", status), *count));
        }
        tiles
    }
}
