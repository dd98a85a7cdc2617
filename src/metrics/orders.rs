//! Order flow metrics.

use super::rows::{is_one_of, percent, text, timestamp};
use super::Tile;
use crate::models::Row;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Orders still open this long after creation count as late.
const LATE_AFTER_DAYS: i64 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderMetrics {
    pub total: usize,
    pub fulfilled: usize,
    pub canceled: usize,
    pub late: usize,
    pub by_channel: BTreeMap<String, usize>,
    pub cancel_rate: f64,
}

pub fn is_fulfilled(row: &Row) -> bool {
    is_one_of(row, "order_status", &["fulfilled"])
}

pub fn is_canceled(row: &Row) -> bool {
    is_one_of(row, "order_status", &["canceled", "cancelled"])
}

impl OrderMetrics {
    pub fn from_rows(rows: &[Row], now: DateTime<Utc>) -> Self {
        let late_cutoff = now - Duration::days(LATE_AFTER_DAYS);

        let fulfilled = rows.iter().filter(|r| is_fulfilled(r)).count();
        let canceled = rows.iter().filter(|r| is_canceled(r)).count();
        let late = rows
            .iter()
            .filter(|r| !is_fulfilled(r))
            .filter(|r| timestamp(r, "created_date").is_some_and(|created| created < late_cutoff))
            .count();

        let mut by_channel = BTreeMap::new();
        for row in rows {
            let channel = text(row, "channel").unwrap_or("unknown");
            *by_channel.entry(channel.to_string()).or_insert(0) += 1;
        }

        Self {
            total: rows.len(),
            fulfilled,
            canceled,
            late,
            by_channel,
            cancel_rate: percent(canceled, rows.len()),
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        let mut tiles = vec![
            Tile::count("Total Orders", self.total),
            Tile::count("Fulfilled", self.fulfilled),
            Tile::count("Canceled", self.canceled)
                .with_detail(format!("{:.1}% cancel rate", self.cancel_rate)),
            Tile::count("Late Orders", self.late).with_detail(">3 days unfulfilled"),
        ];
        for (channel, count) in &self.by_channel {
            tiles.push(Tile::count(format!("Channel: {}", channel), *count));
        }
        tiles
    }
}
