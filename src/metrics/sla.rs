//! SLA performance.
//!
//! Shipping and returns are measured from rows. Receiving has no data source
//! yet and is reported at a fixed rate.

use super::orders::is_fulfilled;
use super::rows::{percent, timestamp};
use super::{Tile, TileValue};
use crate::models::Row;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

pub const SHIPPING_WINDOW_HOURS: i64 = 48;
pub const RETURNS_WINDOW_DAYS: i64 = 7;
pub const RECEIVING_SLA: f64 = 94.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Stable,
    Down,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "↑ up"),
            Trend::Stable => write!(f, "→ stable"),
            Trend::Down => write!(f, "↓ down"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Meeting,
    Warning,
    Failing,
}

impl TargetStatus {
    fn classify(current: f64, meeting: f64, warning: f64) -> Self {
        if current >= meeting {
            TargetStatus::Meeting
        } else if current >= warning {
            TargetStatus::Warning
        } else {
            TargetStatus::Failing
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Meeting => write!(f, "✅ meeting"),
            TargetStatus::Warning => write!(f, "⚠️ warning"),
            TargetStatus::Failing => write!(f, "❌ failing"),
        }
    }
}

/// One contracted SLA and how the current period compares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaTarget {
    pub name: &'static str,
    pub target: f64,
    pub current: f64,
    /// Unknown for receiving.
    pub breaches: Option<u64>,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaMetrics {
    pub shipping: f64,
    pub returns: f64,
    pub receiving: f64,
    pub otif: f64,
    pub breaches: u64,
    pub critical_breaches: u64,
    pub trend: Trend,
    pub targets: Vec<SlaTarget>,
}

fn breaches(rate: f64, total: usize) -> u64 {
    ((100.0 - rate) * total as f64 / 100.0).floor().max(0.0) as u64
}

impl SlaMetrics {
    pub fn from_rows(orders: &[Row], returns: &[Row], now: DateTime<Utc>) -> Self {
        let shipping_window = Duration::hours(SHIPPING_WINDOW_HOURS);
        let shipped_on_time = orders
            .iter()
            .filter(|r| is_fulfilled(r))
            .filter(|r| timestamp(r, "created_date").is_some_and(|created| now - created <= shipping_window))
            .count();
        let shipping = percent(shipped_on_time, orders.len());

        // Open returns are measured up to now.
        let returns_window = Duration::days(RETURNS_WINDOW_DAYS);
        let processed_on_time = returns
            .iter()
            .filter(|r| match timestamp(r, "return_initialized_date") {
                Some(started) => {
                    let finished = timestamp(r, "returned_date").unwrap_or(now);
                    finished - started <= returns_window
                }
                None => false,
            })
            .count();
        let returns_rate = percent(processed_on_time, returns.len());

        let receiving = RECEIVING_SLA;
        let otif = (shipping + returns_rate + receiving) / 3.0;
        let total_breaches = breaches(otif, orders.len());

        let trend = if otif > 95.0 {
            Trend::Up
        } else if otif < 90.0 {
            Trend::Down
        } else {
            Trend::Stable
        };

        let targets = vec![
            SlaTarget {
                name: "Shipping (48h)",
                target: 97.0,
                current: shipping,
                breaches: Some(breaches(shipping, orders.len())),
                status: TargetStatus::classify(shipping, 97.0, 90.0),
            },
            SlaTarget {
                name: "Returns (7d)",
                target: 95.0,
                current: returns_rate,
                breaches: Some(breaches(returns_rate, returns.len())),
                status: TargetStatus::classify(returns_rate, 95.0, 85.0),
            },
            SlaTarget {
                name: "Receiving (24h)",
                target: 98.0,
                current: receiving,
                breaches: None,
                status: TargetStatus::classify(receiving, 98.0, 90.0),
            },
            SlaTarget {
                name: "Overall OTIF",
                target: 97.0,
                current: otif,
                breaches: Some(total_breaches),
                status: TargetStatus::classify(otif, 97.0, 90.0),
            },
        ];

        Self {
            shipping,
            returns: returns_rate,
            receiving,
            otif,
            breaches: total_breaches,
            critical_breaches: (total_breaches as f64 * 0.3).floor() as u64,
            trend,
            targets,
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        vec![
            Tile::percent("Overall OTIF", self.otif).with_detail(self.trend.to_string()),
            Tile::percent("Shipping SLA", self.shipping).with_detail("48h target"),
            Tile::percent("Returns SLA", self.returns).with_detail("7d processing"),
            Tile::percent("Receiving SLA", self.receiving).with_detail("24h dock-to-stock"),
            Tile::new("SLA Breaches", TileValue::Count(self.breaches))
                .with_detail(format!("{} critical", self.critical_breaches)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_sla_from_rows() {
        let orders = vec![
            row(json!({"order_status": "fulfilled", "created_date": "2026-10-18T12:00:00Z"})),
            row(json!({"order_status": "fulfilled", "created_date": "2026-10-01T12:00:00Z"})),
            row(json!({"order_status": "pending", "created_date": "2026-10-19T08:00:00Z"})),
            row(json!({"order_status": "fulfilled", "created_date": "2026-10-19T00:00:00Z"})),
        ];
        let returns = vec![
            row(json!({"return_initialized_date": "2026-10-01", "returned_date": "2026-10-05"})),
            row(json!({"return_initialized_date": "2026-10-01", "returned_date": "2026-10-15"})),
            // Still open after two days.
            row(json!({"return_initialized_date": "2026-10-17T12:00:00Z"})),
            row(json!({"return_initialized_date": "2026-09-01"})),
        ];

        let sla = SlaMetrics::from_rows(&orders, &returns, now());
        assert_eq!(sla.shipping, 50.0);
        assert_eq!(sla.returns, 50.0);
        assert_eq!(sla.receiving, 94.2);
        assert!((sla.otif - 64.733_333).abs() < 1e-3);
        // floor((100 - 64.73) * 4 / 100) = 1
        assert_eq!(sla.breaches, 1);
        assert_eq!(sla.critical_breaches, 0);
        assert_eq!(sla.trend, Trend::Down);

        assert_eq!(sla.targets.len(), 4);
        assert_eq!(sla.targets[0].status, TargetStatus::Failing);
        assert_eq!(sla.targets[0].breaches, Some(2));
        assert_eq!(sla.targets[2].status, TargetStatus::Warning);
        assert_eq!(sla.targets[2].breaches, None);
    }

    #[test]
    fn test_sla_without_rows() {
        let sla = SlaMetrics::from_rows(&[], &[], now());
        assert_eq!(sla.shipping, 0.0);
        assert_eq!(sla.returns, 0.0);
        assert!((sla.otif - 31.4).abs() < 1e-9);
        assert_eq!(sla.breaches, 0);
        assert_eq!(sla.trend, Trend::Down);
    }

    #[test]
    fn test_target_classification() {
        assert_eq!(TargetStatus::classify(97.0, 97.0, 90.0), TargetStatus::Meeting);
        assert_eq!(TargetStatus::classify(90.0, 97.0, 90.0), TargetStatus::Warning);
        assert_eq!(TargetStatus::classify(89.9, 97.0, 90.0), TargetStatus::Failing);
    }

    #[test]
    fn test_trend_thresholds() {
        let mut orders = Vec::new();
        let mut returns = Vec::new();
        for _ in 0..10 {
            orders.push(row(json!({"order_status": "fulfilled", "created_date": "2026-10-19T06:00:00Z"})));
            returns.push(row(json!({"return_initialized_date": "2026-10-18"})));
        }
        let sla = SlaMetrics::from_rows(&orders, &returns, now());
        // (100 + 100 + 94.2) / 3
        assert!((sla.otif - 98.066_666).abs() < 1e-3);
        assert_eq!(sla.trend, Trend::Up);
        assert_eq!(sla.targets[3].status, TargetStatus::Meeting);
    }
}
