//! Named pipes and the query parameters they accept.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::fmt;

/// The fixed set of pre-aggregated queries exposed by the analytics service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipe {
    InboundShipments,
    InventoryHealth,
    OrderDetails,
    OrderShipments,
    ProductDetails,
    ReturnsDetails,
}

impl Pipe {
    pub const ALL: [Pipe; 6] = [
        Pipe::InboundShipments,
        Pipe::InventoryHealth,
        Pipe::OrderDetails,
        Pipe::OrderShipments,
        Pipe::ProductDetails,
        Pipe::ReturnsDetails,
    ];

    /// Wire name of the pipe.
    pub fn name(&self) -> &'static str {
        match self {
            Pipe::InboundShipments => "inbound_shipments_details_mv",
            Pipe::InventoryHealth => "inventory_health_check_mv",
            Pipe::OrderDetails => "order_details_mv",
            Pipe::OrderShipments => "order_shipments_mv",
            Pipe::ProductDetails => "product_details_mv",
            Pipe::ReturnsDetails => "returns_details_mv",
        }
    }

    /// Resolve a wire name. Anything outside the allow-list is rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Pipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional filter parameters. Unset fields are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl PipeFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn brand(mut self, brand_id: Option<String>) -> Self {
        self.brand_id = brand_id;
        self
    }

    pub fn warehouse(mut self, warehouse_id: Option<String>) -> Self {
        self.warehouse_id = warehouse_id;
        self
    }

    pub fn sku(mut self, product_sku: Option<String>) -> Self {
        self.product_sku = product_sku;
        self
    }

    pub fn channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    pub fn status(mut self, status: Option<String>) -> Self {
        self.status = status;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Restrict to the `days` days ending on `today`.
    pub fn last_days(mut self, today: NaiveDate, days: i64) -> Self {
        self.start_date = Some(today - chrono::Duration::days(days));
        self.end_date = Some(today);
        self
    }

    /// When no date bound is set, default to the two years ending `today`.
    pub fn with_default_window(mut self, today: NaiveDate) -> Self {
        if self.start_date.is_none() && self.end_date.is_none() {
            let start = today
                .checked_sub_months(Months::new(24))
                .unwrap_or(today - chrono::Duration::days(730));
            self.start_date = Some(start);
            self.end_date = Some(today);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_pipe_allow_list() {
        assert_eq!(Pipe::from_name("order_details_mv"), Some(Pipe::OrderDetails));
        assert_eq!(Pipe::from_name("returns_details_mv"), Some(Pipe::ReturnsDetails));
        assert_eq!(Pipe::from_name("users; drop table"), None);
        assert_eq!(Pipe::ALL.len(), 6);
    }

    #[test]
    fn test_filters_serialize_camel_case_and_skip_unset() {
        let filters = PipeFilters::new()
            .limit(50)
            .brand(Some("brand-7".to_string()))
            .warehouse(None)
            .active(true);
        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["brandId"], "brand-7");
        assert_eq!(value["limit"], 50);
        assert!(value.get("warehouseId").is_none());
        assert!(value.get("startDate").is_none());
    }

    #[test]
    fn test_default_window_is_two_years() {
        let filters = PipeFilters::new().with_default_window(day("2026-10-19"));
        assert_eq!(filters.start_date, Some(day("2024-10-19")));
        assert_eq!(filters.end_date, Some(day("2026-10-19")));

        let value = serde_json::to_value(&filters).unwrap();
        assert_eq!(value["startDate"], "2024-10-19");
    }

    #[test]
    fn test_default_window_keeps_explicit_range() {
        let filters = PipeFilters::new()
            .last_days(day("2026-10-19"), 7)
            .with_default_window(day("2026-10-19"));
        assert_eq!(filters.start_date, Some(day("2026-10-12")));
    }
}
