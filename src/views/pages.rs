//! One function per page.

use super::{PageContext, PageError, PageView, RowTable};
use crate::analytics::{Pipe, PipeFilters};
use crate::cli::Timeframe;
use crate::llm::InsightAgent;
use crate::metrics::inbound::InboundMetrics;
use crate::metrics::insights::InsightSummary;
use crate::metrics::inventory::InventoryMetrics;
use crate::metrics::orders::OrderMetrics;
use crate::metrics::returns::ReturnsMetrics;
use crate::metrics::rows::number;
use crate::metrics::sla::SlaMetrics;
use crate::metrics::Tile;
use crate::models::Row;
use tracing::{info, warn};

const ORDER_COLUMNS: &[&str] = &[
    "order_id",
    "channel",
    "order_status",
    "created_date",
    "carrier",
    "total_amount",
];
const INVENTORY_COLUMNS: &[&str] = &[
    "sku",
    "warehouse_id",
    "on_hand_quantity",
    "days_on_hand",
    "unfulfillable_quantity",
];
const INBOUND_COLUMNS: &[&str] = &[
    "shipment_id",
    "sku",
    "status",
    "expected_arrival_date",
    "arrival_date",
    "expected_quantity",
];
const RETURN_COLUMNS: &[&str] = &[
    "return_id",
    "order_id",
    "sku",
    "status",
    "return_reason",
    "return_initialized_date",
    "refund_amount",
];

impl PageContext<'_> {
    fn filters(&self) -> PipeFilters {
        PipeFilters::new().brand(self.brand.clone())
    }

    fn window(&self, timeframe: Timeframe) -> PipeFilters {
        self.filters().last_days(self.now.date_naive(), timeframe.days())
    }

    fn view(&self, page: &'static str, title: &str, subtitle: impl Into<String>) -> PageView {
        PageView {
            page,
            title: title.to_string(),
            subtitle: subtitle.into(),
            tiles: Vec::new(),
            targets: Vec::new(),
            insights: Vec::new(),
            table: None,
            generated_at: self.now,
        }
    }

    /// Cross-functional overview.
    pub async fn dashboard(&self) -> Result<PageView, PageError> {
        const PAGE: &str = "dashboard";
        let (orders, inventory, inbound) = tokio::try_join!(
            async {
                self.analytics
                    .order_details(self.filters().limit(50))
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::OrderDetails))
            },
            async {
                self.analytics
                    .inventory_health(self.filters().limit(30))
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::InventoryHealth))
            },
            async {
                self.analytics
                    .inbound_shipments(self.filters().limit(25))
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::InboundShipments))
            },
        )?;

        let combined = overview_sample(&orders.data, &inventory.data, &inbound.data);
        info!(
            "Dashboard sampled {} orders, {} SKUs, {} inbound lines",
            orders.data.len(),
            inventory.data.len(),
            inbound.data.len()
        );

        let mut view = self.view(
            PAGE,
            "Decision Overview",
            "Operational decisions across orders, inventory and inbound supply",
        );
        view.insights = self
            .generator
            .generate(InsightAgent::OverviewMonitor, &[&combined])
            .await;
        view.tiles = InsightSummary::from_cards(&view.insights).tiles();
        Ok(view)
    }

    pub async fn orders(&self, channel: Option<String>) -> Result<PageView, PageError> {
        const PAGE: &str = "orders";
        let subtitle = match channel {
            Some(ref c) => format!("Fulfillment performance on {}", c),
            None => "Fulfillment performance across all channels".to_string(),
        };

        let orders = self
            .analytics
            .order_details(self.filters().limit(100).channel(channel))
            .await
            .map_err(PageError::fetch(PAGE, Pipe::OrderDetails))?;

        let mut view = self.view(PAGE, "Orders", subtitle);
        view.tiles = OrderMetrics::from_rows(&orders.data, self.now).tiles();
        view.insights = self
            .generator
            .generate(InsightAgent::OrderFlow, &[&orders.data])
            .await;
        view.table = Some(RowTable::new("Recent Orders", ORDER_COLUMNS, &orders.data));
        Ok(view)
    }

    pub async fn inventory(
        &self,
        warehouse: Option<String>,
        sku: Option<String>,
    ) -> Result<PageView, PageError> {
        const PAGE: &str = "inventory";
        let health_filters = self.filters().limit(100).warehouse(warehouse).sku(sku);

        // The product count is a side tile; only the health data can fail the page.
        let (health, products) = tokio::join!(
            self.analytics.inventory_health(health_filters),
            self.analytics
                .product_details(self.filters().limit(100).active(true)),
        );
        let health = health.map_err(PageError::fetch(PAGE, Pipe::InventoryHealth))?;

        let mut view = self.view(PAGE, "Inventory Health", "Stock cover and risk by SKU");
        view.tiles = InventoryMetrics::from_rows(&health.data).tiles();
        match products {
            Ok(products) => view
                .tiles
                .push(Tile::count("Active Products", products.data.len())),
            Err(e) => warn!("Active product count unavailable: {}", e),
        }
        view.insights = self
            .generator
            .generate(InsightAgent::SkuHealth, &[&health.data])
            .await;
        view.table = Some(RowTable::new("SKU Health", INVENTORY_COLUMNS, &health.data));
        Ok(view)
    }

    pub async fn inbound(
        &self,
        warehouse: Option<String>,
        status: Option<String>,
    ) -> Result<PageView, PageError> {
        const PAGE: &str = "inbound";
        let inbound = self
            .analytics
            .inbound_shipments(self.filters().limit(100).warehouse(warehouse).status(status))
            .await
            .map_err(PageError::fetch(PAGE, Pipe::InboundShipments))?;

        let mut view = self.view(
            PAGE,
            "Inbound Shipments",
            "Receiving workload and vendor performance",
        );
        view.tiles = InboundMetrics::from_rows(&inbound.data, self.now).tiles();
        view.insights = self
            .generator
            .generate(InsightAgent::InboundShipments, &[&inbound.data])
            .await;
        view.table = Some(RowTable::new("Shipment Lines", INBOUND_COLUMNS, &inbound.data));
        Ok(view)
    }

    pub async fn returns(
        &self,
        timeframe: Timeframe,
        status: Option<String>,
    ) -> Result<PageView, PageError> {
        const PAGE: &str = "returns";
        let returns = self
            .analytics
            .returns_details(self.window(timeframe).limit(100).status(status))
            .await
            .map_err(PageError::fetch(PAGE, Pipe::ReturnsDetails))?;

        let mut view = self.view(PAGE, "Returns", timeframe.label());
        view.tiles = ReturnsMetrics::from_rows(&returns.data).tiles();
        view.insights = self
            .generator
            .generate(InsightAgent::ReturnsInsight, &[&returns.data])
            .await;
        view.table = Some(RowTable::new("Recent Returns", RETURN_COLUMNS, &returns.data));
        Ok(view)
    }

    /// Inbound supply against stock cover.
    pub async fn replenishment(&self) -> Result<PageView, PageError> {
        const PAGE: &str = "replenishment";
        let (inbound, inventory) = tokio::try_join!(
            async {
                self.analytics
                    .inbound_shipments(self.filters().limit(100))
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::InboundShipments))
            },
            async {
                self.analytics
                    .inventory_health(self.filters().limit(100))
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::InventoryHealth))
            },
        )?;

        let stock = InventoryMetrics::from_rows(&inventory.data);
        let supply = InboundMetrics::from_rows(&inbound.data, self.now);

        let mut view = self.view(
            PAGE,
            "Replenishment",
            "Stockout risk against inbound supply",
        );
        view.tiles = vec![
            Tile::count("Critical Stock", stock.critical).with_detail("<7 days on hand"),
            Tile::count("Overstocked", stock.overstocked),
            Tile::count("Delayed Inbound", supply.delayed),
            Tile::percent("Inbound On-Time", supply.on_time_rate),
        ];
        view.insights = self
            .generator
            .generate(InsightAgent::Replenishment, &[&inbound.data, &inventory.data])
            .await;
        view.table = Some(RowTable::new(
            "Lowest Cover SKUs",
            INVENTORY_COLUMNS,
            &lowest_cover(inventory.data),
        ));
        Ok(view)
    }

    pub async fn sla(&self, timeframe: Timeframe) -> Result<PageView, PageError> {
        const PAGE: &str = "sla";
        let filters = self.window(timeframe).limit(100);

        let (orders, shipments, returns) = tokio::try_join!(
            async {
                self.analytics
                    .order_details(filters.clone())
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::OrderDetails))
            },
            async {
                self.analytics
                    .order_shipments(filters.clone())
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::OrderShipments))
            },
            async {
                self.analytics
                    .returns_details(filters.clone())
                    .await
                    .map_err(PageError::fetch(PAGE, Pipe::ReturnsDetails))
            },
        )?;

        let metrics = SlaMetrics::from_rows(&orders.data, &returns.data, self.now);

        let mut view = self.view(PAGE, "SLA Watchdog", timeframe.label());
        view.tiles = metrics.tiles();
        view.targets = metrics.targets;
        view.insights = self
            .generator
            .generate(
                InsightAgent::SlaWatchdog,
                &[&orders.data, &shipments.data, &returns.data],
            )
            .await;
        view.table = Some(RowTable::new("Orders in Window", ORDER_COLUMNS, &orders.data));
        Ok(view)
    }

    /// Dispatch by page name, as stored in the `default_view` preference.
    pub async fn by_name(&self, page: &str) -> Result<PageView, PageError> {
        match page {
            "orders" => self.orders(None).await,
            "inventory" => self.inventory(None, None).await,
            "inbound" => self.inbound(None, None).await,
            "returns" => self.returns(Timeframe::Month, None).await,
            "replenishment" => self.replenishment().await,
            "sla" => self.sla(Timeframe::Week).await,
            _ => self.dashboard().await,
        }
    }
}

/// Leading rows of each dataset combined for the overview agent.
fn overview_sample(orders: &[Row], inventory: &[Row], inbound: &[Row]) -> Vec<Row> {
    orders
        .iter()
        .take(15)
        .chain(inventory.iter().take(10))
        .chain(inbound.iter().take(10))
        .cloned()
        .collect()
}

/// Rows ordered by days on hand, lowest first; rows without a value last.
fn lowest_cover(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(|a, b| {
        let a = number(a, "days_on_hand").unwrap_or(f64::INFINITY);
        let b = number(b, "days_on_hand").unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsClient;
    use crate::config::{AnalyticsConfig, LlmConfig};
    use crate::llm::{CompletionClient, InsightGenerator};
    use crate::metrics::TileValue;
    use crate::models::Severity;
    use httpmock::prelude::*;
    use serde_json::json;

    fn clients(server: &MockServer) -> (AnalyticsClient, InsightGenerator) {
        let analytics = AnalyticsClient::new(&AnalyticsConfig {
            token: "p.test".to_string(),
            base_url: server.base_url(),
            timeout_seconds: 5,
        })
        .unwrap();
        let llm = CompletionClient::new(LlmConfig {
            api_key: "sk-test".to_string(),
            base_url: server.url("/v1"),
            timeout_seconds: 5,
            ..LlmConfig::default()
        })
        .unwrap();
        (analytics, InsightGenerator::new(llm, false))
    }

    fn mock_pipe(server: &MockServer, pipe: &str, data: serde_json::Value) {
        server.mock(|when, then| {
            when.method(GET).path(format!("/v0/pipes/{}.json", pipe));
            then.status(200).json_body(json!({ "data": data, "rows": 0 }));
        });
    }

    fn mock_reply(server: &MockServer, cards: serde_json::Value) {
        let content = cards.to_string();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": content}}]}));
        });
    }

    #[tokio::test]
    async fn test_orders_page() {
        let server = MockServer::start();
        mock_pipe(
            &server,
            "order_details_mv",
            json!([
                {"order_id": "o1", "channel": "amazon", "order_status": "fulfilled", "created_date": "2026-10-01"},
                {"order_id": "o2", "channel": "amazon", "order_status": "canceled", "created_date": "2026-10-02"}
            ]),
        );
        mock_reply(
            &server,
            json!([{"title": "Amazon cancels", "severity": "high", "financialImpact": 900}]),
        );

        let (analytics, generator) = clients(&server);
        let ctx = PageContext::new(&analytics, &generator, Some("b1".to_string()));
        let view = ctx.orders(Some("amazon".to_string())).await.unwrap();

        assert_eq!(view.page, "orders");
        assert_eq!(view.tiles[0].label, "Total Orders");
        assert_eq!(view.insights.len(), 1);
        assert_eq!(view.insights[0].agent_name, "OrderFlowAgent");
        assert_eq!(view.max_severity(), Some(Severity::High));

        let table = view.table.unwrap();
        assert_eq!(table.columns, ["order_id", "channel", "order_status", "created_date"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_insight_failure_keeps_page() {
        let server = MockServer::start();
        mock_pipe(&server, "inbound_shipments_details_mv", json!([{"shipment_id": "S1"}]));
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).body("boom");
        });

        let (analytics, generator) = clients(&server);
        let ctx = PageContext::new(&analytics, &generator, None);
        let view = ctx.inbound(None, None).await.unwrap();

        assert!(view.insights.is_empty());
        assert_eq!(view.tiles[0].label, "Inbound Lines");
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_page() {
        let server = MockServer::start();
        mock_pipe(&server, "order_details_mv", json!([]));
        mock_pipe(&server, "inventory_health_check_mv", json!([]));
        server.mock(|when, then| {
            when.method(GET).path("/v0/pipes/inbound_shipments_details_mv.json");
            then.status(401).body("bad token");
        });
        let llm = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200);
        });

        let (analytics, generator) = clients(&server);
        let ctx = PageContext::new(&analytics, &generator, None);
        let err = ctx.dashboard().await.unwrap_err();

        assert_eq!(err.pipe, Pipe::InboundShipments);
        assert!(err.to_string().contains("Authentication failed"));
        llm.assert_hits(0);
    }

    #[tokio::test]
    async fn test_sla_page_has_targets() {
        let server = MockServer::start();
        mock_pipe(&server, "order_details_mv", json!([]));
        mock_pipe(&server, "order_shipments_mv", json!([]));
        mock_pipe(&server, "returns_details_mv", json!([]));
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let ctx = PageContext::new(&analytics, &generator, None);
        let view = ctx.sla(Timeframe::Quarter).await.unwrap();

        assert_eq!(view.subtitle, "Last 90 Days");
        assert_eq!(view.targets.len(), 4);
        assert!(view.insights.is_empty());
    }

    #[tokio::test]
    async fn test_inventory_page_counts_active_products() {
        let server = MockServer::start();
        mock_pipe(
            &server,
            "inventory_health_check_mv",
            json!([{"sku": "A", "days_on_hand": 2}, {"sku": "B", "days_on_hand": 200}]),
        );
        let products = server.mock(|when, then| {
            when.method(GET)
                .path("/v0/pipes/product_details_mv.json")
                .query_param("active", "true");
            then.status(200)
                .json_body(json!({"data": [{"sku": "A"}, {"sku": "B"}, {"sku": "C"}]}));
        });
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let view = PageContext::new(&analytics, &generator, None)
            .inventory(None, None)
            .await
            .unwrap();

        products.assert();
        let active = view.tiles.iter().find(|t| t.label == "Active Products").unwrap();
        assert_eq!(active.value, TileValue::Count(3));
    }

    fn numbered(n: usize, key: &str) -> serde_json::Value {
        (0..n)
            .map(|i| json!({ key: format!("{}-{}", key, i) }))
            .collect()
    }

    #[tokio::test]
    async fn test_dashboard_tiles_come_from_cards() {
        let server = MockServer::start();
        mock_pipe(&server, "order_details_mv", numbered(20, "order_id"));
        mock_pipe(&server, "inventory_health_check_mv", numbered(12, "sku"));
        mock_pipe(&server, "inbound_shipments_details_mv", numbered(12, "shipment_id"));
        let llm = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("OverviewMonitorAgent");
            let content = json!([
                {"title": "Stockout", "severity": "critical", "financialImpact": -5000},
                {"title": "Overstock", "severity": "low", "financialImpact": 1000}
            ])
            .to_string();
            then.status(200)
                .json_body(json!({"choices": [{"message": {"content": content}}]}));
        });

        let (analytics, generator) = clients(&server);
        let view = PageContext::new(&analytics, &generator, None)
            .dashboard()
            .await
            .unwrap();

        llm.assert();
        assert_eq!(view.page, "dashboard");
        assert_eq!(view.insights.len(), 2);
        assert_eq!(view.tiles[0].value, TileValue::Money(6000.0));
        assert_eq!(view.tiles[1].value, TileValue::Count(1));
        assert_eq!(view.tiles[2].value, TileValue::Count(2));
        assert_eq!(
            view.tiles[2].detail.as_deref(),
            Some("1 urgent decision needs attention")
        );
        assert!(view.table.is_none());
    }

    #[test]
    fn test_overview_sample_takes_15_10_10() {
        let to_rows = |v: serde_json::Value| -> Vec<Row> {
            v.as_array()
                .unwrap()
                .iter()
                .map(|r| r.as_object().unwrap().clone())
                .collect()
        };
        let orders = to_rows(numbered(20, "order_id"));
        let inventory = to_rows(numbered(12, "sku"));
        let inbound = to_rows(numbered(12, "shipment_id"));

        let sample = overview_sample(&orders, &inventory, &inbound);
        assert_eq!(sample.len(), 35);
        assert_eq!(sample[14]["order_id"], "order_id-14");
        assert_eq!(sample[15]["sku"], "sku-0");
        assert_eq!(sample[25]["shipment_id"], "shipment_id-0");
    }

    #[tokio::test]
    async fn test_returns_page_uses_window_and_status() {
        let server = MockServer::start();
        let pipe = server.mock(|when, then| {
            when.method(GET)
                .path("/v0/pipes/returns_details_mv.json")
                .query_param("status", "pending")
                .query_param_exists("startDate")
                .query_param_exists("endDate");
            then.status(200).json_body(json!({"data": [
                {"return_id": "r1", "status": "pending", "return_reason": "damaged", "refund_amount": 40},
                {"return_id": "r2", "status": "pending", "return_reason": "damaged", "refund_amount": "60"}
            ]}));
        });
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let view = PageContext::new(&analytics, &generator, None)
            .returns(Timeframe::Month, Some("pending".to_string()))
            .await
            .unwrap();

        pipe.assert();
        assert_eq!(view.subtitle, "Last 30 Days");
        assert_eq!(view.tiles[0].value, TileValue::Count(2));
        assert_eq!(view.tiles[1].value, TileValue::Money(100.0));
        assert_eq!(view.tiles[2].detail.as_deref(), Some("damaged"));
    }

    #[tokio::test]
    async fn test_replenishment_page() {
        let server = MockServer::start();
        mock_pipe(
            &server,
            "inbound_shipments_details_mv",
            json!([{"shipment_id": "S1", "sku": "A", "status": "received"}]),
        );
        mock_pipe(
            &server,
            "inventory_health_check_mv",
            json!([{"sku": "A", "days_on_hand": 40}, {"sku": "B", "days_on_hand": 3}]),
        );
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let view = PageContext::new(&analytics, &generator, None)
            .replenishment()
            .await
            .unwrap();

        let labels: Vec<&str> = view.tiles.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Critical Stock", "Overstocked", "Delayed Inbound", "Inbound On-Time"]
        );
        assert_eq!(view.tiles[0].value, TileValue::Count(1));
        let table = view.table.unwrap();
        assert_eq!(table.rows[0]["sku"], "B");
    }

    #[tokio::test]
    async fn test_inventory_page_survives_product_failure() {
        let server = MockServer::start();
        mock_pipe(
            &server,
            "inventory_health_check_mv",
            json!([{"sku": "A", "days_on_hand": 2}]),
        );
        server.mock(|when, then| {
            when.method(GET).path("/v0/pipes/product_details_mv.json");
            then.status(500).body("pipe down");
        });
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let view = PageContext::new(&analytics, &generator, None)
            .inventory(None, None)
            .await
            .unwrap();

        assert_eq!(view.tiles[0].value, TileValue::Count(1));
        assert!(view.tiles.iter().all(|t| t.label != "Active Products"));
    }

    #[tokio::test]
    async fn test_by_name_opens_every_view() {
        let server = MockServer::start();
        for pipe in Pipe::ALL {
            mock_pipe(&server, pipe.name(), json!([]));
        }
        mock_reply(&server, json!([]));

        let (analytics, generator) = clients(&server);
        let ctx = PageContext::new(&analytics, &generator, None);
        for name in crate::config::VIEWS {
            let view = ctx.by_name(name).await.unwrap();
            assert_eq!(view.page, *name);
        }
    }

    #[test]
    fn test_lowest_cover_order() {
        let rows: Vec<Row> = [
            json!({"sku": "A", "days_on_hand": 30}),
            json!({"sku": "B"}),
            json!({"sku": "C", "days_on_hand": "4"}),
        ]
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();

        let sorted = lowest_cover(rows);
        let skus: Vec<&str> = sorted.iter().map(|r| r["sku"].as_str().unwrap()).collect();
        assert_eq!(skus, ["C", "A", "B"]);
    }

    #[test]
    fn test_table_columns_fallback() {
        let rows = vec![json!({"x": 1, "y": 2}).as_object().unwrap().clone()];
        let table = RowTable::new("Raw", ORDER_COLUMNS, &rows);
        assert_eq!(table.columns, ["x", "y"]);
    }
}
