//! HTTP client for the analytics pipes.
//!
//! Every call is a bearer-authenticated GET of `/v0/pipes/{pipe}.json`; the
//! JSON envelope is returned as-is.

use super::filters::{Pipe, PipeFilters};
use crate::config::AnalyticsConfig;
use crate::models::{ConnectionStatus, PipeResponse};
use chrono::{NaiveDate, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("No analytics credentials configured. Set analytics.token in .brandbuddy.toml or BRANDBUDDY_ANALYTICS_TOKEN")]
    NotConfigured,

    #[error("Analytics API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to reach analytics service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response from {pipe}: {source}")]
    Decode {
        pipe: Pipe,
        #[source]
        source: serde_json::Error,
    },
}

pub struct AnalyticsClient {
    http_client: reqwest::Client,
    pipes_url: String,
    token: String,
}

impl AnalyticsClient {
    pub fn new(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            pipes_url: format!("{}/v0/pipes", config.base_url.trim_end_matches('/')),
            token: config.token.trim().to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    /// Query a pipe and return its envelope unchanged.
    pub async fn fetch_pipe(
        &self,
        pipe: Pipe,
        filters: &PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        if !self.is_configured() {
            return Err(AnalyticsError::NotConfigured);
        }

        let url = format!("{}/{}.json", self.pipes_url, pipe.name());
        debug!("GET {} {:?}", url, filters);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .query(filters)
            .send()
            .await
            .inspect_err(|e| warn!("Analytics call failed for {}: {}", pipe, e))?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Analytics API returned {} for {}", status, pipe);
            return Err(AnalyticsError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: PipeResponse = serde_json::from_str(&body)
            .map_err(|source| AnalyticsError::Decode { pipe, source })?;

        debug!(
            "{} returned {} rows in {:.3}s",
            pipe,
            envelope.data.len(),
            envelope.statistics.elapsed
        );

        Ok(envelope)
    }

    pub async fn inbound_shipments(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        self.fetch_pipe(Pipe::InboundShipments, &filters).await
    }

    pub async fn inventory_health(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        self.fetch_pipe(Pipe::InventoryHealth, &filters).await
    }

    /// Order details; defaults to the last two years when no dates are given.
    pub async fn order_details(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        let filters = filters.with_default_window(today());
        self.fetch_pipe(Pipe::OrderDetails, &filters).await
    }

    pub async fn order_shipments(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        self.fetch_pipe(Pipe::OrderShipments, &filters).await
    }

    pub async fn product_details(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        self.fetch_pipe(Pipe::ProductDetails, &filters).await
    }

    /// Returns details; defaults to the last two years when no dates are given.
    pub async fn returns_details(
        &self,
        filters: PipeFilters,
    ) -> Result<PipeResponse, AnalyticsError> {
        let filters = filters.with_default_window(today());
        self.fetch_pipe(Pipe::ReturnsDetails, &filters).await
    }

    /// Check credentials with a one-row order query.
    pub async fn test_connection(&self) -> ConnectionStatus {
        if !self.is_configured() {
            return ConnectionStatus {
                success: false,
                rows: None,
                error: Some("No credentials configured".to_string()),
                message: "Please configure your analytics API token to test the connection"
                    .to_string(),
            };
        }

        match self.fetch_pipe(Pipe::OrderDetails, &PipeFilters::new().limit(1)).await {
            Ok(result) => {
                info!("Analytics connection OK ({} rows)", result.rows);
                ConnectionStatus {
                    success: true,
                    rows: Some(result.rows),
                    error: None,
                    message: format!(
                        "Connected to analytics service successfully! Found {} records.",
                        crate::report::format::thousands(result.rows as f64)
                    ),
                }
            }
            Err(e) => {
                warn!("Analytics connection test failed: {}", e);
                ConnectionStatus {
                    success: false,
                    rows: None,
                    error: Some(e.to_string()),
                    message: describe_failure(&e),
                }
            }
        }
    }
}

/// Turn an error into advice the user can act on.
pub fn describe_failure(error: &AnalyticsError) -> String {
    match error {
        AnalyticsError::NotConfigured => {
            "Please configure your analytics API token in .brandbuddy.toml".to_string()
        }
        AnalyticsError::Http { status: 401 | 403, .. } => {
            "Authentication failed - please check your API token".to_string()
        }
        AnalyticsError::Http { status: 404, .. } => {
            "API endpoint not found - please check your base URL".to_string()
        }
        AnalyticsError::Transport(e) if e.is_connect() || e.is_timeout() => {
            "Network error - please check your connection and try again".to_string()
        }
        other => other.to_string(),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, token: &str) -> AnalyticsClient {
        let config = AnalyticsConfig {
            token: token.to_string(),
            base_url: format!("{}/", server.base_url()),
            timeout_seconds: 5,
        };
        AnalyticsClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_pipe_sends_bearer_and_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v0/pipes/inventory_health_check_mv.json")
                .header("Authorization", "Bearer p.test")
                .query_param("brandId", "b1")
                .query_param("limit", "30");
            then.status(200).json_body(json!({
                "data": [{"sku": "SKU-1", "days_on_hand": 3}],
                "rows": 1,
                "statistics": {"elapsed": 0.01, "rows_read": 10, "bytes_read": 512}
            }));
        });

        let client = client_for(&server, "p.test");
        let response = client
            .inventory_health(PipeFilters::new().limit(30).brand(Some("b1".to_string())))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.rows, 1);
        assert_eq!(response.data[0]["sku"], "SKU-1");
        assert_eq!(response.statistics.bytes_read, 512);
    }

    #[tokio::test]
    async fn test_order_details_gets_default_window() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v0/pipes/order_details_mv.json")
                .query_param_exists("startDate")
                .query_param_exists("endDate");
            then.status(200).json_body(json!({"data": [], "rows": 0}));
        });

        let client = client_for(&server, "p.test");
        let response = client.order_details(PipeFilters::new()).await.unwrap();

        mock.assert();
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let client = client_for(&server, "   ");
        let err = client
            .order_shipments(PipeFilters::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyticsError::NotConfigured));
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_http_error_keeps_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v0/pipes/returns_details_mv.json");
            then.status(403).body("invalid token");
        });

        let client = client_for(&server, "p.bad");
        let err = client.returns_details(PipeFilters::new()).await.unwrap_err();

        match &err {
            AnalyticsError::Http { status, body } => {
                assert_eq!(*status, 403);
                assert_eq!(body, "invalid token");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(describe_failure(&err).contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v0/pipes/inbound_shipments_details_mv.json");
            then.status(200).body("<html>oops</html>");
        });

        let client = client_for(&server, "p.test");
        let err = client
            .inbound_shipments(PipeFilters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Decode { pipe: Pipe::InboundShipments, .. }));
    }

    #[tokio::test]
    async fn test_connection_reports_rows() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v0/pipes/order_details_mv.json")
                .query_param("limit", "1");
            then.status(200)
                .json_body(json!({"data": [{"order_id": "o1"}], "rows": 12500}));
        });

        let status = client_for(&server, "p.test").test_connection().await;
        assert!(status.success);
        assert_eq!(status.rows, Some(12500));
        assert!(status.message.contains("12,500"));
    }

    #[tokio::test]
    async fn test_connection_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.any_request();
            then.status(404).body("no such pipe");
        });

        let status = client_for(&server, "p.test").test_connection().await;
        assert!(!status.success);
        assert!(status.message.contains("endpoint not found"));
    }

    #[test]
    fn test_connection_without_token() {
        let server = MockServer::start();
        let status = tokio_test::block_on(client_for(&server, "").test_connection());
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("No credentials configured"));
    }
}
