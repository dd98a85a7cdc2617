//! Page composition.
//!
//! A page fetches its pipes (concurrently when they are independent), turns
//! the rows into tiles, asks one agent for insight cards and hands back a
//! [`PageView`] for the report layer. A failed fetch fails the page; a failed
//! insight call only leaves the card list empty.

pub mod pages;

use crate::analytics::{describe_failure, AnalyticsClient, AnalyticsError, Pipe};
use crate::llm::InsightGenerator;
use crate::metrics::sla::SlaTarget;
use crate::metrics::Tile;
use crate::models::{InsightCard, Row, Severity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Could not load the {page} page from {pipe}: {advice}")]
pub struct PageError {
    pub page: &'static str,
    pub pipe: Pipe,
    pub advice: String,
    #[source]
    pub source: AnalyticsError,
}

impl PageError {
    fn fetch(page: &'static str, pipe: Pipe) -> impl FnOnce(AnalyticsError) -> Self {
        move |source| PageError {
            page,
            pipe,
            advice: describe_failure(&source),
            source,
        }
    }
}

/// Leading rows of a page's main dataset.
#[derive(Debug, Clone, Serialize)]
pub struct RowTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowTable {
    /// Keep the `preferred` columns that appear in any row. With none of them
    /// present, fall back to the first row's own keys.
    pub fn new(title: impl Into<String>, preferred: &[&str], rows: &[Row]) -> Self {
        let mut columns: Vec<String> = preferred
            .iter()
            .filter(|c| rows.iter().any(|r| r.contains_key(**c)))
            .map(|c| c.to_string())
            .collect();
        if columns.is_empty() {
            if let Some(first) = rows.first() {
                columns = first.keys().take(6).cloned().collect();
            }
        }

        Self {
            title: title.into(),
            columns,
            rows: rows.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub title: String,
    pub subtitle: String,
    pub tiles: Vec<Tile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<SlaTarget>,
    pub insights: Vec<InsightCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<RowTable>,
    pub generated_at: DateTime<Utc>,
}

impl PageView {
    /// Highest card severity on the page.
    pub fn max_severity(&self) -> Option<Severity> {
        self.insights.iter().map(|c| c.severity).max()
    }
}

/// Services and per-run settings shared by every page.
pub struct PageContext<'a> {
    pub analytics: &'a AnalyticsClient,
    pub generator: &'a InsightGenerator,
    pub brand: Option<String>,
    pub now: DateTime<Utc>,
}

impl<'a> PageContext<'a> {
    pub fn new(
        analytics: &'a AnalyticsClient,
        generator: &'a InsightGenerator,
        brand: Option<String>,
    ) -> Self {
        Self {
            analytics,
            generator,
            brand,
            now: Utc::now(),
        }
    }
}
