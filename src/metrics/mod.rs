//! Summary tiles computed from already-aggregated pipe rows.
//!
//! Every function here is pure: rows and a reference time in, numbers out.

pub mod inbound;
pub mod insights;
pub mod inventory;
pub mod orders;
pub mod returns;
pub mod rows;
pub mod sla;

use serde::Serialize;

/// The kind of number a tile holds; decides how it is formatted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TileValue {
    Count(u64),
    Decimal(f64),
    Percent(f64),
    Money(f64),
}

/// A labelled summary number on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub label: String,
    pub value: TileValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Tile {
    pub fn new(label: impl Into<String>, value: TileValue) -> Self {
        Self {
            label: label.into(),
            value,
            detail: None,
        }
    }

    pub fn count(label: impl Into<String>, n: usize) -> Self {
        Self::new(label, TileValue::Count(n as u64))
    }

    pub fn percent(label: impl Into<String>, p: f64) -> Self {
        Self::new(label, TileValue::Percent(p))
    }

    pub fn money(label: impl Into<String>, amount: f64) -> Self {
        Self::new(label, TileValue::Money(amount))
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
