//! Roll-up of a page's insight cards.

use super::Tile;
use crate::models::InsightCard;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightSummary {
    pub cards: usize,
    /// Sum of absolute impacts; cards may report losses as negatives.
    pub total_impact: f64,
    pub urgent: usize,
}

impl InsightSummary {
    pub fn from_cards(cards: &[InsightCard]) -> Self {
        Self {
            cards: cards.len(),
            total_impact: cards.iter().map(|c| c.financial_impact.abs()).sum(),
            urgent: cards.iter().filter(|c| c.severity.is_urgent()).count(),
        }
    }

    pub fn status_line(&self) -> String {
        match self.urgent {
            0 if self.cards == 0 => "No decisions pending".to_string(),
            0 => "All systems operational".to_string(),
            1 => "1 urgent decision needs attention".to_string(),
            n => format!("{} urgent decisions need attention", n),
        }
    }

    pub fn tiles(&self) -> Vec<Tile> {
        vec![
            Tile::money("Total Impact", self.total_impact),
            Tile::count("Urgent Issues", self.urgent),
            Tile::count("Decisions", self.cards).with_detail(self.status_line()),
        ]
    }
}
