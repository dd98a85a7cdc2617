//! Insight agents.
//!
//! An agent is a prompt plus a little metadata. Every agent goes through the
//! same completion call; only the text and the row sampling differ.

use super::client::{ChatMessage, CompletionClient, LlmError};
use super::parse::{parse_insights, CardStamp, ParseError};
use crate::models::{InsightCard, Row};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum InsightError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("could not read insights from model reply: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightAgent {
    OverviewMonitor,
    OrderFlow,
    SkuHealth,
    ReturnsInsight,
    InboundShipments,
    Replenishment,
    SlaWatchdog,
}

/// A block of rows in the prompt.
struct Section {
    label: &'static str,
    /// Leading rows serialized into the prompt.
    prompt_rows: usize,
    /// Leading rows attached to each card as evidence.
    evidence_rows: usize,
}

const fn section(label: &'static str, prompt_rows: usize, evidence_rows: usize) -> Section {
    Section {
        label,
        prompt_rows,
        evidence_rows,
    }
}

const OVERVIEW_SECTIONS: &[Section] = &[section("Data Summary", 10, 5)];
const ORDER_SECTIONS: &[Section] = &[section("Order Data", 15, 5)];
const INVENTORY_SECTIONS: &[Section] = &[section("Inventory Data", 15, 5)];
const RETURNS_SECTIONS: &[Section] = &[section("Returns Data", 15, 5)];
const INBOUND_SECTIONS: &[Section] = &[section("Inbound Shipments Data", 15, 5)];
const REPLENISHMENT_SECTIONS: &[Section] = &[
    section("Inbound Shipment Data", 10, 3),
    section("Inventory Data", 10, 3),
];
const SLA_SECTIONS: &[Section] = &[
    section("Order Data", 8, 3),
    section("Shipment Data", 8, 3),
    section("Returns Data", 8, 0),
];

const CARD_SHAPE: &str = r#"Return a JSON array and nothing else, using exactly this shape:
[{
  "title": "Short decision title",
  "description": "The operational decision that needs to be made",
  "financialImpact": 12500,
  "severity": "critical|high|medium|low",
  "tags": ["short", "tags"],
  "suggestedActions": ["Create Workflow", "Escalate Decision"],
  "rootCause": "Why the decision is needed, with the dollar context"
}]"#;

impl InsightAgent {
    pub fn name(&self) -> &'static str {
        match self {
            InsightAgent::OverviewMonitor => "OverviewMonitorAgent",
            InsightAgent::OrderFlow => "OrderFlowAgent",
            InsightAgent::SkuHealth => "SKUHealthAgent",
            InsightAgent::ReturnsInsight => "ReturnsInsightAgent",
            InsightAgent::InboundShipments => "InboundShipmentsAgent",
            InsightAgent::Replenishment => "ReplenishmentAgent",
            InsightAgent::SlaWatchdog => "SLAWatchdogAgent",
        }
    }

    pub fn id_prefix(&self) -> &'static str {
        match self {
            InsightAgent::OverviewMonitor => "overview",
            InsightAgent::OrderFlow => "orderflow",
            InsightAgent::SkuHealth => "inventory",
            InsightAgent::ReturnsInsight => "returns",
            InsightAgent::InboundShipments => "inbound",
            InsightAgent::Replenishment => "replenishment",
            InsightAgent::SlaWatchdog => "sla",
        }
    }

    /// Confidence given to cards when the model doesn't state one.
    pub fn confidence(&self) -> f64 {
        match self {
            InsightAgent::OverviewMonitor => 0.85,
            InsightAgent::OrderFlow => 0.80,
            InsightAgent::SkuHealth => 0.90,
            InsightAgent::ReturnsInsight => 0.85,
            InsightAgent::InboundShipments => 0.85,
            InsightAgent::Replenishment => 0.92,
            InsightAgent::SlaWatchdog => 0.88,
        }
    }

    fn sections(&self) -> &'static [Section] {
        match self {
            InsightAgent::OverviewMonitor => OVERVIEW_SECTIONS,
            InsightAgent::OrderFlow => ORDER_SECTIONS,
            InsightAgent::SkuHealth => INVENTORY_SECTIONS,
            InsightAgent::ReturnsInsight => RETURNS_SECTIONS,
            InsightAgent::InboundShipments => INBOUND_SECTIONS,
            InsightAgent::Replenishment => REPLENISHMENT_SECTIONS,
            InsightAgent::SlaWatchdog => SLA_SECTIONS,
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            InsightAgent::OverviewMonitor => {
                "You are an expert business intelligence analyst. Always respond with valid JSON."
            }
            InsightAgent::OrderFlow => {
                "You are an order fulfillment expert. Always respond with valid JSON."
            }
            InsightAgent::SkuHealth => {
                "You are an inventory management expert. Always respond with valid JSON."
            }
            InsightAgent::ReturnsInsight => {
                "You are a returns analysis expert. Always respond with valid JSON."
            }
            InsightAgent::InboundShipments => {
                "You are an expert supply chain decision engine. Always respond with valid JSON."
            }
            InsightAgent::Replenishment => {
                "You are a supply chain expert. Always respond with valid JSON."
            }
            InsightAgent::SlaWatchdog => {
                "You are an SLA monitoring expert. Always respond with valid JSON."
            }
        }
    }

    fn brief(&self) -> &'static str {
        match self {
            InsightAgent::OverviewMonitor => {
                "Review this cross-functional operational data and recommend workflow decisions."
            }
            InsightAgent::OrderFlow => {
                "Review order flow data and find channel-specific anomalies."
            }
            InsightAgent::SkuHealth => "Review inventory health by SKU.",
            InsightAgent::ReturnsInsight => "Review return patterns and return processing.",
            InsightAgent::InboundShipments => {
                "Review inbound shipments and recommend receiving and vendor workflows."
            }
            InsightAgent::Replenishment => {
                "Review replenishment needs and supply chain risk from inbound supply versus stock."
            }
            InsightAgent::SlaWatchdog => {
                "Review SLA performance across shipping, returns and receiving."
            }
        }
    }

    fn focus(&self) -> &'static [&'static str] {
        match self {
            InsightAgent::OverviewMonitor => &[
                "Revenue-impacting decisions that need immediate workflow automation",
                "Supply chain decisions that need an escalation workflow",
                "Inventory decisions that need restocking or markdown",
                "SLA decisions that need vendor or process changes",
            ],
            InsightAgent::OrderFlow => &[
                "Cancel rate spikes by channel",
                "Shipping method mismatches",
                "Carrier performance problems",
                "Revenue lost to delays",
            ],
            InsightAgent::SkuHealth => &[
                "SKUs with critical stock (under 7 days on hand)",
                "Overstocked SKUs (over 4x normal levels)",
                "Unfulfillable versus committed stock mismatches",
                "Revenue at risk from stockouts",
            ],
            InsightAgent::ReturnsInsight => &[
                "SKUs with return rate spikes",
                "Clusters of return reasons",
                "Restocking fees that were never billed",
                "Return processing SLA breaches",
                "Revenue lost to returns",
            ],
            InsightAgent::InboundShipments => &[
                "Delayed POs that need vendor escalation",
                "Receiving capacity against expected quantities",
                "SKUs stuck in receiving",
                "Supplier performance problems",
            ],
            InsightAgent::Replenishment => &[
                "SKUs forecast to stock out",
                "Delayed inbound shipments",
                "Reorder point breaches",
                "Demand versus supply mismatches",
                "Dollar impact of stockouts",
            ],
            InsightAgent::SlaWatchdog => &[
                "Shipping SLA breaches",
                "Return processing delays",
                "On Time In Full (OTIF) performance",
                "Repeated SLA failures",
                "Contract compliance risk",
            ],
        }
    }

    /// Build the user prompt. Missing datasets count as empty.
    pub fn build_prompt(&self, datasets: &[&[Row]]) -> String {
        let mut prompt = String::new();
        prompt.push_str(&format!(
            "You are the {} for BrandBuddy, a decision engine that recommends and automates operational workflows. It is not a BI dashboard.\n\n",
            self.name()
        ));
        prompt.push_str(self.brief());
        prompt.push_str("\n\n");

        for (i, section) in self.sections().iter().enumerate() {
            let rows = datasets.get(i).copied().unwrap_or(&[]);
            let sample = &rows[..rows.len().min(section.prompt_rows)];
            let json = serde_json::to_string_pretty(sample).unwrap_or_else(|_| "[]".to_string());
            prompt.push_str(&format!("{}:\n{}\n\n", section.label, json));
        }

        prompt.push_str("For each recommendation: what happened, why it matters in dollars, what should be done, and how confident you are.\n\n");
        prompt.push_str("Focus on:\n");
        for item in self.focus() {
            prompt.push_str(&format!("- {}\n", item));
        }
        prompt.push_str("\nGenerate 2-4 actionable insights with financial impact estimates.\n");
        prompt.push_str(CARD_SHAPE);
        prompt.push('\n');

        prompt
    }

    /// Rows attached to each card as its evidence trail.
    pub fn evidence(&self, datasets: &[&[Row]]) -> Vec<Row> {
        self.sections()
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                let rows = datasets.get(i).copied().unwrap_or(&[]);
                rows.iter().take(section.evidence_rows).cloned()
            })
            .collect()
    }

    pub fn messages(&self, datasets: &[&[Row]]) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.build_prompt(datasets)),
        ]
    }
}

/// Runs agents against the completion endpoint.
pub struct InsightGenerator {
    client: CompletionClient,
    show_progress: bool,
}

impl InsightGenerator {
    pub fn new(client: CompletionClient, show_progress: bool) -> Self {
        Self {
            client,
            show_progress,
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Generate cards, surfacing any failure.
    pub async fn try_generate(
        &self,
        agent: InsightAgent,
        datasets: &[&[Row]],
    ) -> Result<Vec<InsightCard>, InsightError> {
        let messages = agent.messages(datasets);
        debug!(
            "{} prompt is {} chars",
            agent.name(),
            messages[1].content.len()
        );

        let reply = self.client.complete(&messages).await?;
        let evidence = agent.evidence(datasets);
        let stamp = CardStamp {
            agent_name: agent.name(),
            id_prefix: agent.id_prefix(),
            default_confidence: agent.confidence(),
            issued_at: Utc::now().timestamp_millis(),
            evidence: &evidence,
        };

        let cards = parse_insights(&reply, &stamp)?;
        info!("{} produced {} insight cards", agent.name(), cards.len());
        Ok(cards)
    }

    /// Generate cards; any failure is logged and yields no cards.
    pub async fn generate(&self, agent: InsightAgent, datasets: &[&[Row]]) -> Vec<InsightCard> {
        let spinner = self.spinner(agent);
        let result = self.try_generate(agent, datasets).await;
        spinner.finish_and_clear();

        match result {
            Ok(cards) => cards,
            Err(e) => {
                warn!("Error generating {} insights: {}", agent.name(), e);
                Vec::new()
            }
        }
    }

    fn spinner(&self, agent: InsightAgent) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("{} is thinking...", agent.name()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}
