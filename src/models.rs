//! Data models for the operations dashboard.
//!
//! Rows coming back from the analytics service are kept as raw JSON objects;
//! only the shapes this tool produces itself (insight cards, workflow items)
//! get proper types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One row of a pipe response. Its shape belongs to the analytics service.
pub type Row = serde_json::Map<String, Value>;

/// Severity level of an insight card or priority of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity - informational, nice to act on
    Low,
    /// Medium severity - worth a workflow this week
    Medium,
    /// High severity - revenue at risk
    High,
    /// Critical severity - act now
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }

    /// Whether the card counts as an urgent issue on the dashboard.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "low" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

/// Envelope returned by every analytics pipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipeResponse {
    /// Result rows.
    #[serde(default)]
    pub data: Vec<Row>,
    /// Row count reported by the service.
    #[serde(default)]
    pub rows: u64,
    /// Query statistics.
    #[serde(default)]
    pub statistics: QueryStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryStatistics {
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub rows_read: u64,
    #[serde(default)]
    pub bytes_read: u64,
}

/// Outcome of a connection check, ready to show to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

/// A decision recommendation produced by one of the insight agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightCard {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Estimated dollar impact; sign is whatever the model chose.
    pub financial_impact: f64,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub suggested_actions: Vec<String>,
    pub root_cause: String,
    /// Sample of the rows the card was derived from.
    pub evidence_trail: Vec<Row>,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub agent_name: String,
}

/// Lifecycle of a locally tracked workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Proposed,
    Accepted,
    InProgress,
    Completed,
    Rejected,
}

impl WorkflowStatus {
    /// Completed and rejected workflows are closed.
    pub fn is_open(&self) -> bool {
        !matches!(self, WorkflowStatus::Completed | WorkflowStatus::Rejected)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Proposed => write!(f, "proposed"),
            WorkflowStatus::Accepted => write!(f, "accepted"),
            WorkflowStatus::InProgress => write!(f, "in progress"),
            WorkflowStatus::Completed => write!(f, "completed"),
            WorkflowStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// What kind of follow-up a workflow represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Replenishment,
    ReturnInvestigation,
    SlaEscalation,
    SupplierIssue,
    InventoryAudit,
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowType::Replenishment => write!(f, "Replenishment"),
            WorkflowType::ReturnInvestigation => write!(f, "Return Investigation"),
            WorkflowType::SlaEscalation => write!(f, "SLA Escalation"),
            WorkflowType::SupplierIssue => write!(f, "Supplier Issue"),
            WorkflowType::InventoryAudit => write!(f, "Inventory Audit"),
        }
    }
}

/// One entry in a workflow's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A task record created by the user, usually from an insight card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowItem {
    pub id: String,
    pub title: String,
    pub kind: WorkflowType,
    pub status: WorkflowStatus,
    pub priority: Severity,
    pub assigned_to: String,
    pub created_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    /// Percent complete, `0..=100`.
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_insight: Option<String>,
    #[serde(default)]
    pub description: String,
    pub financial_impact: f64,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
}

impl WorkflowItem {
    /// Past its due date and still not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && self.status != WorkflowStatus::Completed
    }
}
