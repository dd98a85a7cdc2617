//! Creating, updating, listing and summarising workflow items.

use super::WorkflowError;
use crate::cli::WorkflowSort;
use crate::models::{AuditEntry, InsightCard, Severity, WorkflowItem, WorkflowStatus, WorkflowType};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Assignee of workflows nobody has picked up.
pub const UNASSIGNED: &str = "Unassigned";

const MANUAL_DUE_DAYS: i64 = 7;
const INSIGHT_DUE_DAYS: i64 = 3;

/// A user action on an existing workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    Acknowledge,
    Resolve,
    Reassign(String),
}

fn audit(
    item: &WorkflowItem,
    action: impl Into<String>,
    user: &str,
    now: DateTime<Utc>,
    details: Option<String>,
) -> AuditEntry {
    AuditEntry {
        id: format!("A{}", item.audit_trail.len() + 1),
        action: action.into(),
        user: user.to_string(),
        timestamp: now,
        details,
    }
}

/// A hand-written workflow.
pub fn create(
    title: &str,
    description: &str,
    financial_impact: f64,
    user: &str,
    now: DateTime<Utc>,
) -> WorkflowItem {
    let mut item = WorkflowItem {
        id: format!("WF-{}", now.timestamp_millis()),
        title: title.trim().to_string(),
        kind: WorkflowType::SupplierIssue,
        status: WorkflowStatus::Proposed,
        priority: Severity::Medium,
        assigned_to: UNASSIGNED.to_string(),
        created_date: now,
        due_date: now + Duration::days(MANUAL_DUE_DAYS),
        completed_date: None,
        progress: 0,
        linked_insight: None,
        description: description.to_string(),
        financial_impact,
        audit_trail: Vec::new(),
    };
    let entry = audit(&item, "Workflow Created", user, now, None);
    item.audit_trail.push(entry);
    item
}

/// A workflow proposed from an insight card.
pub fn from_insight(card: &InsightCard, user: &str, now: DateTime<Utc>) -> WorkflowItem {
    let priority = match card.severity {
        Severity::Critical | Severity::High => card.severity,
        _ => Severity::Medium,
    };

    let mut item = WorkflowItem {
        id: format!("WF-{}", now.timestamp_millis()),
        title: format!("Workflow: {}", card.title),
        kind: kind_for_agent(&card.agent_name),
        status: WorkflowStatus::Proposed,
        priority,
        assigned_to: UNASSIGNED.to_string(),
        created_date: now,
        due_date: now + Duration::days(INSIGHT_DUE_DAYS),
        completed_date: None,
        progress: 0,
        linked_insight: Some(card.id.clone()),
        description: card.description.clone(),
        financial_impact: card.financial_impact,
        audit_trail: Vec::new(),
    };
    let entry = audit(
        &item,
        "Workflow Created",
        user,
        now,
        Some(format!("From insight {} ({})", card.id, card.agent_name)),
    );
    item.audit_trail.push(entry);
    item
}

/// Which kind of workflow an agent's card most likely calls for.
fn kind_for_agent(agent_name: &str) -> WorkflowType {
    match agent_name {
        "ReplenishmentAgent" => WorkflowType::Replenishment,
        "SKUHealthAgent" => WorkflowType::InventoryAudit,
        "ReturnsInsightAgent" => WorkflowType::ReturnInvestigation,
        "SLAWatchdogAgent" | "FollowUpAgent" => WorkflowType::SlaEscalation,
        _ => WorkflowType::SupplierIssue,
    }
}

/// Apply `action` to `item`, recording it in the audit trail.
pub fn apply(
    item: &mut WorkflowItem,
    action: &WorkflowAction,
    user: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let entry = match action {
        WorkflowAction::Acknowledge => {
            if item.status != WorkflowStatus::Proposed {
                return Err(rejected(item, "acknowledge"));
            }
            item.status = WorkflowStatus::Accepted;
            audit(item, "Acknowledged", user, now, Some("Workflow accepted".to_string()))
        }
        WorkflowAction::Resolve => {
            // Only work somebody has accepted can be resolved.
            if !matches!(
                item.status,
                WorkflowStatus::Accepted | WorkflowStatus::InProgress
            ) {
                return Err(rejected(item, "resolve"));
            }
            item.status = WorkflowStatus::Completed;
            item.progress = 100;
            item.completed_date = Some(now);
            audit(item, "Resolved", user, now, Some("Workflow completed".to_string()))
        }
        WorkflowAction::Reassign(team) => {
            if !item.status.is_open() {
                return Err(rejected(item, "reassign"));
            }
            let previous = std::mem::replace(&mut item.assigned_to, team.trim().to_string());
            audit(
                item,
                format!("Reassigned to {}", item.assigned_to),
                user,
                now,
                Some(format!("Previously {}", previous)),
            )
        }
    };

    item.audit_trail.push(entry);
    Ok(())
}

fn rejected(item: &WorkflowItem, action: &str) -> WorkflowError {
    WorkflowError::InvalidTransition {
        id: item.id.clone(),
        status: item.status,
        action: action.to_string(),
    }
}

/// Filter by status and kind, then sort.
pub fn list<'a>(
    items: &'a [WorkflowItem],
    status: Option<WorkflowStatus>,
    kind: Option<WorkflowType>,
    sort: WorkflowSort,
) -> Vec<&'a WorkflowItem> {
    let mut selected: Vec<&WorkflowItem> = items
        .iter()
        .filter(|w| status.map_or(true, |s| w.status == s))
        .filter(|w| kind.map_or(true, |k| w.kind == k))
        .collect();

    match sort {
        WorkflowSort::Impact => {
            selected.sort_by(|a, b| b.financial_impact.total_cmp(&a.financial_impact))
        }
        WorkflowSort::Urgency => selected.sort_by(|a, b| b.priority.cmp(&a.priority)),
        WorkflowSort::Age => selected.sort_by_key(|w| w.created_date),
    }
    selected
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowMetrics {
    pub total: usize,
    pub open: usize,
    pub overdue: usize,
    pub completed_this_week: usize,
    pub completion_rate: f64,
}

impl WorkflowMetrics {
    pub fn from_items(items: &[WorkflowItem], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        let completed = items
            .iter()
            .filter(|w| w.status == WorkflowStatus::Completed)
            .count();

        Self {
            total: items.len(),
            open: items.iter().filter(|w| w.status.is_open()).count(),
            overdue: items.iter().filter(|w| w.is_overdue(now)).count(),
            completed_this_week: items
                .iter()
                .filter(|w| w.completed_date.is_some_and(|d| d > week_ago))
                .count(),
            completion_rate: crate::metrics::rows::percent(completed, items.len()),
        }
    }
}
