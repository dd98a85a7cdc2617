//! Rule-based follow-up cards for the workflow board.

use crate::models::{InsightCard, Row, Severity, WorkflowItem, WorkflowStatus};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

pub const AGENT_NAME: &str = "FollowUpAgent";

const OVERDUE_IMPACT: f64 = 2500.0;
const IDLE_IMPACT: f64 = 1200.0;
const IDLE_AFTER_HOURS: i64 = 48;

fn evidence(items: &[&WorkflowItem]) -> Vec<Row> {
    items
        .iter()
        .filter_map(|w| {
            json!({
                "workflow_id": w.id,
                "title": w.title,
                "status": w.status,
                "assigned_to": w.assigned_to,
                "due_date": w.due_date,
            })
            .as_object()
            .cloned()
        })
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Cards for overdue workflows and proposals nobody has picked up.
pub fn follow_up_cards(items: &[WorkflowItem], now: DateTime<Utc>) -> Vec<InsightCard> {
    let idle_cutoff = now - Duration::hours(IDLE_AFTER_HOURS);
    let overdue: Vec<&WorkflowItem> = items.iter().filter(|w| w.is_overdue(now)).collect();
    let idle: Vec<&WorkflowItem> = items
        .iter()
        .filter(|w| w.status == WorkflowStatus::Proposed && w.created_date < idle_cutoff)
        .collect();

    let issued_at = now.timestamp_millis();
    let mut cards = Vec::new();

    if !overdue.is_empty() {
        cards.push(InsightCard {
            id: format!("followup-{}-{}", issued_at, cards.len()),
            title: format!("{} Workflows Past Due", overdue.len()),
            description: "Workflows have passed their due date and need immediate attention"
                .to_string(),
            financial_impact: overdue.len() as f64 * OVERDUE_IMPACT,
            severity: Severity::High,
            tags: to_strings(&["Overdue", "SLA Breach", "Workflow Management"]),
            suggested_actions: to_strings(&[
                "Escalate to Manager",
                "Reassign Tasks",
                "Extend Deadline",
            ]),
            root_cause: "Resource constraints and competing priorities are delaying workflows"
                .to_string(),
            evidence_trail: evidence(&overdue),
            confidence: 0.94,
            agent_name: AGENT_NAME.to_string(),
        });
    }

    if !idle.is_empty() {
        cards.push(InsightCard {
            id: format!("followup-{}-{}", issued_at, cards.len()),
            title: format!("{} Workflows Awaiting Approval", idle.len()),
            description: "Proposed workflows have been idle for more than 48 hours".to_string(),
            financial_impact: idle.len() as f64 * IDLE_IMPACT,
            severity: Severity::Medium,
            tags: to_strings(&["Approval Needed", "Idle Workflows", "Process Delay"]),
            suggested_actions: to_strings(&[
                "Nudge Approver",
                "Auto-Approve Low Risk",
                "Escalate to Manager",
            ]),
            root_cause: "Approval bottleneck when workflows are first proposed".to_string(),
            evidence_trail: evidence(&idle),
            confidence: 0.88,
            agent_name: AGENT_NAME.to_string(),
        });
    }

    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::items::{apply, create, WorkflowAction};
    use chrono::TimeZone;

    #[test]
    fn test_follow_up_cards() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();

        // Proposed ten days ago: overdue and idle.
        let stale = create("Stale", "", 0.0, "ops", now - Duration::days(10));
        // Proposed a day ago: neither.
        let fresh = create("Fresh", "", 0.0, "ops", now - Duration::days(1));
        // Accepted and overdue.
        let mut late = create("Late", "", 0.0, "ops", now - Duration::days(9));
        apply(&mut late, &WorkflowAction::Acknowledge, "ops", now).unwrap();
        // Completed long ago: ignored.
        let mut done = create("Done", "", 0.0, "ops", now - Duration::days(30));
        apply(&mut done, &WorkflowAction::Acknowledge, "ops", now).unwrap();
        apply(&mut done, &WorkflowAction::Resolve, "ops", now).unwrap();

        let cards = follow_up_cards(&[stale, fresh, late, done], now);
        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].title, "2 Workflows Past Due");
        assert_eq!(cards[0].financial_impact, 5000.0);
        assert_eq!(cards[0].severity, Severity::High);
        assert_eq!(cards[0].confidence, 0.94);
        assert_eq!(cards[0].evidence_trail.len(), 2);

        assert_eq!(cards[1].title, "1 Workflows Awaiting Approval");
        assert_eq!(cards[1].financial_impact, 1200.0);
        assert_eq!(cards[1].severity, Severity::Medium);
        assert_eq!(cards[1].evidence_trail[0]["title"], "Stale");
        assert!(cards[1].id.starts_with("followup-"));
    }

    #[test]
    fn test_quiet_board_has_no_cards() {
        let now = Utc::now();
        let fresh = create("Fresh", "", 0.0, "ops", now);
        assert!(follow_up_cards(&[fresh], now).is_empty());
    }
}
