//! Turning a model reply into insight cards.
//!
//! Models are asked for a bare JSON array but regularly wrap it in a Markdown
//! fence or an object. All three shapes are accepted.

use crate::models::{InsightCard, Row, Severity};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply JSON is not an array of insights")]
    NotAnArray,
}

/// Per-call metadata stamped onto every parsed card.
pub struct CardStamp<'a> {
    pub agent_name: &'a str,
    pub id_prefix: &'a str,
    pub default_confidence: f64,
    /// Unix millis used in card ids.
    pub issued_at: i64,
    pub evidence: &'a [Row],
}

/// Extract the raw insight objects from a reply.
pub fn extract_insight_values(reply: &str) -> Result<Vec<Value>, ParseError> {
    let body = strip_code_fence(reply.trim());
    let value: Value = serde_json::from_str(body)?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("insights") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ParseError::NotAnArray),
        },
        _ => Err(ParseError::NotAnArray),
    }
}

/// Parse a reply into cards. Entries without a title are dropped.
pub fn parse_insights(reply: &str, stamp: &CardStamp<'_>) -> Result<Vec<InsightCard>, ParseError> {
    let values = extract_insight_values(reply)?;

    Ok(values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| json_to_card(value, index, stamp))
        .collect())
}

fn json_to_card(json: &Value, index: usize, stamp: &CardStamp<'_>) -> Option<InsightCard> {
    let title = json["title"].as_str()?.trim();
    if title.is_empty() {
        return None;
    }

    let confidence = json["confidence"]
        .as_f64()
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or(stamp.default_confidence);

    Some(InsightCard {
        id: format!("{}-{}-{}", stamp.id_prefix, stamp.issued_at, index),
        title: title.to_string(),
        description: json["description"].as_str().unwrap_or("").to_string(),
        financial_impact: parse_amount(&json["financialImpact"]),
        severity: Severity::from(json["severity"].as_str().unwrap_or("medium")),
        tags: string_list(&json["tags"]),
        suggested_actions: string_list(&json["suggestedActions"]),
        root_cause: json["rootCause"].as_str().unwrap_or("").to_string(),
        evidence_trail: stamp.evidence.to_vec(),
        confidence,
        agent_name: stamp.agent_name.to_string(),
    })
}

/// Numbers, or strings like "$12,500".
fn parse_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stamp<'a>(evidence: &'a [Row]) -> CardStamp<'a> {
        CardStamp {
            agent_name: "OrderFlowAgent",
            id_prefix: "orderflow",
            default_confidence: 0.8,
            issued_at: 1_700_000_000_000,
            evidence,
        }
    }

    #[test]
    fn test_parse_bare_array() {
        let reply = r#"[{
            "title": "Cancel spike on Amazon",
            "description": "Cancel rate tripled",
            "financialImpact": 18200,
            "severity": "critical",
            "tags": ["cancellations", "amazon"],
            "suggestedActions": ["Create Workflow", "Escalate Decision"],
            "rootCause": "Carrier cutoff missed"
        }]"#;

        let cards = parse_insights(reply, &stamp(&[])).unwrap();
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.id, "orderflow-1700000000000-0");
        assert_eq!(card.agent_name, "OrderFlowAgent");
        assert_eq!(card.severity, Severity::Critical);
        assert_eq!(card.financial_impact, 18200.0);
        assert_eq!(card.suggested_actions.len(), 2);
        assert_eq!(card.confidence, 0.8);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n[{\"title\": \"Overstock\", \"severity\": \"low\"}]\n```";
        let cards = parse_insights(reply, &stamp(&[])).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].severity, Severity::Low);
        assert!(cards[0].tags.is_empty());
    }

    #[test]
    fn test_parse_wrapped_object() {
        let reply = r#"{"insights": [{"title": "A"}, {"title": "B"}]}"#;
        let cards = parse_insights(reply, &stamp(&[])).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].id, "orderflow-1700000000000-1");
    }

    #[test]
    fn test_untitled_entries_dropped_and_defaults_applied() {
        let reply = r#"[{"description": "no title"}, {"title": "Kept", "financialImpact": "$12,500", "severity": "bogus", "confidence": 0.5}]"#;
        let cards = parse_insights(reply, &stamp(&[])).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].financial_impact, 12500.0);
        assert_eq!(cards[0].severity, Severity::Medium);
        assert_eq!(cards[0].confidence, 0.5);
    }

    #[test]
    fn test_evidence_attached() {
        let row = json!({"sku": "SKU-9281"}).as_object().unwrap().clone();
        let evidence = vec![row];
        let cards = parse_insights(r#"[{"title": "T"}]"#, &stamp(&evidence)).unwrap();
        assert_eq!(cards[0].evidence_trail[0]["sku"], "SKU-9281");
    }

    #[test]
    fn test_prose_reply_is_error() {
        assert!(matches!(
            parse_insights("Here are your insights!", &stamp(&[])),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parse_insights(r#"{"title": "lonely"}"#, &stamp(&[])),
            Err(ParseError::NotAnArray)
        ));
    }
}
