//! Number, money and date formatting for reports.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt::Write;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Round to a whole number and group thousands: `12500.4` -> `12,500`.
pub fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

/// Whole-unit money in the preferred currency: `$12,500`, `-€800`, `CHF 40`.
pub fn money(amount: f64, currency: &str) -> String {
    let sign = if amount.round() < 0.0 { "-" } else { "" };
    let magnitude = thousands(amount.abs());
    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}", sign, symbol, magnitude),
        None => format!("{}{} {}", sign, currency, magnitude),
    }
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Whole numbers get thousands separators; anything else one decimal.
pub fn decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        thousands(value)
    } else {
        format!("{:.1}", value)
    }
}

/// Whether `format` is a usable chrono format string.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Format a timestamp with the user's date format, falling back to ISO dates
/// when the format string is unusable.
pub fn date(value: DateTime<Utc>, format: &str) -> String {
    let format = if is_valid_date_format(format) {
        format
    } else {
        FALLBACK_DATE_FORMAT
    };
    let mut out = String::new();
    if write!(out, "{}", value.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", value.format(FALLBACK_DATE_FORMAT));
    }
    out
}

/// Render a JSON cell for a Markdown table.
pub fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "-".to_string(),
        Value::String(s) if s.is_empty() => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => decimal(f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    escape(&text)
}

/// Make free text safe inside a Markdown table cell.
pub fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Shorten `text` to at most `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
