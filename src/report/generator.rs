//! Markdown and JSON rendering.
//!
//! Every view is assembled from small section builders. Money, dates and
//! table length follow the user's display preferences.

use super::format::{cell, date, decimal, escape, money, percent, thousands, truncate};
use crate::analytics::Pipe;
use crate::config::Preferences;
use crate::metrics::sla::SlaTarget;
use crate::metrics::{Tile, TileValue};
use crate::models::{ConnectionStatus, InsightCard, PipeResponse, Severity, WorkflowItem};
use crate::views::{PageView, RowTable};
use crate::workflow::WorkflowMetrics;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate the Markdown for a page.
pub fn generate_page_markdown(view: &PageView, prefs: &Preferences, model: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", view.title));
    if !view.subtitle.is_empty() {
        output.push_str(&format!("*{}*\n\n", view.subtitle));
    }

    output.push_str(&generate_metadata_section(view, prefs, model));
    output.push_str(&generate_tiles_section(&view.tiles, prefs));
    output.push_str(&generate_targets_section(&view.targets));
    output.push_str(&generate_insights_section(&view.insights, prefs));

    if !prefs.compact_mode {
        if let Some(ref table) = view.table {
            output.push_str(&generate_table_section(table, prefs.table_rows));
        }
    }

    output.push_str(&generate_footer(!view.insights.is_empty()));

    output
}

fn generate_metadata_section(view: &PageView, prefs: &Preferences, model: &str) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "- **Generated:** {}\n",
        date(view.generated_at, &prefs.date_format)
    ));
    section.push_str(&format!("- **Model:** `{}`\n", model));
    section.push_str(&format!("- **Insight Cards:** {}\n", view.insights.len()));
    section.push('\n');

    section
}

/// Format a tile's number for display.
pub fn format_tile_value(value: &TileValue, prefs: &Preferences) -> String {
    match value {
        TileValue::Count(n) => thousands(*n as f64),
        TileValue::Decimal(v) => decimal(*v),
        TileValue::Percent(p) => percent(*p),
        TileValue::Money(m) => money(*m, &prefs.currency),
    }
}

fn generate_tiles_section(tiles: &[Tile], prefs: &Preferences) -> String {
    if tiles.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Metric | Value | Notes |\n");
    section.push_str("|:---|---:|:---|\n");
    for tile in tiles {
        section.push_str(&format!(
            "| {} | **{}** | {} |\n",
            escape(&tile.label),
            format_tile_value(&tile.value, prefs),
            escape(tile.detail.as_deref().unwrap_or(""))
        ));
    }
    section.push('\n');

    section
}

fn generate_targets_section(targets: &[SlaTarget]) -> String {
    if targets.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## SLA Targets\n\n");
    section.push_str("| SLA | Target | Current | Breaches | Status |\n");
    section.push_str("|:---|---:|---:|---:|:---|\n");
    for target in targets {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            target.name,
            percent(target.target),
            percent(target.current),
            target
                .breaches
                .map(|b| thousands(b as f64))
                .unwrap_or_else(|| "n/a".to_string()),
            target.status
        ));
    }
    section.push('\n');

    section
}

fn generate_insights_section(cards: &[InsightCard], prefs: &Preferences) -> String {
    let mut section = String::new();

    section.push_str("## Decisions\n\n");

    if cards.is_empty() {
        section.push_str("No insight cards for this view. Check the LLM connection with `brandbuddy connection` if you expected some.\n\n");
        return section;
    }

    let mut sorted: Vec<&InsightCard> = cards.iter().collect();
    sorted.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.financial_impact.abs().total_cmp(&a.financial_impact.abs()))
    });

    for card in sorted {
        section.push_str(&generate_insight_block(card, prefs));
    }

    section
}

fn severity_badge(severity: Severity) -> String {
    format!("{} **{}**", severity.emoji(), severity.to_string().to_uppercase())
}

/// Generate a single insight card block.
pub fn generate_insight_block(card: &InsightCard, prefs: &Preferences) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} {}\n\n",
        severity_badge(card.severity),
        card.title
    ));

    block.push_str(&format!(
        "**Impact:** {} | **Confidence:** {} | **Agent:** {} | **Id:** `{}`\n\n",
        money(card.financial_impact, &prefs.currency),
        percent(card.confidence * 100.0),
        card.agent_name,
        card.id
    ));

    if !card.description.is_empty() {
        block.push_str(&format!("{}\n\n", card.description));
    }

    if !card.root_cause.is_empty() {
        block.push_str(&format!("> 💡 **Why:** {}\n\n", card.root_cause));
    }

    if !card.suggested_actions.is_empty() {
        block.push_str("**Suggested actions:**\n\n");
        for action in &card.suggested_actions {
            block.push_str(&format!("- {}\n", action));
        }
        block.push('\n');
    }

    if !card.tags.is_empty() {
        let tags: Vec<String> = card.tags.iter().map(|t| format!("`{}`", t)).collect();
        block.push_str(&format!("*Tags:* {}\n\n", tags.join(" ")));
    }

    if !prefs.compact_mode && !card.evidence_trail.is_empty() {
        let evidence =
            serde_json::to_string_pretty(&card.evidence_trail).unwrap_or_else(|_| "[]".to_string());
        block.push_str(&format!(
            "<details>\n<summary>Evidence ({} rows)</summary>\n\n```json\n{}\n```\n</details>\n\n",
            card.evidence_trail.len(),
            evidence
        ));
    }

    block.push_str("---\n\n");

    block
}

fn generate_table_section(table: &RowTable, max_rows: usize) -> String {
    if table.rows.is_empty() || table.columns.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    let shown = table.rows.len().min(max_rows);
    section.push_str(&format!(
        "## {} ({} of {})\n\n",
        table.title,
        shown,
        table.rows.len()
    ));
    section.push_str(&format!("| {} |\n", table.columns.join(" | ")));
    section.push_str(&format!(
        "|{}\n",
        table.columns.iter().map(|_| ":---|").collect::<String>()
    ));

    for row in table.rows.iter().take(max_rows) {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| row.get(c).map(cell).unwrap_or_else(|| "-".to_string()))
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

fn generate_footer(has_cards: bool) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    if has_cards {
        footer.push_str(
            "Turn a card into a workflow with `brandbuddy workflows from-insight <id>`.\n\n",
        );
    }
    footer.push_str(&format!(
        "*Generated by BrandBuddy v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate the workflow board.
pub fn generate_workflows_markdown(
    items: &[&WorkflowItem],
    metrics: &WorkflowMetrics,
    follow_ups: &[InsightCard],
    prefs: &Preferences,
) -> String {
    let mut output = String::new();

    output.push_str("# Workflows\n\n");

    output.push_str("| Total | Open | Overdue | Completed This Week | Completion Rate |\n");
    output.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        metrics.total,
        metrics.open,
        metrics.overdue,
        metrics.completed_this_week,
        percent(metrics.completion_rate)
    ));

    if !follow_ups.is_empty() {
        output.push_str("## Follow-ups\n\n");
        for card in follow_ups {
            output.push_str(&generate_insight_block(card, prefs));
        }
    }

    output.push_str("## Board\n\n");
    if items.is_empty() {
        output.push_str("No workflows match. Create one with `brandbuddy workflows create --title ...` or from an insight card.\n\n");
        return output;
    }

    output.push_str("| Id | Title | Type | Status | Priority | Assignee | Due | Impact | Progress |\n");
    output.push_str("|:---|:---|:---|:---|:---|:---|:---|---:|---:|\n");
    for item in items {
        output.push_str(&format!(
            "| `{}` | {} | {} | {} | {} {} | {} | {} | {} | {}% |\n",
            item.id,
            escape(&truncate(&item.title, 48)),
            item.kind,
            item.status,
            item.priority.emoji(),
            item.priority,
            item.assigned_to,
            date(item.due_date, &prefs.date_format),
            money(item.financial_impact, &prefs.currency),
            item.progress
        ));
    }
    output.push('\n');

    output
}

/// Generate the detail view of one workflow, including its audit trail.
pub fn generate_workflow_markdown(item: &WorkflowItem, prefs: &Preferences) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", item.title));
    output.push_str(&format!("- **Id:** `{}`\n", item.id));
    output.push_str(&format!("- **Type:** {}\n", item.kind));
    output.push_str(&format!("- **Status:** {}\n", item.status));
    output.push_str(&format!(
        "- **Priority:** {}\n",
        severity_badge(item.priority)
    ));
    output.push_str(&format!("- **Assigned to:** {}\n", item.assigned_to));
    output.push_str(&format!(
        "- **Due:** {}\n",
        date(item.due_date, &prefs.date_format)
    ));
    if let Some(completed) = item.completed_date {
        output.push_str(&format!(
            "- **Completed:** {}\n",
            date(completed, &prefs.date_format)
        ));
    }
    output.push_str(&format!(
        "- **Impact:** {}\n",
        money(item.financial_impact, &prefs.currency)
    ));
    output.push_str(&format!("- **Progress:** {}%\n", item.progress));
    if let Some(ref insight) = item.linked_insight {
        output.push_str(&format!("- **Linked insight:** `{}`\n", insight));
    }
    output.push('\n');

    if !item.description.is_empty() {
        output.push_str(&format!("{}\n\n", item.description));
    }

    output.push_str("## Audit Trail\n\n");
    for entry in &item.audit_trail {
        output.push_str(&format!(
            "- {} **{}** by {}",
            date(entry.timestamp, &prefs.date_format),
            entry.action,
            entry.user
        ));
        if let Some(ref details) = entry.details {
            output.push_str(&format!(": {}", details));
        }
        output.push('\n');
    }
    output.push('\n');

    output
}

/// Generate the connection check report.
pub fn generate_connection_markdown(analytics: &ConnectionStatus, llm: &ConnectionStatus) -> String {
    let mut output = String::new();

    output.push_str("# Connections\n\n");
    for (name, status) in [("Analytics", analytics), ("LLM", llm)] {
        let badge = if status.success { "✅" } else { "❌" };
        output.push_str(&format!("## {} {}\n\n", badge, name));
        output.push_str(&format!("{}\n\n", status.message));
        if let Some(ref error) = status.error {
            output.push_str(&format!("```\n{}\n```\n\n", error));
        }
    }

    output
}

/// Generate raw rows from a pipe.
pub fn generate_rows_markdown(pipe: Pipe, response: &PipeResponse, prefs: &Preferences) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", pipe));
    output.push_str(&format!(
        "- **Rows:** {}\n- **Elapsed:** {:.3}s\n- **Rows read:** {}\n- **Bytes read:** {}\n\n",
        thousands(response.rows as f64),
        response.statistics.elapsed,
        thousands(response.statistics.rows_read as f64),
        thousands(response.statistics.bytes_read as f64)
    ));

    let table = RowTable::new("Rows", &[], &response.data);
    let section = generate_table_section(&table, prefs.table_rows);
    if section.is_empty() {
        output.push_str("No rows returned.\n");
    } else {
        output.push_str(&section);
    }

    output
}

/// Generate the current preferences.
pub fn generate_preferences_markdown(prefs: &Preferences) -> String {
    let mut output = String::new();

    output.push_str("# Preferences\n\n");
    output.push_str("| Key | Value |\n");
    output.push_str("|:---|:---|\n");
    output.push_str(&format!("| date_format | `{}` |\n", prefs.date_format));
    output.push_str(&format!("| currency | {} |\n", prefs.currency));
    output.push_str(&format!("| default_view | {} |\n", prefs.default_view));
    output.push_str(&format!("| compact_mode | {} |\n", prefs.compact_mode));
    output.push_str(&format!("| table_rows | {} |\n", prefs.table_rows));

    output
}

/// Generate a JSON document.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Write to `path`, or stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write output to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}
