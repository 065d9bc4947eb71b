//! Markdown and JSON report generation.
//!
//! This module renders a dashboard page, with metadata about the dataset
//! and the active filters, as a Markdown document or as JSON.

use super::format::{float, money, number};
use crate::analysis::{HistogramBin, SplitHistogram, SummaryStats};
use crate::models::{AggFn, GroupedResult, KpiSummary, LoadReport, SalesRecord, ValueField};
use crate::views::{AggregateView, Insight, Page, Panel, ShareEntry};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Metadata about the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Path of the source dataset.
    pub dataset: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Load statistics of the dataset.
    pub load: LoadReport,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub page: Page,
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Salescope: {}\n\n", report.page.title));
    output.push_str(&generate_metadata_section(&report.metadata, &report.page));

    for panel in &report.page.panels {
        output.push_str(&generate_panel_section(panel));
    }

    output.push_str(&generate_footer());
    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, page: &Page) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records Loaded:** {}\n", metadata.load.rows_read));
    if metadata.load.invalid_dates > 0 {
        section.push_str(&format!(
            "- **Records With Invalid Dates:** {}\n",
            metadata.load.invalid_dates
        ));
    }

    let filters = page.filter.describe();
    if filters.is_empty() {
        section.push_str("- **Filters:** none\n");
    } else {
        section.push_str(&format!("- **Filters:** {}\n", filters.join("; ")));
    }
    section.push_str(&format!("- **Matching Records:** {}\n", page.matched));
    section.push('\n');

    for note in &page.notes {
        section.push_str(&format!("> {}\n", note));
    }
    if !page.notes.is_empty() {
        section.push('\n');
    }

    section
}

/// Generate the section for one panel.
fn generate_panel_section(panel: &Panel) -> String {
    let mut section = format!("## {}\n\n", panel.title);

    let body = match &panel.view {
        AggregateView::Kpis(kpis) => kpi_table(kpis),
        AggregateView::Grouped(grouped) => grouped_table(grouped),
        AggregateView::Ranked {
            group_field,
            value_field,
            agg,
            entries,
        } => {
            let mut table = format!(
                "| # | {} | {} {} |\n|---:|:---|---:|\n",
                group_field.label(),
                agg,
                value_field.label()
            );
            for (rank, (key, value)) in entries.iter().enumerate() {
                table.push_str(&format!(
                    "| {} | {} | {} |\n",
                    rank + 1,
                    key,
                    value_cell(*value_field, *value)
                ));
            }
            table
        }
        AggregateView::Shares {
            group_field,
            value_field,
            entries,
        } => share_table(group_field.label(), *value_field, entries),
        AggregateView::Histogram { field, bins } => histogram_table(*field, bins),
        AggregateView::SplitHistogram(split) => split_histogram_table(split),
        AggregateView::Summary(stats) => summary_table(stats),
        AggregateView::Records { total, rows } => records_table(*total, rows),
        AggregateView::Insights(insights) => insight_list(insights),
        AggregateView::Message(message) => format!("*{}*\n", message),
    };

    if body.is_empty() {
        section.push_str("*No data for the current selection.*\n");
    } else {
        section.push_str(&body);
    }
    section.push('\n');
    section
}

fn value_cell(field: ValueField, value: Decimal) -> String {
    match field {
        ValueField::Revenue | ValueField::Profit => money(value),
        ValueField::Quantity => number(value, 0),
        ValueField::Rating => number(value, 2),
    }
}

fn kpi_table(kpis: &KpiSummary) -> String {
    let rating = kpis
        .average_rating
        .map(|r| number(r, 2))
        .unwrap_or_else(|| "n/a".to_string());

    let mut table = String::new();
    table.push_str("| Total Revenue | Total Profit | Average Rating | Quantity Sold | Transactions |\n");
    table.push_str("|---:|---:|---:|---:|---:|\n");
    table.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n",
        money(kpis.total_revenue),
        money(kpis.total_profit),
        rating,
        kpis.total_quantity,
        kpis.record_count
    ));
    table
}

fn grouped_table(grouped: &GroupedResult) -> String {
    if grouped.is_empty() {
        return String::new();
    }

    let mut table = format!(
        "| {} | {} {} | Records |\n|:---|---:|---:|\n",
        grouped.group_field.label(),
        grouped.agg,
        grouped.value_field.label()
    );
    let field = match grouped.agg {
        AggFn::Count => ValueField::Quantity,
        _ => grouped.value_field,
    };
    for entry in &grouped.entries {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            entry.key,
            value_cell(field, entry.value),
            entry.count
        ));
    }
    table
}

fn share_table(group_label: &str, field: ValueField, entries: &[ShareEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut table = format!(
        "| {} | {} | Share |\n|:---|---:|---:|\n",
        group_label,
        field.label()
    );
    for entry in entries {
        table.push_str(&format!(
            "| {} | {} | {}% |\n",
            entry.key,
            value_cell(field, entry.value),
            number(entry.share, 1)
        ));
    }
    table
}

fn histogram_table(field: ValueField, bins: &[HistogramBin]) -> String {
    if bins.is_empty() {
        return String::new();
    }

    let mut table = format!("| {} | Frequency |\n|:---|---:|\n", field.label());
    for bin in bins {
        table.push_str(&format!(
            "| {} – {} | {} |\n",
            float(bin.lower),
            float(bin.upper),
            bin.count
        ));
    }
    table
}

fn split_histogram_table(split: &SplitHistogram) -> String {
    if split.edges.is_empty() {
        return String::new();
    }

    let mut table = format!("| {} |", split.field.label());
    let mut divider = String::from("|:---|");
    for series in &split.series {
        table.push_str(&format!(" {} |", series.key));
        divider.push_str("---:|");
    }
    table.push('\n');
    table.push_str(&divider);
    table.push('\n');

    for (idx, (lower, upper)) in split.edges.iter().enumerate() {
        table.push_str(&format!("| {} – {} |", float(*lower), float(*upper)));
        for series in &split.series {
            table.push_str(&format!(" {} |", series.counts[idx]));
        }
        table.push('\n');
    }
    table
}

fn summary_table(stats: &[SummaryStats]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let mut table = String::from("| Field | Count | Mean | Std | Min | 25% | 50% | 75% | Max |\n");
    table.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|---:|\n");
    for s in stats {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            s.field.label(),
            s.count,
            float(s.mean),
            s.std.map(float).unwrap_or_else(|| "n/a".to_string()),
            float(s.min),
            float(s.q1),
            float(s.median),
            float(s.q3),
            float(s.max)
        ));
    }
    table
}

fn records_table(total: usize, rows: &[SalesRecord]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = String::from(
        "| Branch | City | Category | Payment | Date | Quantity | Rating | Revenue | Profit |\n",
    );
    table.push_str("|:---|:---|:---|:---|:---|---:|---:|---:|---:|\n");
    for r in rows {
        let date = r
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "invalid".to_string());
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            r.branch,
            r.city,
            r.category,
            r.payment_method,
            date,
            r.quantity,
            r.rating,
            money(r.revenue),
            money(r.profit)
        ));
    }
    if rows.len() < total {
        table.push_str(&format!("\n*Showing {} of {} records.*\n", rows.len(), total));
    }
    table
}

fn insight_list(insights: &[Insight]) -> String {
    insights
        .iter()
        .map(|i| format!("- **{}:** {}\n", i.topic, i.statement))
        .collect()
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by Salescope*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
