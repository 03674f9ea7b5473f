use std::collections::BTreeMap;
use std::fmt::Write;

use crate::types::{AnomalyReport, DataSource, RunReport};

const RULE_WIDTH: usize = 80;
const BAR_WIDTH: usize = 40;
const LABEL_WIDTH: usize = 24;

/// Render a completed run as a plain-text dashboard.
///
/// Sections, in order: metrics, missing-value chart (only if any value is
/// missing), outlier chart (only if any outlier), skewness chart (when there
/// are numeric columns), zero-variance warning, low-cardinality info, AI
/// summary, raw report JSON and the data preview.
pub fn render_dashboard(run: &RunReport) -> String {
    let mut out = String::new();
    let report = &run.report;

    section_rule(&mut out, '=');
    let _ = writeln!(out, "DATA QUALITY DASHBOARD - {}", run.source);
    section_rule(&mut out, '=');
    let _ = writeln!(out);

    render_metrics(&mut out, report);

    if report.total_missing() > 0 {
        render_bar_chart(&mut out, "MISSING VALUES PER COLUMN", &as_f64(&report.missing_values));
    }
    if report.total_outliers() > 0 {
        render_bar_chart(&mut out, "OUTLIERS PER NUMERIC COLUMN", &as_f64(&report.outliers));
    }
    if !report.skewness.is_empty() {
        render_skewness_chart(&mut out, &report.skewness);
    }

    if !report.zero_variance_columns.is_empty() {
        let _ = writeln!(
            out,
            "WARNING: Zero Variance Columns: {:?}",
            report.zero_variance_columns
        );
    }
    if !report.low_cardinality.is_empty() {
        let _ = writeln!(out, "INFO: Low Cardinality Columns: {:?}", report.low_cardinality);
    }
    if !report.zero_variance_columns.is_empty() || !report.low_cardinality.is_empty() {
        let _ = writeln!(out);
    }

    heading(&mut out, "AI SUMMARY");
    for line in run.summary.trim().lines() {
        let _ = writeln!(out, "  {}", line);
    }
    let _ = writeln!(out);

    heading(&mut out, "RAW ANOMALY REPORT");
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            let _ = writeln!(out, "{}", json);
        }
        Err(e) => {
            let _ = writeln!(out, "  (could not serialize report: {})", e);
        }
    }
    let _ = writeln!(out);

    heading(&mut out, "DATA PREVIEW");
    let _ = writeln!(out, "{}", run.preview);

    section_rule(&mut out, '=');
    let _ = writeln!(out, "Completed in {}ms", run.duration_ms);
    section_rule(&mut out, '=');

    out
}

/// Warning shown when a source returns no rows.
pub fn render_empty(source: &DataSource, column_count: usize) -> String {
    format!(
        "WARNING: No data returned from {} ({} columns, 0 rows). Nothing to analyze.",
        source, column_count
    )
}

fn section_rule(out: &mut String, ch: char) {
    let _ = writeln!(out, "{}", ch.to_string().repeat(RULE_WIDTH));
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(40));
}

fn render_metrics(out: &mut String, report: &AnomalyReport) {
    heading(out, "DATASET METRICS");
    let _ = writeln!(out, "  Rows:           {}", report.row_count);
    let _ = writeln!(out, "  Columns:        {}", report.column_count);
    let _ = writeln!(out, "  Duplicate Rows: {}", report.duplicate_rows);
    let _ = writeln!(out);
}

fn as_f64(values: &BTreeMap<String, usize>) -> BTreeMap<String, f64> {
    values.iter().map(|(k, v)| (k.clone(), *v as f64)).collect()
}

/// Width of a bar for `value` when `max` fills the whole chart.
fn bar_len(value: f64, max: f64) -> usize {
    if max <= 0.0 || !value.is_finite() {
        return 0;
    }
    ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
}

fn label(name: &str) -> String {
    if name.chars().count() > LABEL_WIDTH {
        let truncated: String = name.chars().take(LABEL_WIDTH - 3).collect();
        format!("{}...", truncated)
    } else {
        name.to_string()
    }
}

fn render_bar_chart(out: &mut String, title: &str, values: &BTreeMap<String, f64>) {
    heading(out, title);
    let max = values.values().cloned().fold(0.0, f64::max);
    for (name, value) in values {
        let _ = writeln!(
            out,
            "  {:<width$} {:<bar$} {}",
            label(name),
            "#".repeat(bar_len(*value, max)),
            value,
            width = LABEL_WIDTH,
            bar = BAR_WIDTH,
        );
    }
    let _ = writeln!(out);
}

fn render_skewness_chart(out: &mut String, skewness: &BTreeMap<String, f64>) {
    heading(out, "SKEWNESS PER NUMERIC COLUMN");
    let max = skewness.values().map(|v| v.abs()).fold(0.0, f64::max);
    for (name, value) in skewness {
        let marker = if *value < 0.0 { "-" } else { "+" };
        let _ = writeln!(
            out,
            "  {:<width$} {:<bar$} {:.2}",
            label(name),
            marker.repeat(bar_len(*value, max)),
            value,
            width = LABEL_WIDTH,
            bar = BAR_WIDTH,
        );
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn run_with(report: AnomalyReport) -> RunReport {
        RunReport {
            source: DataSource::object("lake", "orders.csv"),
            report,
            summary: "Test summary".to_string(),
            preview: df!["id" => [1i64, 2]].unwrap(),
            duration_ms: 12,
        }
    }

    fn clean_report() -> AnomalyReport {
        let mut report = AnomalyReport {
            row_count: 2,
            column_count: 1,
            ..Default::default()
        };
        report.missing_values.insert("id".to_string(), 0);
        report.outliers.insert("id".to_string(), 0);
        report.skewness.insert("id".to_string(), 0.0);
        report
    }

    #[test]
    fn test_charts_omitted_when_totals_zero() {
        let out = render_dashboard(&run_with(clean_report()));

        assert!(!out.contains("MISSING VALUES PER COLUMN"));
        assert!(!out.contains("OUTLIERS PER NUMERIC COLUMN"));
        assert!(out.contains("SKEWNESS PER NUMERIC COLUMN"));
        assert!(!out.contains("Zero Variance"));
    }

    #[test]
    fn test_charts_shown_when_present() {
        let mut report = clean_report();
        report.missing_values.insert("id".to_string(), 3);
        report.outliers.insert("id".to_string(), 1);
        report.zero_variance_columns.push("flag".to_string());
        report.low_cardinality.insert("flag".to_string(), 1);

        let out = render_dashboard(&run_with(report));

        assert!(out.contains("MISSING VALUES PER COLUMN"));
        assert!(out.contains("OUTLIERS PER NUMERIC COLUMN"));
        assert!(out.contains("WARNING: Zero Variance Columns: [\"flag\"]"));
        assert!(out.contains("INFO: Low Cardinality Columns: {\"flag\": 1}"));
    }

    #[test]
    fn test_dashboard_includes_summary_json_and_preview() {
        let out = render_dashboard(&run_with(clean_report()));

        assert!(out.contains("DATA QUALITY DASHBOARD - s3://lake/orders.csv"));
        assert!(out.contains("  Test summary"));
        assert!(out.contains("\"row_count\": 2"));
        assert!(out.contains("DATA PREVIEW"));
        assert!(out.contains("Completed in 12ms"));
    }

    #[test]
    fn test_bar_len_scales_to_max() {
        assert_eq!(bar_len(10.0, 10.0), BAR_WIDTH);
        assert_eq!(bar_len(5.0, 10.0), BAR_WIDTH / 2);
        assert_eq!(bar_len(-2.0, 4.0), BAR_WIDTH / 2);
        assert_eq!(bar_len(1.0, 0.0), 0);
    }

    #[test]
    fn test_label_truncates_long_names() {
        let long = "a_really_long_column_name_indeed";
        assert_eq!(label(long).chars().count(), LABEL_WIDTH);
        assert!(label(long).ends_with("..."));
        assert_eq!(label("id"), "id");
    }

    #[test]
    fn test_render_empty() {
        let msg = render_empty(&DataSource::table("orders"), 4);
        assert!(msg.contains("No data returned from MySQL table 'orders'"));
    }
}
