//! Markdown and file output for reports.
//!
//! Each report is written as `<id>.csv` (the table) plus one Vega-Lite file
//! per chart, `<id>_chart<n>.vl.json`. [`render_markdown`] stitches the tables
//! into a single document that links the chart files.

use super::Report;
use crate::error::Result;
use crate::queries::{BatteryOutcome, QueryId};
use crate::statements::io::save_csv;
use polars::prelude::*;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "report.md";

pub fn table_file_name(query: QueryId) -> String {
    format!("{}.csv", query.id())
}

/// `n` counts from zero.
pub fn chart_file_name(query: QueryId, n: usize) -> String {
    format!("{}_chart{}.vl.json", query.id(), n + 1)
}

/// Render a battery outcome as a Markdown document.
///
/// One section per report (table, then links to the chart files), followed
/// by the queries that were skipped and why.
pub fn render_markdown(outcome: &BatteryOutcome) -> String {
    let mut md = String::new();

    md.push_str("# Beneficial ownership data report\n\n");
    md.push_str(&format!(
        "> **Generated:** {}  \n> **Reports:** {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        outcome.reports.len()
    ));

    for report in &outcome.reports {
        md.push_str(&format!("## {}: {}\n\n", report.query.id(), report.title()));
        render_table(&mut md, &report.table);
        md.push('\n');

        if !report.charts.is_empty() {
            md.push_str("**Charts:**\n\n");
            for (n, chart) in report.charts.iter().enumerate() {
                let file = chart_file_name(report.query, n);
                md.push_str(&format!("- [{}]({file})\n", chart.title));
            }
            md.push('\n');
        }
    }

    if !outcome.skipped.is_empty() {
        md.push_str("## Skipped\n\n");
        for (query, reason) in &outcome.skipped {
            md.push_str(&format!("- `{}` {}: {reason}\n", query.id(), query.title()));
        }
    }

    md
}

/// Render a frame as a Markdown table.
pub fn render_table(md: &mut String, df: &DataFrame) {
    let columns = df.get_columns();
    if columns.is_empty() {
        md.push_str("*Empty table.*\n");
        return;
    }

    md.push('|');
    for column in columns {
        md.push_str(&format!(" {} |", escape_cell(column.name())));
    }
    md.push_str("\n|");
    for (i, _) in columns.iter().enumerate() {
        md.push_str(if i == 0 { "---|" } else { "---:|" });
    }
    md.push('\n');

    for row in 0..df.height() {
        md.push('|');
        for column in columns {
            let text = column
                .as_materialized_series()
                .get(row)
                .map(|v| cell_text(&v))
                .unwrap_or_default();
            md.push_str(&format!(" {} |", escape_cell(&text)));
        }
        md.push('\n');
    }
}

fn cell_text(value: &AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => "—".to_owned(),
        AnyValue::String(s) => (*s).to_owned(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Float64(x) => fmt_number(*x),
        AnyValue::Float32(x) => fmt_number(f64::from(*x)),
        other => other.to_string(),
    }
}

/// Whole numbers without decimals, others to 4 decimal places.
pub fn fmt_number(x: f64) -> String {
    if !x.is_finite() {
        "—".to_owned()
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{x:.0}")
    } else {
        format!("{x:.4}")
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Write one report's table and charts into `dir`.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_report(report: &Report, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let table_path = dir.join(table_file_name(report.query));
    let mut table = report.table.clone();
    save_csv(&mut table, &table_path)?;
    written.push(table_path);

    for (n, chart) in report.charts.iter().enumerate() {
        let path = dir.join(chart_file_name(report.query, n));
        let spec = serde_json::to_string_pretty(&chart.to_vega_lite())?;
        std::fs::write(&path, spec)?;
        written.push(path);
    }

    tracing::debug!("Wrote {} files for {}", written.len(), report.query.id());
    Ok(written)
}

/// Write every report plus the Markdown summary; returns the summary's path.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_outcome(outcome: &BatteryOutcome, dir: &Path) -> Result<PathBuf> {
    for report in &outcome.reports {
        write_report(report, dir)?;
    }
    let summary = dir.join(SUMMARY_FILE);
    std::fs::create_dir_all(dir)?;
    std::fs::write(&summary, render_markdown(outcome))?;
    tracing::info!(
        "Wrote {} reports to {}",
        outcome.reports.len(),
        dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(25.0), "25");
        assert_eq!(fmt_number(12.5), "12.5000");
        assert_eq!(fmt_number(f64::NAN), "—");
    }

    #[test]
    fn test_render_table_with_nulls() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::from(Series::new("statistic".into(), vec!["Minimum share", "Maximum share"])),
            Column::from(Series::new("share_exact".into(), vec![Some(10.0), None])),
        ])?;
        let mut md = String::new();
        render_table(&mut md, &df);

        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.first().copied(), Some("| statistic | share_exact |"));
        assert_eq!(lines.get(1).copied(), Some("|---|---:|"));
        assert_eq!(lines.get(2).copied(), Some("| Minimum share | 10 |"));
        assert_eq!(lines.get(3).copied(), Some("| Maximum share | — |"));
        Ok(())
    }

    #[test]
    fn test_chart_file_names() {
        assert_eq!(table_file_name(QueryId::InterestTypes), "q131.csv");
        assert_eq!(
            chart_file_name(QueryId::ShareStatistics, 0),
            "q142_chart1.vl.json"
        );
    }
}
