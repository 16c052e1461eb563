//! Console bar-chart rendering
//!
//! ```text
//! Language stats:
//! Rust: 2.00h                    |============================================================
//! Go: 1.00h                      |==============================
//! ```

use lstats_core::{CohortReport, GroupTotal, StatsPipeline, StatsReport};
use lstats_model::format_hours;

/// Width of the `name: duration` column
pub const LABEL_WIDTH: usize = 30;
/// Bar length of a table's largest row
pub const BAR_WIDTH: usize = 60;

/// Whole report: population tables, then one section per cohort
#[must_use]
pub fn render_report(report: &StatsReport) -> String {
    let mut out = vec![String::new(), format!("Fetched {} users.", report.records_used)];
    for cohort in &report.cohorts {
        out.push(render_cohort(cohort));
    }
    out.join("\n")
}

/// One cohort; the population cohort has no header
#[must_use]
pub fn render_cohort(cohort: &CohortReport) -> String {
    let mut out = Vec::new();
    if cohort.label != StatsPipeline::POPULATION {
        out.push(String::new());
        out.push(cohort_header(cohort.population, &cohort.label));
    }
    for table in &cohort.tables {
        out.push(render_table(table.key.title(), &table.rows));
    }
    out.join("\n")
}

/// Banner line opening a cohort section
#[must_use]
pub fn cohort_header(population: usize, label: &str) -> String {
    format!("======== {population} {label} users ==========")
}

/// Title line then one bar per row, bars scaled to the largest row
#[must_use]
pub fn render_table(title: &str, rows: &[GroupTotal]) -> String {
    let mut out = vec![String::new(), format!("{title}:")];
    let max = rows.iter().map(|r| r.total_seconds).max().unwrap_or(0);
    if rows.is_empty() {
        out.push("(no data)".to_string());
    }
    for row in rows {
        let label = format!("{}: {}", row.name, format_hours(row.total_seconds));
        let bar = "=".repeat(bar_width(row.total_seconds, max));
        out.push(format!("{label:<LABEL_WIDTH$} |{bar}"));
    }
    out.join("\n")
}

/// Bar length for `value` against `max`, truncated
#[must_use]
pub fn bar_width(value: u64, max: u64) -> usize {
    if max == 0 {
        return 0;
    }
    let width = u128::from(value) * BAR_WIDTH as u128 / u128::from(max);
    usize::try_from(width).unwrap_or(BAR_WIDTH)
}
