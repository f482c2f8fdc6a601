//! Markdown rendering of reports.

use assay::Report;
use assay::domain::ParameterAssessment;
use assay::validation::{IssueCategory, QualityIssue};

/// Sample cells longer than this are cut.
const CELL_WIDTH: usize = 20;

/// Row numbers are listed for duplicates only up to this many.
const MAX_LISTED_DUPLICATES: usize = 10;

/// Render the statistical summary: columns, assessments and sample rows.
pub fn render_summary(report: &Report) -> String {
    let mut out = Vec::new();

    out.push(format!("## Data Summary: {}", report.source.file));
    out.push(format!("- **Rows:** {}", report.row_count));
    out.push(format!("- **Columns:** {}", report.column_count));
    out.push(format!("- **Registry:** {}", report.registry));
    if report.summary.matched_columns > 0 {
        out.push(format!(
            "- **Detected parameters:** {}",
            report.summary.matched_columns
        ));
    }
    out.push(String::new());

    out.push("## Column Analysis".to_string());
    out.push(String::new());
    out.push("| Column | Type | Param | Missing | Stats |".to_string());
    out.push("|--------|------|-------|---------|-------|".to_string());
    for col in &report.columns {
        let param = col.parameter.as_ref().map_or("-", |p| p.name.as_str());
        let stats = col
            .statistics
            .map_or_else(|| "-".to_string(), |s| s.summary());
        out.push(format!(
            "| {} | {} | {} | {} ({:.1}%) | {} |",
            col.name, col.column_type, param, col.missing_count, col.missing_percentage, stats
        ));
    }

    if !report.assessments.is_empty() {
        out.push(String::new());
        out.push("## Parameter Assessments".to_string());
        for assessment in &report.assessments {
            out.push(String::new());
            render_assessment(&mut out, assessment);
        }
    }

    out.push(String::new());
    render_sample(&mut out, report);

    out.join("\n")
}

fn with_unit(value: impl std::fmt::Display, unit: &str) -> String {
    if unit.is_empty() || unit == "-" {
        value.to_string()
    } else {
        format!("{} {}", value, unit)
    }
}

fn render_assessment(out: &mut Vec<String>, a: &ParameterAssessment) {
    out.push(format!("### {} ({})", a.column, a.display_name));
    out.push(String::new());

    let average = with_unit(a.mean, &a.unit);
    match &a.classification {
        Some(class) => out.push(format!("- **Average:** {} ({})", average, class)),
        None => out.push(format!("- **Average:** {}", average)),
    }
    out.push(format!(
        "- **Range:** {}",
        with_unit(format!("{} - {}", a.min, a.max), &a.unit)
    ));

    if let Some(split) = &a.split {
        let s = &split.summary;
        out.push(format!(
            "- **Distribution:** {} {} (<{}), {} {} ({}-{}), {} {} (>{})",
            split.low,
            s.low_label,
            s.lower,
            split.middle,
            s.mid_label,
            s.lower,
            s.upper,
            split.high,
            s.high_label,
            s.upper
        ));
    } else if !a.level_counts.is_empty() {
        let parts: Vec<String> = a
            .level_counts
            .iter()
            .map(|(level, count)| format!("{} {}", count, level))
            .collect();
        out.push(format!("- **Sample distribution:** {}", parts.join(", ")));
    }
}

fn truncate(value: &str) -> String {
    value.chars().take(CELL_WIDTH).collect()
}

fn render_sample(out: &mut Vec<String>, report: &Report) {
    out.push(format!(
        "## Sample Data (first {} rows)",
        report.sample_rows.len()
    ));
    if report.sample_rows.is_empty() || report.sample_headers.is_empty() {
        return;
    }
    out.push(String::new());
    out.push(format!("| {} |", report.sample_headers.join(" | ")));
    out.push(format!(
        "|{}|",
        vec!["---"; report.sample_headers.len()].join("|")
    ));
    for row in &report.sample_rows {
        let cells: Vec<String> = row.iter().map(|v| truncate(v)).collect();
        out.push(format!("| {} |", cells.join(" | ")));
    }
}

/// Render the quality report: issues grouped by category.
pub fn render_quality(report: &Report) -> String {
    let mut out = Vec::new();

    out.push(format!("## Data Quality Report: {}", report.source.file));
    out.push(format!("- **Total rows:** {}", report.row_count));
    let counts = report.summary.issues_by_severity;
    out.push(format!(
        "- **Issues:** {} ({} errors, {} warnings, {} info)",
        counts.total(),
        counts.error,
        counts.warning,
        counts.info
    ));
    out.push(String::new());

    if !report.has_issues() {
        out.push("### No Issues Found".to_string());
        out.push("All data quality checks passed.".to_string());
        return out.join("\n");
    }

    for (category, issues) in report.issues_by_category() {
        let severity = issues
            .iter()
            .map(|i| i.severity())
            .max()
            .map_or("", |s| s.label());
        out.push(format!("### {} ({})", category.label(), severity));
        render_category(&mut out, category, &issues);
        out.push(String::new());
    }

    out.join("\n")
}

fn render_category(out: &mut Vec<String>, category: IssueCategory, issues: &[&QualityIssue]) {
    match category {
        IssueCategory::Duplicate => {
            for issue in issues {
                if let QualityIssue::Duplicate { rows } = issue {
                    out.push(issue.description());
                    if rows.len() <= MAX_LISTED_DUPLICATES {
                        let listed: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
                        out.push(format!("Row numbers: {}", listed.join(", ")));
                    }
                }
            }
        }
        IssueCategory::ConsistencyViolation => {
            out.push(format!("Found {} row(s) that miss their expected total", issues.len()));
            for issue in issues.iter().take(5) {
                out.push(format!("- {}", issue.description()));
            }
        }
        _ => {
            for issue in issues {
                out.push(format!("- {}", issue.description()));
                let examples = issue.examples();
                if !examples.is_empty() {
                    let listed: Vec<String> = examples.iter().map(|e| e.to_string()).collect();
                    out.push(format!("  Examples: {}", listed.join(", ")));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay::input::{Cell, DataTable, SourceMetadata};
    use assay::{Assay, ParameterRegistry};

    fn report(headers: &[&str], rows: &[&[&str]]) -> Report {
        let table = DataTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from_text(*v)).collect())
                .collect(),
        );
        let source = SourceMetadata::new(
            "soil.csv".into(),
            String::new(),
            0,
            "csv".into(),
            table.row_count(),
            table.column_count(),
        );
        Assay::new().analyze_table(&table, source)
    }

    #[test]
    fn test_summary_sections() {
        let report = report(
            &["ph", "nitrogen", "site"],
            &[&["5.0", "10", "north field, plot 1"], &["9.0", "200", "south"]],
        );
        let md = render_summary(&report);

        assert!(md.starts_with("## Data Summary: soil.csv"));
        assert!(md.contains(
            "| nitrogen | numeric | nitrogen | 0 (0.0%) | min=10, max=200, mean=105, std=95 |"
        ));
        assert!(md.contains("### ph (Ph)"));
        assert!(md.contains("- **Average:** 7 (neutral (slightly alkaline))"));
        assert!(md.contains(
            "- **Distribution:** 1 acidic (<6), 0 neutral (6-7.5), 1 alkaline (>7.5)"
        ));
        assert!(md.contains("- **Average:** 105 ppm (high)"));
        assert!(md.contains("- **Sample distribution:** 1 low, 1 high"));
        assert!(md.contains("## Sample Data (first 2 rows)"));
        assert!(md.contains("| 5.0 | 10 | north field, plot 1 |"));
    }

    #[test]
    fn test_sample_cells_are_truncated() {
        let report = report(&["notes"], &[&["abcdefghijklmnopqrstuvwxyz"]]);
        let md = render_summary(&report);
        assert!(md.contains("| abcdefghijklmnopqrst |"));
    }

    #[test]
    fn test_quality_report_groups_issues() {
        let report = report(
            &["sand", "silt", "clay", "ph"],
            &[
                &["30", "30", "30", "-1"],
                &["30", "30", "30", "-1"],
            ],
        );
        let md = render_quality(&report);

        assert!(md.contains("### Duplicate Rows (Warning)"));
        assert!(md.contains("Row numbers: 2"));
        assert!(md.contains("### Negative Values (Error)"));
        assert!(md.contains("  Examples: row 1: -1, row 2: -1"));
        assert!(md.contains("### Consistency Violations (Warning)"));
        assert!(md.contains("- Row 1: 30 + 30 + 30 = 90 (texture expects 100)"));
    }

    #[test]
    fn test_clean_quality_report() {
        let table = DataTable::new(vec!["x".into()], vec![vec![Cell::from_text("1")]]);
        let source = SourceMetadata::new("x.csv".into(), String::new(), 0, "csv".into(), 1, 1);
        let report = Assay::new()
            .with_registry(ParameterRegistry::generic())
            .analyze_table(&table, source);

        let md = render_quality(&report);
        assert!(md.contains("### No Issues Found"));
        assert!(md.contains("- **Issues:** 0 (0 errors, 0 warnings, 0 info)"));
    }
}
