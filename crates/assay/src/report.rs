//! Report data model and assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ColumnMatch, ParameterAssessment};
use crate::inference::{InferenceConfig, StatisticsCalculator, TypeInferencer};
use crate::input::{DataTable, SourceMetadata};
use crate::schema::{ColumnProfile, ParameterMatch, round_to};
use crate::validation::{IssueCategory, QualityIssue, Severity};

/// Counts of issues by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl IssueCounts {
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Columns matched to a registry parameter.
    pub matched_columns: usize,
    pub issues_by_severity: IssueCounts,
}

/// Everything learned about one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub source: SourceMetadata,
    /// Name of the parameter registry the domain rules came from.
    pub registry: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub issues: Vec<QualityIssue>,
    pub assessments: Vec<ParameterAssessment>,
    /// Header order preserved.
    pub sample_headers: Vec<String>,
    /// Leading rows rendered as display strings.
    pub sample_rows: Vec<Vec<String>>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issues grouped by category, in category order.
    pub fn issues_by_category(&self) -> BTreeMap<IssueCategory, Vec<&QualityIssue>> {
        let mut groups: BTreeMap<IssueCategory, Vec<&QualityIssue>> = BTreeMap::new();
        for issue in &self.issues {
            groups.entry(issue.category()).or_default().push(issue);
        }
        groups
    }

    /// Profiles of columns matched to a parameter.
    pub fn matched_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.parameter.is_some())
    }
}

/// Builds column profiles and the final report.
pub struct ReportAssembler {
    inferencer: TypeInferencer,
    sample_rows: usize,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self {
            inferencer: TypeInferencer::new(),
            sample_rows: 5,
        }
    }

    pub fn with_inference(mut self, config: InferenceConfig) -> Self {
        self.inferencer = TypeInferencer::with_config(config);
        self
    }

    /// Number of leading rows copied into the report.
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Profile every column in header order.
    ///
    /// Statistics are attached to numeric columns only and rounded to two
    /// decimals here, never earlier.
    pub fn profile_columns(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<ColumnProfile> {
        let rows = table.row_count();

        table
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut profile = ColumnProfile::new(name.clone(), idx);
                profile.column_type = self.inferencer.infer(table.column_values(idx));
                profile.missing_count = table.column_values(idx).filter(|c| c.is_missing()).count();
                if rows > 0 {
                    profile.missing_percentage =
                        round_to(100.0 * profile.missing_count as f64 / rows as f64, 1);
                }
                if profile.column_type.is_numeric() {
                    profile.statistics = StatisticsCalculator::compute(table.column_values(idx))
                        .map(|s| s.rounded(2));
                }
                profile.parameter = matches.iter().find(|m| m.index == idx).map(|m| ParameterMatch {
                    name: m.parameter.name.clone(),
                    unit: m.parameter.unit.clone(),
                });
                profile
            })
            .collect()
    }

    /// Assemble the report from pipeline outputs.
    pub fn assemble(
        &self,
        source: SourceMetadata,
        registry: &str,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
        issues: Vec<QualityIssue>,
        assessments: Vec<ParameterAssessment>,
    ) -> Report {
        let columns = self.profile_columns(table, matches);

        let mut counts = IssueCounts::default();
        for issue in &issues {
            match issue.severity() {
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }

        let sample_rows = table
            .rows
            .iter()
            .take(self.sample_rows)
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        Report {
            source,
            registry: registry.to_string(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            summary: ReportSummary {
                matched_columns: matches.len(),
                issues_by_severity: counts,
            },
            columns,
            issues,
            assessments,
            sample_headers: table.headers.clone(),
            sample_rows,
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}
