//! Quality issue types for data quality findings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ValueRange;

/// Severity level of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational only, may not require action.
    Info,
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue that should be addressed.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Issue kinds, used for grouping in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Duplicate,
    HighNull,
    NegativeValue,
    RangeViolation,
    AtypicalValue,
    NumericOutlier,
    ConsistencyViolation,
    RatioImbalance,
}

impl IssueCategory {
    /// Section heading for this category.
    pub fn label(&self) -> &'static str {
        match self {
            IssueCategory::Duplicate => "Duplicate Rows",
            IssueCategory::HighNull => "High Missing Data",
            IssueCategory::NegativeValue => "Negative Values",
            IssueCategory::RangeViolation => "Impossible Values",
            IssueCategory::AtypicalValue => "Atypical Values",
            IssueCategory::NumericOutlier => "Potential Outliers",
            IssueCategory::ConsistencyViolation => "Consistency Violations",
            IssueCategory::RatioImbalance => "Ratio Imbalances",
        }
    }
}

/// A flagged value and the 1-indexed row it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueExample {
    pub row: usize,
    pub value: f64,
}

impl fmt::Display for ValueExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.value)
    }
}

/// A data quality finding.
///
/// Row numbers are 1-indexed with the first data row as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QualityIssue {
    /// Rows repeating an earlier row's full value tuple.
    Duplicate { rows: Vec<usize> },
    /// Column with a high share of missing values.
    HighNull {
        column: String,
        null_count: usize,
        null_percentage: f64,
    },
    /// Values outside the interquartile-range fence.
    NumericOutlier {
        column: String,
        lower: f64,
        upper: f64,
        count: usize,
        examples: Vec<ValueExample>,
    },
    /// Values inside the valid range but outside the typical range.
    AtypicalValue {
        column: String,
        parameter: String,
        count: usize,
        typical_range: ValueRange,
    },
    /// Values below zero for a parameter that cannot be negative.
    NegativeValue {
        column: String,
        parameter: String,
        count: usize,
        examples: Vec<ValueExample>,
    },
    /// Physically impossible values outside the valid range.
    RangeViolation {
        column: String,
        parameter: String,
        count: usize,
        valid_range: ValueRange,
        examples: Vec<ValueExample>,
    },
    /// A row whose member columns do not add up to the expected total.
    ConsistencyViolation {
        rule: String,
        row: usize,
        columns: Vec<String>,
        values: Vec<f64>,
        total: f64,
        target: f64,
        tolerance: f64,
    },
    /// Rows whose ratio of two columns falls outside the acceptable range.
    RatioImbalance {
        ratio: String,
        numerator: String,
        denominator: String,
        count: usize,
        range: ValueRange,
        examples: Vec<ValueExample>,
    },
}

impl QualityIssue {
    /// Category of this issue.
    pub fn category(&self) -> IssueCategory {
        match self {
            QualityIssue::Duplicate { .. } => IssueCategory::Duplicate,
            QualityIssue::HighNull { .. } => IssueCategory::HighNull,
            QualityIssue::NumericOutlier { .. } => IssueCategory::NumericOutlier,
            QualityIssue::AtypicalValue { .. } => IssueCategory::AtypicalValue,
            QualityIssue::NegativeValue { .. } => IssueCategory::NegativeValue,
            QualityIssue::RangeViolation { .. } => IssueCategory::RangeViolation,
            QualityIssue::ConsistencyViolation { .. } => IssueCategory::ConsistencyViolation,
            QualityIssue::RatioImbalance { .. } => IssueCategory::RatioImbalance,
        }
    }

    /// Severity of this issue.
    pub fn severity(&self) -> Severity {
        match self {
            QualityIssue::NegativeValue { .. } | QualityIssue::RangeViolation { .. } => {
                Severity::Error
            }
            QualityIssue::AtypicalValue { .. } => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Columns this issue refers to. Duplicates span the whole row.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            QualityIssue::Duplicate { .. } => Vec::new(),
            QualityIssue::HighNull { column, .. }
            | QualityIssue::NumericOutlier { column, .. }
            | QualityIssue::AtypicalValue { column, .. }
            | QualityIssue::NegativeValue { column, .. }
            | QualityIssue::RangeViolation { column, .. } => vec![column.as_str()],
            QualityIssue::ConsistencyViolation { columns, .. } => {
                columns.iter().map(String::as_str).collect()
            }
            QualityIssue::RatioImbalance {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            QualityIssue::Duplicate { rows } => {
                format!("Found {} duplicate row(s)", rows.len())
            }
            QualityIssue::HighNull {
                column,
                null_count,
                null_percentage,
            } => format!("{}: {} missing ({}%)", column, null_count, null_percentage),
            QualityIssue::NumericOutlier {
                column,
                lower,
                upper,
                count,
                ..
            } => format!("{}: {} values outside {} to {}", column, count, lower, upper),
            QualityIssue::AtypicalValue {
                column,
                parameter,
                count,
                typical_range,
            } => format!(
                "{} ({}): {} atypical value(s), typical range {}",
                column, parameter, count, typical_range
            ),
            QualityIssue::NegativeValue {
                column,
                parameter,
                count,
                ..
            } => format!("{} ({}): {} negative value(s)", column, parameter, count),
            QualityIssue::RangeViolation {
                column,
                parameter,
                count,
                valid_range,
                ..
            } => format!(
                "{} ({}): {} impossible value(s), valid range {}",
                column, parameter, count, valid_range
            ),
            QualityIssue::ConsistencyViolation {
                rule,
                row,
                values,
                total,
                target,
                ..
            } => {
                let terms: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!(
                    "Row {}: {} = {} ({} expects {})",
                    row,
                    terms.join(" + "),
                    total,
                    rule,
                    target
                )
            }
            QualityIssue::RatioImbalance {
                ratio,
                count,
                range,
                ..
            } => format!(
                "{} ratio: {} sample(s) outside ideal range ({})",
                ratio, count, range
            ),
        }
    }

    /// Example values attached to this issue, if any.
    pub fn examples(&self) -> &[ValueExample] {
        match self {
            QualityIssue::NumericOutlier { examples, .. }
            | QualityIssue::NegativeValue { examples, .. }
            | QualityIssue::RangeViolation { examples, .. }
            | QualityIssue::RatioImbalance { examples, .. } => examples,
            _ => &[],
        }
    }
}
