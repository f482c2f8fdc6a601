//! Table-wide validators: duplicates, outliers and missing data.

use std::collections::HashSet;

use tracing::debug;

use crate::input::{Cell, DataTable};
use crate::schema::round_to;

use super::issue::{QualityIssue, ValueExample};

/// Thresholds shared by the detectors and domain rules.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Minimum parsed numeric values before a column is checked for outliers.
    pub outlier_min_values: usize,
    /// IQR multiplier for the outlier fence.
    pub iqr_multiplier: f64,
    /// Null fraction at or above which a column is flagged.
    pub null_threshold: f64,
    /// Maximum example values attached to an issue.
    pub example_limit: usize,
    /// Atypical values are reported only above this fraction of rows.
    pub atypical_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            outlier_min_values: 10,
            iqr_multiplier: 1.5,
            null_threshold: 0.5,
            example_limit: 5,
            atypical_fraction: 0.1,
        }
    }
}

/// Trait for table validators.
pub trait Validator {
    /// Run validation and return issues.
    fn validate(&self, table: &DataTable) -> Vec<QualityIssue>;

    /// Get the validator name.
    fn name(&self) -> &'static str;
}

/// Finds rows that repeat an earlier row exactly.
pub struct DuplicateDetector;

impl DuplicateDetector {
    /// 1-indexed positions of every row whose full value tuple was already
    /// seen. The first occurrence is never reported.
    pub fn find_duplicates(table: &DataTable) -> Vec<usize> {
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut duplicates = Vec::new();

        for (idx, row) in table.rows.iter().enumerate() {
            let key: Vec<String> = (0..table.column_count())
                .map(|col| row.get(col).map(Cell::to_string).unwrap_or_default())
                .collect();
            if !seen.insert(key) {
                duplicates.push(idx + 1);
            }
        }

        duplicates
    }
}

impl Validator for DuplicateDetector {
    fn validate(&self, table: &DataTable) -> Vec<QualityIssue> {
        let rows = Self::find_duplicates(table);
        if rows.is_empty() {
            Vec::new()
        } else {
            vec![QualityIssue::Duplicate { rows }]
        }
    }

    fn name(&self) -> &'static str {
        "duplicate_detector"
    }
}

/// Outlier fence computed from positional quartiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fence {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    /// Whether a value lies strictly outside the fence.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Outliers found in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFinding {
    pub column: String,
    pub fence: Fence,
    pub count: usize,
    pub examples: Vec<ValueExample>,
}

impl From<OutlierFinding> for QualityIssue {
    fn from(finding: OutlierFinding) -> Self {
        QualityIssue::NumericOutlier {
            column: finding.column,
            lower: round_to(finding.fence.lower, 2),
            upper: round_to(finding.fence.upper, 2),
            count: finding.count,
            examples: finding.examples,
        }
    }
}

/// Flags numeric values outside an interquartile-range fence.
///
/// Quartiles are read straight from the sorted values at `n/4` and `3n/4`
/// (integer division) rather than interpolated.
pub struct OutlierDetector {
    min_values: usize,
    multiplier: f64,
    example_limit: usize,
}

impl OutlierDetector {
    /// Create a detector with default settings.
    pub fn new() -> Self {
        Self::with_config(&DetectionConfig::default())
    }

    /// Create a detector from shared detection settings.
    pub fn with_config(config: &DetectionConfig) -> Self {
        Self {
            min_values: config.outlier_min_values,
            multiplier: config.iqr_multiplier,
            example_limit: config.example_limit,
        }
    }

    /// Compute the fence, or `None` below the minimum value count.
    pub fn fence(&self, numbers: &[f64]) -> Option<Fence> {
        if numbers.len() < self.min_values || numbers.is_empty() {
            return None;
        }

        let mut sorted = numbers.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let q1 = sorted[n / 4];
        let q3 = sorted[3 * n / 4];
        let iqr = q3 - q1;

        Some(Fence {
            q1,
            q3,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
        })
    }

    /// Find outliers in one column. Returns `None` when the column has too
    /// few numeric values or nothing falls outside the fence.
    pub fn find_outliers<'a>(
        &self,
        column: &str,
        values: impl IntoIterator<Item = &'a Cell>,
    ) -> Option<OutlierFinding> {
        let parsed: Vec<(usize, f64)> = values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, cell)| cell.as_number().map(|n| (idx + 1, n)))
            .collect();
        let numbers: Vec<f64> = parsed.iter().map(|&(_, n)| n).collect();
        let fence = self.fence(&numbers)?;

        let flagged: Vec<ValueExample> = parsed
            .into_iter()
            .filter(|&(_, n)| fence.excludes(n))
            .map(|(row, value)| ValueExample { row, value })
            .collect();

        if flagged.is_empty() {
            return None;
        }

        Some(OutlierFinding {
            column: column.to_string(),
            fence,
            count: flagged.len(),
            examples: flagged.into_iter().take(self.example_limit).collect(),
        })
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for OutlierDetector {
    fn validate(&self, table: &DataTable) -> Vec<QualityIssue> {
        table
            .headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| self.find_outliers(name, table.column_values(idx)))
            .map(QualityIssue::from)
            .collect()
    }

    fn name(&self) -> &'static str {
        "outlier_detector"
    }
}

/// Flags columns with a high share of missing values.
pub struct CompletenessValidator {
    threshold: f64,
}

impl CompletenessValidator {
    /// Create a validator flagging columns at or above `threshold` nulls.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for CompletenessValidator {
    fn default() -> Self {
        Self::new(DetectionConfig::default().null_threshold)
    }
}

impl Validator for CompletenessValidator {
    fn validate(&self, table: &DataTable) -> Vec<QualityIssue> {
        let rows = table.row_count();
        if rows == 0 {
            return Vec::new();
        }

        let mut issues = Vec::new();
        for (idx, name) in table.headers.iter().enumerate() {
            let null_count = table.column_values(idx).filter(|v| v.is_missing()).count();
            let fraction = null_count as f64 / rows as f64;
            if fraction >= self.threshold {
                issues.push(QualityIssue::HighNull {
                    column: name.clone(),
                    null_count,
                    null_percentage: round_to(fraction * 100.0, 1),
                });
            }
        }
        issues
    }

    fn name(&self) -> &'static str {
        "completeness_validator"
    }
}

/// Runs a set of validators over a table, in registration order.
pub struct ValidationEngine<'a> {
    validators: Vec<Box<dyn Validator + 'a>>,
}

impl<'a> ValidationEngine<'a> {
    /// Create an engine with the default validators.
    pub fn new() -> Self {
        Self::with_config(&DetectionConfig::default())
    }

    /// Create an engine with the default validators and custom settings.
    pub fn with_config(config: &DetectionConfig) -> Self {
        Self {
            validators: vec![
                Box::new(DuplicateDetector),
                Box::new(CompletenessValidator::new(config.null_threshold)),
                Box::new(OutlierDetector::with_config(config)),
            ],
        }
    }

    /// Add a validator after the ones already registered.
    pub fn add_validator(&mut self, validator: impl Validator + 'a) {
        self.validators.push(Box::new(validator));
    }

    /// Names of the registered validators, in run order.
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run all validators.
    pub fn validate(&self, table: &DataTable) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(table);
            debug!(validator = validator.name(), issues = found.len(), "validator finished");
            issues.extend(found);
        }
        issues
    }
}

impl Default for ValidationEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}
