//! Column profile and descriptive statistics.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// Descriptive statistics for the numeric values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of values that parsed as numbers.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (squared deviations divided by `count`).
    pub spread: f64,
}

impl Statistics {
    /// Copy with every float rounded to `digits` decimal places.
    pub fn rounded(&self, digits: i32) -> Self {
        Self {
            count: self.count,
            min: round_to(self.min, digits),
            max: round_to(self.max, digits),
            mean: round_to(self.mean, digits),
            median: round_to(self.median, digits),
            spread: round_to(self.spread, digits),
        }
    }

    /// Compact one-line summary, e.g. `min=1, max=9, mean=5, std=2.1`.
    pub fn summary(&self) -> String {
        format!(
            "min={}, max={}, mean={}, std={}",
            self.min, self.max, self.mean, self.spread
        )
    }
}

/// Beyond this magnitude an `f64` has no fractional digits left to round.
const ROUNDING_LIMIT: f64 = 1e15;

/// Round half away from zero to a fixed number of decimals.
///
/// Values too large to carry decimals are returned unchanged.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let scaled = value * factor;
    if value.abs() >= ROUNDING_LIMIT || !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

/// A column matched to a registry parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMatch {
    /// Canonical parameter name.
    pub name: String,
    /// Measurement unit of the parameter.
    pub unit: String,
}

/// Profile of a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Zero-based position in the table.
    pub position: usize,
    /// Inferred data type.
    pub column_type: ColumnType,
    /// Registry parameter this column was matched to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<ParameterMatch>,
    /// Number of missing values.
    pub missing_count: usize,
    /// Missing values as a percentage of rows.
    pub missing_percentage: f64,
    /// Statistics for numeric columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

impl ColumnProfile {
    /// Create a profile with basic information.
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
            column_type: ColumnType::Empty,
            parameter: None,
            missing_count: 0,
            missing_percentage: 0.0,
            statistics: None,
        }
    }

    /// Whether the column has any missing values.
    pub fn nullable(&self) -> bool {
        self.missing_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_keeps_count() {
        let stats = Statistics {
            count: 3,
            min: 1.004,
            max: 9.996,
            mean: 5.555,
            median: 5.0,
            spread: 2.345_678,
        };
        let rounded = stats.rounded(2);

        assert_eq!(rounded.count, 3);
        assert_eq!(rounded.min, 1.0);
        assert_eq!(rounded.max, 10.0);
        assert_eq!(rounded.spread, 2.35);
    }

    #[test]
    fn test_summary_format() {
        let stats = Statistics {
            count: 2,
            min: 10.0,
            max: 200.0,
            mean: 105.0,
            median: 105.0,
            spread: 95.0,
        };
        assert_eq!(stats.summary(), "min=10, max=200, mean=105, std=95");
    }

    #[test]
    fn test_round_to_leaves_huge_values_alone() {
        assert_eq!(round_to(2e307, 2), 2e307);
        assert_eq!(round_to(-1.5e308, 2), -1.5e308);
        assert_eq!(round_to(1e16 + 2.0, 1), 1e16 + 2.0);
        assert_eq!(round_to(123.456, 2), 123.46);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }
}
