//! Statistical analysis for column type and distribution inference.

use crate::input::Cell;
use crate::schema::{ColumnType, Statistics};

/// Settings for sampling-based type inference.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Number of leading non-missing values inspected per column.
    pub sample_size: usize,
    /// Fraction of sampled values that must parse as numbers; the column is
    /// numeric only when this fraction is strictly exceeded.
    pub numeric_ratio: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            numeric_ratio: 0.8,
        }
    }
}

/// Classifies columns as numeric, string or empty.
///
/// Only a leading sample of each column is inspected, so classification of
/// very wide or long columns is approximate.
pub struct TypeInferencer {
    config: InferenceConfig,
}

impl TypeInferencer {
    /// Create an inferencer with default settings.
    pub fn new() -> Self {
        Self::with_config(InferenceConfig::default())
    }

    /// Create an inferencer with custom settings.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Infer the type of a column from its values.
    pub fn infer<'a>(&self, values: impl IntoIterator<Item = &'a Cell>) -> ColumnType {
        let sample: Vec<&Cell> = values
            .into_iter()
            .filter(|v| !v.is_missing())
            .take(self.config.sample_size)
            .collect();

        if sample.is_empty() {
            return ColumnType::Empty;
        }

        let numeric = sample.iter().filter(|v| v.as_number().is_some()).count();
        if numeric as f64 > sample.len() as f64 * self.config.numeric_ratio {
            ColumnType::Numeric
        } else {
            ColumnType::String
        }
    }
}

impl Default for TypeInferencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes descriptive statistics over every numeric value of a column.
pub struct StatisticsCalculator;

impl StatisticsCalculator {
    /// Compute statistics, or `None` when no value parses as a number.
    ///
    /// Values that do not parse are skipped silently.
    pub fn compute<'a>(values: impl IntoIterator<Item = &'a Cell>) -> Option<Statistics> {
        let numbers: Vec<f64> = values.into_iter().filter_map(Cell::as_number).collect();
        Self::from_numbers(numbers)
    }

    /// Compute statistics from already-parsed numbers.
    pub fn from_numbers(mut numbers: Vec<f64>) -> Option<Statistics> {
        if numbers.is_empty() {
            return None;
        }

        numbers.sort_by(f64::total_cmp);
        let n = numbers.len();
        let mean = mean_of(&numbers);
        let median = if n % 2 == 1 {
            numbers[n / 2]
        } else {
            (numbers[n / 2 - 1] + numbers[n / 2]) / 2.0
        };

        Some(Statistics {
            count: n,
            min: numbers[0],
            max: numbers[n - 1],
            mean,
            median,
            spread: population_spread(&numbers, mean),
        })
    }
}

fn mean_of(numbers: &[f64]) -> f64 {
    let n = numbers.len() as f64;
    let sum = numbers.iter().sum::<f64>();
    if sum.is_finite() {
        sum / n
    } else {
        numbers.iter().map(|x| x / n).sum()
    }
}

fn population_spread(numbers: &[f64], mean: f64) -> f64 {
    let n = numbers.len() as f64;
    let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if variance.is_finite() {
        return variance.sqrt();
    }

    // Squared deviations overflowed; work relative to the largest magnitude.
    let scale = numbers.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    let scaled = numbers
        .iter()
        .map(|x| (x / scale - mean / scale).powi(2))
        .sum::<f64>()
        / n;
    scaled.sqrt() * scale
}
