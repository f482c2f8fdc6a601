//! Domain rule evaluation over a table.
//!
//! Every check is a pure function of the table and the registry. Checks whose
//! columns are absent are skipped rather than failed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inference::StatisticsCalculator;
use crate::input::{Cell, DataTable};
use crate::schema::round_to;
use crate::validation::{DetectionConfig, QualityIssue, ValueExample, Validator};

use super::classify::{Classification, NutrientLevel, SplitPart, classify_value, split_part};
use super::matching::{ColumnMatch, ColumnMatcher, MatchMode};
use super::registry::{ParameterDefinition, ParameterRegistry, RatioRule, ScaleSummary, SumRule};

/// Sample counts for each part of a scale's three-way split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub summary: ScaleSummary,
    pub low: usize,
    pub middle: usize,
    pub high: usize,
}

/// Narrative assessment of one matched column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAssessment {
    pub column: String,
    pub parameter: String,
    /// Parameter name for headings, e.g. `Organic Matter`.
    pub display_name: String,
    pub unit: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Classification of the (rounded) mean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Samples per classification label, in scale or level order. Zero
    /// counts are omitted.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub level_counts: IndexMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitCounts>,
}

/// Evaluates registry rules against a table.
#[derive(Debug, Clone)]
pub struct DomainRuleEngine<'r> {
    registry: &'r ParameterRegistry,
    mode: MatchMode,
    config: DetectionConfig,
}

impl<'r> DomainRuleEngine<'r> {
    pub fn new(registry: &'r ParameterRegistry) -> Self {
        Self {
            registry,
            mode: MatchMode::default(),
            config: DetectionConfig::default(),
        }
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &'r ParameterRegistry {
        self.registry
    }

    /// Resolve table columns to registry parameters.
    pub fn match_columns(&self, table: &DataTable) -> Vec<ColumnMatch<'r>> {
        ColumnMatcher::new(self.registry, self.mode).match_headers(&table.headers)
    }

    /// Run every domain check.
    pub fn evaluate(&self, table: &DataTable) -> Vec<QualityIssue> {
        let matches = self.match_columns(table);
        debug!(
            registry = self.registry.name(),
            matched = matches.len(),
            "matched columns to parameters"
        );

        let mut issues = self.check_negative_values(table, &matches);
        issues.extend(self.check_ranges(table, &matches));
        issues.extend(self.check_sum_rules(table, &matches));
        issues.extend(self.check_ratio_rules(table, &matches));
        issues
    }

    /// Impossible values (outside the valid range) and, when frequent enough,
    /// atypical values (valid but outside the typical range).
    pub fn check_ranges(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for m in matches {
            let param = m.parameter;
            if param.valid_range.is_none() && param.typical_range.is_none() {
                continue;
            }

            let mut impossible = Vec::new();
            let mut atypical = 0usize;
            for (row, value) in numeric_rows(table, m.index) {
                if param.valid_range.is_some_and(|r| !r.contains(value)) {
                    impossible.push(ValueExample { row, value });
                } else if param.typical_range.is_some_and(|r| !r.contains(value)) {
                    atypical += 1;
                }
            }

            let column = &table.headers[m.index];
            if let Some(valid_range) = param.valid_range.filter(|_| !impossible.is_empty()) {
                issues.push(QualityIssue::RangeViolation {
                    column: column.clone(),
                    parameter: param.name.clone(),
                    count: impossible.len(),
                    valid_range,
                    examples: self.limit(impossible),
                });
            }
            let frequent =
                atypical as f64 > table.row_count() as f64 * self.config.atypical_fraction;
            if let Some(typical_range) = param.typical_range.filter(|_| frequent) {
                issues.push(QualityIssue::AtypicalValue {
                    column: column.clone(),
                    parameter: param.name.clone(),
                    count: atypical,
                    typical_range,
                });
            }
        }

        issues
    }

    /// Values below zero in any matched column.
    pub fn check_negative_values(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<QualityIssue> {
        matches
            .iter()
            .filter_map(|m| {
                let negatives: Vec<ValueExample> = numeric_rows(table, m.index)
                    .filter(|&(_, value)| value < 0.0)
                    .map(|(row, value)| ValueExample { row, value })
                    .collect();
                if negatives.is_empty() {
                    return None;
                }
                Some(QualityIssue::NegativeValue {
                    column: table.headers[m.index].clone(),
                    parameter: m.parameter.name.clone(),
                    count: negatives.len(),
                    examples: self.limit(negatives),
                })
            })
            .collect()
    }

    /// One issue per row whose member columns miss their target sum.
    pub fn check_sum_rules(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<QualityIssue> {
        self.registry
            .sum_rules()
            .iter()
            .flat_map(|rule| check_sum_rule(rule, table, matches))
            .collect()
    }

    /// One issue per ratio rule with at least one row outside its range.
    pub fn check_ratio_rules(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<QualityIssue> {
        self.registry
            .ratio_rules()
            .iter()
            .filter_map(|rule| self.check_ratio_rule(rule, table, matches))
            .collect()
    }

    fn check_ratio_rule(
        &self,
        rule: &RatioRule,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Option<QualityIssue> {
        let num_col = column_for(matches, &rule.numerator)?;
        let den_col = column_for(matches, &rule.denominator)?;

        let imbalanced: Vec<ValueExample> = (0..table.row_count())
            .filter_map(|row| {
                let numerator = number_at(table, row, num_col)?;
                let denominator = number_at(table, row, den_col)?;
                if denominator <= 0.0 {
                    return None;
                }
                let ratio = numerator / denominator;
                (!rule.range.contains(ratio)).then(|| ValueExample {
                    row: row + 1,
                    value: round_to(ratio, 2),
                })
            })
            .collect();

        if imbalanced.is_empty() {
            return None;
        }

        Some(QualityIssue::RatioImbalance {
            ratio: rule.name.clone(),
            numerator: table.headers[num_col].clone(),
            denominator: table.headers[den_col].clone(),
            count: imbalanced.len(),
            range: rule.range,
            examples: self.limit(imbalanced),
        })
    }

    /// Per-row classification of a matched column. Rows whose value does not
    /// parse, and parameters with no scale or thresholds, yield `None`.
    pub fn classify_column(
        &self,
        table: &DataTable,
        m: &ColumnMatch<'_>,
    ) -> Vec<Option<Classification>> {
        table
            .column_values(m.index)
            .map(|cell| cell.as_number().and_then(|v| classify_value(m.parameter, v)))
            .collect()
    }

    /// Summaries of every matched column that has numeric values.
    pub fn assess(
        &self,
        table: &DataTable,
        matches: &[ColumnMatch<'_>],
    ) -> Vec<ParameterAssessment> {
        matches
            .iter()
            .filter_map(|m| self.assess_column(table, m))
            .collect()
    }

    fn assess_column(&self, table: &DataTable, m: &ColumnMatch<'_>) -> Option<ParameterAssessment> {
        let param = m.parameter;
        let stats = StatisticsCalculator::compute(table.column_values(m.index))?.rounded(2);

        let mut counts: IndexMap<String, usize> = label_order(param)
            .into_iter()
            .map(|label| (label, 0))
            .collect();
        for class in self.classify_column(table, m).into_iter().flatten() {
            *counts.entry(class.label().to_string()).or_insert(0) += 1;
        }
        counts.retain(|_, count| *count > 0);

        let split = param
            .scale
            .as_ref()
            .and_then(|s| s.summary.as_ref())
            .map(|summary| {
                let mut split = SplitCounts {
                    summary: summary.clone(),
                    low: 0,
                    middle: 0,
                    high: 0,
                };
                for (_, value) in numeric_rows(table, m.index) {
                    match split_part(summary, value) {
                        SplitPart::Low => split.low += 1,
                        SplitPart::Middle => split.middle += 1,
                        SplitPart::High => split.high += 1,
                    }
                }
                split
            });

        Some(ParameterAssessment {
            column: table.headers[m.index].clone(),
            parameter: param.name.clone(),
            display_name: param.display_name(),
            unit: param.unit.clone(),
            mean: stats.mean,
            min: stats.min,
            max: stats.max,
            classification: classify_value(param, stats.mean).map(|c| c.label().to_string()),
            level_counts: counts,
            split,
        })
    }

    fn limit(&self, mut examples: Vec<ValueExample>) -> Vec<ValueExample> {
        examples.truncate(self.config.example_limit);
        examples
    }
}

impl Validator for DomainRuleEngine<'_> {
    fn validate(&self, table: &DataTable) -> Vec<QualityIssue> {
        self.evaluate(table)
    }

    fn name(&self) -> &'static str {
        "domain_rule_engine"
    }
}

fn check_sum_rule(
    rule: &SumRule,
    table: &DataTable,
    matches: &[ColumnMatch<'_>],
) -> Vec<QualityIssue> {
    let Some(columns) = rule
        .members
        .iter()
        .map(|member| column_for(matches, member))
        .collect::<Option<Vec<usize>>>()
    else {
        return Vec::new();
    };
    let names: Vec<String> = columns.iter().map(|&c| table.headers[c].clone()).collect();

    (0..table.row_count())
        .filter_map(|row| {
            let values = columns
                .iter()
                .map(|&col| number_at(table, row, col))
                .collect::<Option<Vec<f64>>>()?;
            let total: f64 = values.iter().sum();
            if (total - rule.target).abs() <= rule.tolerance {
                return None;
            }
            Some(QualityIssue::ConsistencyViolation {
                rule: rule.name.clone(),
                row: row + 1,
                columns: names.clone(),
                values,
                total: round_to(total, 1),
                target: rule.target,
                tolerance: rule.tolerance,
            })
        })
        .collect()
}

/// Column position matched to `parameter`; the last matching column wins.
fn column_for(matches: &[ColumnMatch<'_>], parameter: &str) -> Option<usize> {
    matches
        .iter()
        .rev()
        .find(|m| m.parameter.name == parameter)
        .map(|m| m.index)
}

fn number_at(table: &DataTable, row: usize, col: usize) -> Option<f64> {
    table.get(row, col).and_then(Cell::as_number)
}

/// `(1-indexed row, value)` for every parsable value of a column.
fn numeric_rows(table: &DataTable, col: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
    table
        .column_values(col)
        .enumerate()
        .filter_map(|(idx, cell)| cell.as_number().map(|v| (idx + 1, v)))
}

fn label_order(param: &ParameterDefinition) -> Vec<String> {
    match (&param.scale, &param.thresholds) {
        (Some(scale), _) => scale.bands.iter().map(|b| b.label.clone()).collect(),
        (None, Some(_)) => NutrientLevel::ALL
            .iter()
            .map(|l| l.label().to_string())
            .collect(),
        (None, None) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueRange;

    fn make_table(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from_text(*v)).collect())
                .collect(),
        )
    }

    fn soil_engine() -> DomainRuleEngine<'static> {
        DomainRuleEngine::new(ParameterRegistry::soil())
    }

    fn run(table: &DataTable) -> Vec<QualityIssue> {
        soil_engine().evaluate(table)
    }

    #[test]
    fn test_texture_within_tolerance() {
        let table = make_table(
            &["sand", "silt", "clay"],
            &[&["33", "33", "34"], &["40", "40", "24"]],
        );
        assert!(run(&table).is_empty());
    }

    #[test]
    fn test_texture_violation() {
        let table = make_table(
            &["sand", "silt", "clay"],
            &[&["33", "33", "34"], &["30", "30", "30"], &["30", "", "30"]],
        );
        let issues = run(&table);

        assert_eq!(issues.len(), 1);
        match &issues[0] {
            QualityIssue::ConsistencyViolation { row, total, values, .. } => {
                assert_eq!(*row, 2);
                assert_eq!(*total, 90.0);
                assert_eq!(values, &vec![30.0, 30.0, 30.0]);
            }
            other => panic!("unexpected issue: {:?}", other),
        }
    }

    #[test]
    fn test_texture_skipped_without_all_members() {
        let table = make_table(&["sand", "clay"], &[&["10", "10"]]);
        assert!(run(&table).is_empty());
    }

    #[test]
    fn test_ratio_imbalance() {
        let table = make_table(
            &["ca", "mg"],
            &[&["1000", "200"], &["1000", "1000"], &["1000", "0"], &["x", "10"], &["3000", "100"]],
        );
        let engine = soil_engine();
        let issues = engine.check_ratio_rules(&table, &engine.match_columns(&table));

        assert_eq!(issues.len(), 1);
        match &issues[0] {
            QualityIssue::RatioImbalance { ratio, count, examples, range, .. } => {
                assert_eq!(ratio, "Ca:Mg");
                assert_eq!(*count, 2);
                assert_eq!(*range, ValueRange::new(2.0, 10.0));
                assert_eq!(examples[0], ValueExample { row: 2, value: 1.0 });
                assert_eq!(examples[1], ValueExample { row: 5, value: 30.0 });
            }
            other => panic!("unexpected issue: {:?}", other),
        }
    }

    #[test]
    fn test_impossible_and_negative_values() {
        let table = make_table(&["pH"], &[&["6.5"], &["-1"], &["14"]]);
        let issues = run(&table);

        let negative = issues
            .iter()
            .find(|i| matches!(i, QualityIssue::NegativeValue { .. }))
            .unwrap();
        assert_eq!(negative.examples(), &[ValueExample { row: 2, value: -1.0 }]);

        let impossible = issues
            .iter()
            .find(|i| matches!(i, QualityIssue::RangeViolation { .. }))
            .unwrap();
        match impossible {
            QualityIssue::RangeViolation { count, parameter, column, .. } => {
                assert_eq!(*count, 2);
                assert_eq!(parameter, "ph");
                assert_eq!(column, "pH");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_atypical_needs_more_than_ten_percent() {
        // 4.0 is valid (>= 3.5) but below the typical minimum of 4.5.
        let typical: &[&str] = &["6.5"];
        let mut rows = vec![typical; 9];
        rows.push(&["4.0"]);
        let table = make_table(&["ph"], &rows);
        assert!(run(&table).is_empty());

        rows.push(&["4.0"]);
        let table = make_table(&["ph"], &rows);
        let issues = run(&table);
        assert_eq!(issues.len(), 1);
        assert!(matches!(
            &issues[0],
            QualityIssue::AtypicalValue { count: 2, .. }
        ));
    }

    #[test]
    fn test_examples_are_limited() {
        let negative: &[&str] = &["-5"];
        let table = make_table(&["nitrogen"], &vec![negative; 8]);
        let engine = soil_engine();
        let issues = engine.check_negative_values(&table, &engine.match_columns(&table));

        assert_eq!(issues.len(), 1);
        match &issues[0] {
            QualityIssue::NegativeValue { count, examples, .. } => {
                assert_eq!(*count, 8);
                assert_eq!(examples.len(), 5);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_assess_ph() {
        let table = make_table(&["ph"], &[&["5.0"], &["6.5"], &["7.5"], &["8.0"]]);
        let engine = soil_engine();
        let matches = engine.match_columns(&table);
        let assessments = engine.assess(&table, &matches);

        assert_eq!(assessments.len(), 1);
        let ph = &assessments[0];
        assert_eq!(ph.mean, 6.75);
        assert_eq!(ph.classification.as_deref(), Some("neutral (slightly acidic)"));
        let split = ph.split.as_ref().unwrap();
        assert_eq!((split.low, split.middle, split.high), (1, 2, 1));
        assert_eq!(ph.level_counts.get("strongly acidic"), Some(&1));
        assert!(!ph.level_counts.contains_key("extremely acidic"));
    }

    #[test]
    fn test_assess_nutrient_levels() {
        let table = make_table(
            &["Nitrogen (ppm)", "zinc"],
            &[&["5", "1"], &["15", "2"], &["30", "3"], &["80", ""]],
        );
        let engine = soil_engine();
        let matches = engine.match_columns(&table);
        let assessments = engine.assess(&table, &matches);

        assert_eq!(assessments.len(), 2);
        let nitrogen = &assessments[0];
        assert_eq!(nitrogen.parameter, "nitrogen");
        assert_eq!(nitrogen.mean, 32.5);
        assert_eq!(nitrogen.classification.as_deref(), Some("adequate"));
        let order: Vec<&str> = nitrogen.level_counts.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["deficient", "low", "adequate", "high"]);
        assert!(nitrogen.split.is_none());

        let zinc = &assessments[1];
        assert!(zinc.classification.is_none());
        assert!(zinc.level_counts.is_empty());
    }

    #[test]
    fn test_classify_column() {
        let table = make_table(&["k"], &[&["100"], &["n/a"], &["300"]]);
        let engine = soil_engine();
        let matches = engine.match_columns(&table);
        let classes = engine.classify_column(&table, &matches[0]);

        assert_eq!(
            classes,
            vec![
                Some(Classification::Level(NutrientLevel::Low)),
                None,
                Some(Classification::Level(NutrientLevel::High)),
            ]
        );
    }

    #[test]
    fn test_generic_registry_has_no_domain_issues() {
        let registry = ParameterRegistry::generic();
        let table = make_table(&["ph"], &[&["-4"]]);
        assert!(DomainRuleEngine::new(&registry).evaluate(&table).is_empty());
    }

    #[test]
    fn test_runs_as_registered_validator() {
        use crate::validation::{IssueCategory, ValidationEngine};

        let table = make_table(&["ph"], &[&["-1"], &["-1"]]);
        let engine = soil_engine();
        let mut validation = ValidationEngine::new();
        validation.add_validator(engine.clone());

        let issues = validation.validate(&table);
        assert_eq!(validation.validator_names().last(), Some(&"domain_rule_engine"));
        assert_eq!(issues[0].category(), IssueCategory::Duplicate);
        assert_eq!(&issues[1..], engine.evaluate(&table).as_slice());
    }
}
