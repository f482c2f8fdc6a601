//! Threshold and band classification of single values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registry::{ParameterDefinition, Scale, ScaleSummary, Thresholds};

/// Agronomic level of a measured value relative to its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientLevel {
    Deficient,
    Low,
    Adequate,
    High,
    Excessive,
}

impl NutrientLevel {
    pub const ALL: [NutrientLevel; 5] = [
        NutrientLevel::Deficient,
        NutrientLevel::Low,
        NutrientLevel::Adequate,
        NutrientLevel::High,
        NutrientLevel::Excessive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NutrientLevel::Deficient => "deficient",
            NutrientLevel::Low => "low",
            NutrientLevel::Adequate => "adequate",
            NutrientLevel::High => "high",
            NutrientLevel::Excessive => "excessive",
        }
    }
}

impl fmt::Display for NutrientLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare against thresholds: critical low, low, critical high, high, in
/// that order. A value equal to a bound is not beyond it.
pub fn classify_level(thresholds: &Thresholds, value: f64) -> NutrientLevel {
    let below = |bound: Option<f64>| bound.is_some_and(|b| value < b);
    let above = |bound: Option<f64>| bound.is_some_and(|b| value > b);

    if below(thresholds.critical_low) {
        NutrientLevel::Deficient
    } else if below(thresholds.low) {
        NutrientLevel::Low
    } else if above(thresholds.critical_high) {
        NutrientLevel::Excessive
    } else if above(thresholds.high) {
        NutrientLevel::High
    } else {
        NutrientLevel::Adequate
    }
}

/// Label of the first band whose upper bound exceeds `value`.
pub fn classify_band(scale: &Scale, value: f64) -> Option<&str> {
    scale
        .bands
        .iter()
        .find(|band| band.below.is_none_or(|bound| value < bound))
        .map(|band| band.label.as_str())
}

/// Which part of a three-way split a value falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPart {
    Low,
    Middle,
    High,
}

pub fn split_part(summary: &ScaleSummary, value: f64) -> SplitPart {
    if value < summary.lower {
        SplitPart::Low
    } else if value > summary.upper {
        SplitPart::High
    } else {
        SplitPart::Middle
    }
}

/// Result of classifying one value against a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Label of a scale band.
    Band(String),
    Level(NutrientLevel),
}

impl Classification {
    pub fn label(&self) -> &str {
        match self {
            Classification::Band(label) => label,
            Classification::Level(level) => level.label(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a value using the parameter's scale when it has one, otherwise
/// its thresholds. Parameters with neither yield `None`.
pub fn classify_value(param: &ParameterDefinition, value: f64) -> Option<Classification> {
    if let Some(scale) = &param.scale {
        return classify_band(scale, value).map(|label| Classification::Band(label.to_string()));
    }
    param
        .thresholds
        .as_ref()
        .map(|t| Classification::Level(classify_level(t, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParameterRegistry;

    fn soil(name: &str) -> &'static ParameterDefinition {
        ParameterRegistry::soil().get(name).unwrap()
    }

    fn ph_label(value: f64) -> String {
        classify_value(soil("ph"), value).unwrap().label().to_string()
    }

    #[test]
    fn test_ph_bands() {
        assert_eq!(ph_label(4.0), "extremely acidic");
        assert_eq!(ph_label(4.5), "strongly acidic");
        assert_eq!(ph_label(5.0), "strongly acidic");
        assert_eq!(ph_label(5.5), "moderately acidic");
        assert_eq!(ph_label(6.2), "slightly acidic");
        assert_eq!(ph_label(6.8), "neutral (slightly acidic)");
        assert_eq!(ph_label(7.0), "neutral (slightly alkaline)");
        assert_eq!(ph_label(7.9), "slightly alkaline");
        assert_eq!(ph_label(8.4), "moderately alkaline");
        assert_eq!(ph_label(8.5), "strongly alkaline");
        assert_eq!(ph_label(9.0), "strongly alkaline");
    }

    #[test]
    fn test_level_boundaries() {
        let nitrogen = soil("nitrogen").thresholds.unwrap();

        assert_eq!(classify_level(&nitrogen, 5.0), NutrientLevel::Deficient);
        assert_eq!(classify_level(&nitrogen, 10.0), NutrientLevel::Low);
        assert_eq!(classify_level(&nitrogen, 20.0), NutrientLevel::Adequate);
        assert_eq!(classify_level(&nitrogen, 50.0), NutrientLevel::Adequate);
        assert_eq!(classify_level(&nitrogen, 50.5), NutrientLevel::High);
    }

    #[test]
    fn test_absent_thresholds_are_skipped() {
        let ec = soil("ec").thresholds.unwrap();

        assert_eq!(classify_level(&ec, 0.0), NutrientLevel::Adequate);
        assert_eq!(classify_level(&ec, 3.0), NutrientLevel::High);
        assert_eq!(classify_level(&ec, 4.5), NutrientLevel::Excessive);
        assert_eq!(classify_level(&Thresholds::new(), -100.0), NutrientLevel::Adequate);
    }

    #[test]
    fn test_unclassified_parameter() {
        assert!(classify_value(soil("zinc"), 3.0).is_none());
        assert_eq!(
            classify_value(soil("potassium"), 100.0),
            Some(Classification::Level(NutrientLevel::Low))
        );
    }

    #[test]
    fn test_split_part_inclusive_middle() {
        let summary = soil("ph").scale.as_ref().and_then(|s| s.summary.clone()).unwrap();

        assert_eq!(split_part(&summary, 5.9), SplitPart::Low);
        assert_eq!(split_part(&summary, 6.0), SplitPart::Middle);
        assert_eq!(split_part(&summary, 7.5), SplitPart::Middle);
        assert_eq!(split_part(&summary, 7.6), SplitPart::High);
    }
}
