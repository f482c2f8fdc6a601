//! Domain knowledge: parameter registries and the rules evaluated against them.
//!
//! The engine is registry-driven. The built-in soil registry is one instance;
//! any registry of the same shape (see [`ParameterRegistry::from_json_str`])
//! plugs into the same matching, classification and rule checks.

mod classify;
mod matching;
mod registry;
mod rules;

pub use classify::{
    Classification, NutrientLevel, SplitPart, classify_band, classify_level, classify_value,
    split_part,
};
pub use matching::{ColumnMatch, ColumnMatcher, MatchMode, normalize_name};
pub use registry::{
    Band, ParameterDefinition, ParameterRegistry, RatioRule, Scale, ScaleSummary, SumRule,
    Thresholds,
};
pub use rules::{DomainRuleEngine, ParameterAssessment, SplitCounts};
