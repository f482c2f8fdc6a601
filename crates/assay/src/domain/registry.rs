//! Parameter registry: canonical parameters, aliases, ranges and rules.
//!
//! A registry is immutable once built. The soil registry is constructed once
//! per process and shared by reference; other registries are loaded from
//! JSON files of the same shape.

use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::schema::ValueRange;

/// Classification thresholds. Any bound may be absent, in which case that
/// comparison is skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_critical_low(mut self, value: f64) -> Self {
        self.critical_low = Some(value);
        self
    }

    pub fn with_low(mut self, value: f64) -> Self {
        self.low = Some(value);
        self
    }

    pub fn with_high(mut self, value: f64) -> Self {
        self.high = Some(value);
        self
    }

    pub fn with_critical_high(mut self, value: f64) -> Self {
        self.critical_high = Some(value);
        self
    }
}

/// One labelled band of a scale. A band without an upper bound catches
/// every remaining value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub label: String,
    /// Exclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
}

impl Band {
    pub fn below(label: impl Into<String>, bound: f64) -> Self {
        Self {
            label: label.into(),
            below: Some(bound),
        }
    }

    pub fn rest(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            below: None,
        }
    }
}

/// Coarse three-way split of a scale: `< lower`, `lower..=upper`, `> upper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSummary {
    pub lower: f64,
    pub upper: f64,
    pub low_label: String,
    pub mid_label: String,
    pub high_label: String,
}

/// Ordered bands, evaluated first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub bands: Vec<Band>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScaleSummary>,
}

/// A measured parameter and everything known about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Canonical name.
    pub name: String,
    /// Column names that identify this parameter.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub unit: String,
    /// Values outside this range are physically impossible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_range: Option<ValueRange>,
    /// Values outside this range are unusual but possible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_range: Option<ValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
}

impl ParameterDefinition {
    /// Create a definition whose only alias is its own name.
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            aliases: vec![name.clone()],
            name,
            unit: unit.into(),
            valid_range: None,
            typical_range: None,
            thresholds: None,
            scale: None,
        }
    }

    /// Replace the alias list.
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_valid_range(mut self, min: f64, max: f64) -> Self {
        self.valid_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_typical_range(mut self, min: f64, max: f64) -> Self {
        self.typical_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Name in title case with underscores as spaces, e.g. `Organic Matter`.
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Acceptable range for the per-row ratio of two parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRule {
    /// Display name, e.g. `Ca:Mg`.
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    pub range: ValueRange,
}

/// Member parameters whose per-row sum must stay near a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumRule {
    pub name: String,
    pub members: Vec<String>,
    pub target: f64,
    pub tolerance: f64,
}

/// On-disk registry layout.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    ratio_rules: Vec<RatioRule>,
    #[serde(default)]
    sum_rules: Vec<SumRule>,
}

/// Read-only table of parameter definitions keyed by canonical name.
///
/// Iteration follows insertion order, which is also the order used when
/// column names are matched against aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRegistry {
    name: String,
    parameters: IndexMap<String, ParameterDefinition>,
    ratio_rules: Vec<RatioRule>,
    sum_rules: Vec<SumRule>,
}

static SOIL: Lazy<ParameterRegistry> = Lazy::new(build_soil_registry);

impl ParameterRegistry {
    /// Create an empty registry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The built-in soil agronomy registry.
    pub fn soil() -> &'static ParameterRegistry {
        &SOIL
    }

    /// A registry with no parameters; only generic checks apply.
    pub fn generic() -> Self {
        Self::new("generic")
    }

    /// Load a registry from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)
            .map_err(|e| AssayError::Registry(format!("invalid registry JSON: {}", e)))?;
        Self::from_file(file)
    }

    /// Load a registry from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssayError::FileNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| AssayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut registry = Self::from_json_str(&json)?;
        if registry.name.is_empty() {
            registry.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(registry)
    }

    fn from_file(file: RegistryFile) -> Result<Self> {
        let mut registry = Self::new(file.name.unwrap_or_default());

        for mut param in file.parameters {
            if param.name.trim().is_empty() {
                return Err(AssayError::Registry("parameter with empty name".into()));
            }
            if registry.parameters.contains_key(&param.name) {
                return Err(AssayError::Registry(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
            for range in [param.valid_range, param.typical_range].into_iter().flatten() {
                if range.min > range.max {
                    return Err(AssayError::Registry(format!(
                        "parameter '{}' has inverted range {}",
                        param.name, range
                    )));
                }
            }
            if param.aliases.is_empty() {
                param.aliases.push(param.name.clone());
            }
            registry.parameters.insert(param.name.clone(), param);
        }

        for rule in &file.ratio_rules {
            registry.require(&rule.name, &rule.numerator)?;
            registry.require(&rule.name, &rule.denominator)?;
        }
        for rule in &file.sum_rules {
            if rule.members.is_empty() {
                return Err(AssayError::Registry(format!(
                    "sum rule '{}' has no members",
                    rule.name
                )));
            }
            for member in &rule.members {
                registry.require(&rule.name, member)?;
            }
        }
        registry.ratio_rules = file.ratio_rules;
        registry.sum_rules = file.sum_rules;

        Ok(registry)
    }

    fn require(&self, rule: &str, parameter: &str) -> Result<()> {
        if self.parameters.contains_key(parameter) {
            Ok(())
        } else {
            Err(AssayError::Registry(format!(
                "rule '{}' references unknown parameter '{}'",
                rule, parameter
            )))
        }
    }

    /// Add a parameter, replacing any with the same name.
    pub fn with_parameter(mut self, param: ParameterDefinition) -> Self {
        self.parameters.insert(param.name.clone(), param);
        self
    }

    pub fn with_ratio_rule(mut self, rule: RatioRule) -> Self {
        self.ratio_rules.push(rule);
        self
    }

    pub fn with_sum_rule(mut self, rule: SumRule) -> Self {
        self.sum_rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a parameter by canonical name.
    pub fn get(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.get(name)
    }

    /// Parameters in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.parameters.values()
    }

    pub fn ratio_rules(&self) -> &[RatioRule] {
        &self.ratio_rules
    }

    pub fn sum_rules(&self) -> &[SumRule] {
        &self.sum_rules
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

fn ppm(name: &str, aliases: &[&str]) -> ParameterDefinition {
    ParameterDefinition::new(name, "ppm").with_aliases(aliases)
}

fn build_soil_registry() -> ParameterRegistry {
    let ph_scale = Scale {
        bands: vec![
            Band::below("extremely acidic", 4.5),
            Band::below("strongly acidic", 5.5),
            Band::below("moderately acidic", 6.0),
            Band::below("slightly acidic", 6.5),
            Band::below("neutral (slightly acidic)", 7.0),
            Band::below("neutral (slightly alkaline)", 7.5),
            Band::below("slightly alkaline", 8.0),
            Band::below("moderately alkaline", 8.5),
            Band::rest("strongly alkaline"),
        ],
        summary: Some(ScaleSummary {
            lower: 6.0,
            upper: 7.5,
            low_label: "acidic".into(),
            mid_label: "neutral".into(),
            high_label: "alkaline".into(),
        }),
    };

    ParameterRegistry::new("soil")
        .with_parameter(
            ParameterDefinition::new("ph", "-")
                .with_aliases(&["ph", "soil_ph", "ph_water", "ph_cacl2", "ph_h2o"])
                .with_valid_range(3.5, 10.0)
                .with_typical_range(4.5, 8.5)
                .with_thresholds(
                    Thresholds::new()
                        .with_critical_low(5.0)
                        .with_low(6.0)
                        .with_high(7.0)
                        .with_critical_high(8.5),
                )
                .with_scale(ph_scale),
        )
        .with_parameter(
            ppm(
                "nitrogen",
                &["n", "nitrogen", "no3", "nh4", "total_n", "nitrate", "ammonium"],
            )
            .with_valid_range(0.0, 500.0)
            .with_typical_range(5.0, 100.0)
            .with_thresholds(
                Thresholds::new()
                    .with_critical_low(10.0)
                    .with_low(20.0)
                    .with_high(50.0),
            ),
        )
        .with_parameter(
            ppm(
                "phosphorus",
                &["p", "phosphorus", "olsen_p", "bray_p", "mehlich_p", "available_p"],
            )
            .with_valid_range(0.0, 500.0)
            .with_typical_range(3.0, 150.0)
            .with_thresholds(
                Thresholds::new()
                    .with_critical_low(5.0)
                    .with_low(15.0)
                    .with_high(50.0),
            ),
        )
        .with_parameter(
            ppm("potassium", &["k", "potassium", "exchangeable_k"])
                .with_valid_range(0.0, 1500.0)
                .with_typical_range(50.0, 500.0)
                .with_thresholds(
                    Thresholds::new().with_critical_low(60.0).with_low(120.0).with_high(250.0),
                ),
        )
        .with_parameter(
            ParameterDefinition::new("organic_matter", "%")
                .with_aliases(&["om", "organic_matter", "som", "organic_c", "oc"])
                .with_valid_range(0.0, 100.0)
                .with_typical_range(0.5, 15.0)
                .with_thresholds(
                    Thresholds::new()
                        .with_critical_low(1.0)
                        .with_low(2.0)
                        .with_high(5.0),
                ),
        )
        .with_parameter(
            ParameterDefinition::new("cec", "meq/100g")
                .with_aliases(&["cec", "cation_exchange", "cation_exchange_capacity"])
                .with_valid_range(0.0, 100.0)
                .with_typical_range(2.0, 50.0)
                .with_thresholds(Thresholds::new().with_low(10.0).with_high(25.0)),
        )
        .with_parameter(
            ParameterDefinition::new("ec", "dS/m")
                .with_aliases(&["ec", "electrical_conductivity", "salinity", "conductivity"])
                .with_valid_range(0.0, 50.0)
                .with_typical_range(0.0, 8.0)
                .with_thresholds(Thresholds::new().with_high(2.0).with_critical_high(4.0)),
        )
        .with_parameter(
            ppm("calcium", &["ca", "calcium"])
                .with_valid_range(0.0, 20000.0)
                .with_typical_range(200.0, 10000.0)
                .with_thresholds(Thresholds::new().with_low(500.0).with_high(2500.0)),
        )
        .with_parameter(
            ppm("magnesium", &["mg", "magnesium"])
                .with_valid_range(0.0, 5000.0)
                .with_typical_range(25.0, 1500.0)
                .with_thresholds(Thresholds::new().with_low(50.0).with_high(300.0)),
        )
        .with_parameter(ppm("sulfur", &["s", "sulfur", "so4", "sulfate"]))
        .with_parameter(ppm("iron", &["fe", "iron"]))
        .with_parameter(ppm("manganese", &["mn", "manganese"]))
        .with_parameter(ppm("zinc", &["zn", "zinc"]))
        .with_parameter(ppm("copper", &["cu", "copper"]))
        .with_parameter(ppm("boron", &["b", "boron"]))
        .with_parameter(
            ParameterDefinition::new("sand", "%")
                .with_aliases(&["sand", "sand_pct"])
                .with_valid_range(0.0, 100.0),
        )
        .with_parameter(
            ParameterDefinition::new("silt", "%")
                .with_aliases(&["silt", "silt_pct"])
                .with_valid_range(0.0, 100.0),
        )
        .with_parameter(
            ParameterDefinition::new("clay", "%")
                .with_aliases(&["clay", "clay_pct"])
                .with_valid_range(0.0, 100.0),
        )
        .with_ratio_rule(RatioRule {
            name: "Ca:Mg".into(),
            numerator: "calcium".into(),
            denominator: "magnesium".into(),
            range: ValueRange::new(2.0, 10.0),
        })
        .with_sum_rule(SumRule {
            name: "texture".into(),
            members: vec!["sand".into(), "silt".into(), "clay".into()],
            target: 100.0,
            tolerance: 5.0,
        })
}
