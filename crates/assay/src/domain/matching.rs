//! Matching column names against registry aliases.

use serde::{Deserialize, Serialize};

use super::registry::{ParameterDefinition, ParameterRegistry};

/// How an alias may match inside a longer column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The alias must appear as a whole run of `_`-separated tokens, so
    /// `soil_ph_value` matches `ph` but `phosphate` does not.
    #[default]
    Token,
    /// Raw substring containment. Short aliases such as `n` or `p` match
    /// almost any column name.
    Substring,
}

/// Normalize a column name or alias: trim, lowercase, spaces and hyphens
/// become underscores.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn contains_tokens(column: &str, alias: &str) -> bool {
    let column: Vec<&str> = column.split('_').collect();
    let alias: Vec<&str> = alias.split('_').collect();
    if alias.is_empty() || alias.len() > column.len() {
        return false;
    }
    column.windows(alias.len()).any(|w| w == alias.as_slice())
}

/// A table column identified as a registry parameter.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMatch<'r> {
    /// Zero-based column position.
    pub index: usize,
    pub parameter: &'r ParameterDefinition,
}

/// Resolves column names to parameters of one registry.
pub struct ColumnMatcher<'r> {
    registry: &'r ParameterRegistry,
    mode: MatchMode,
}

impl<'r> ColumnMatcher<'r> {
    pub fn new(registry: &'r ParameterRegistry, mode: MatchMode) -> Self {
        Self { registry, mode }
    }

    /// Match a single column name.
    ///
    /// An exact alias match anywhere in the registry wins over a partial
    /// match; partial matches are tried in registry order.
    pub fn match_column(&self, column: &str) -> Option<&'r ParameterDefinition> {
        let normalized = normalize_name(column);
        if normalized.is_empty() {
            return None;
        }

        let exact = self.registry.parameters().find(|param| {
            param
                .aliases
                .iter()
                .any(|alias| normalize_name(alias) == normalized)
        });
        if exact.is_some() {
            return exact;
        }

        self.registry.parameters().find(|param| {
            param.aliases.iter().any(|alias| {
                let alias = normalize_name(alias);
                !alias.is_empty()
                    && match self.mode {
                        MatchMode::Token => contains_tokens(&normalized, &alias),
                        MatchMode::Substring => normalized.contains(alias.as_str()),
                    }
            })
        })
    }

    /// Match every header, keeping only the columns that resolve.
    pub fn match_headers(&self, headers: &[String]) -> Vec<ColumnMatch<'r>> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                self.match_column(header)
                    .map(|parameter| ColumnMatch { index, parameter })
            })
            .collect()
    }
}
