//! Main Assay struct and public API.

use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, info};

use crate::domain::{DomainRuleEngine, MatchMode, ParameterRegistry};
use crate::error::{AssayError, Result};
use crate::inference::InferenceConfig;
use crate::input::{CsvMode, DataTable, Parser, ParserConfig, SourceMetadata};
use crate::report::{Report, ReportAssembler};
use crate::validation::{DetectionConfig, ValidationEngine};

/// Configuration for Assay analysis.
#[derive(Debug, Clone)]
pub struct AssayConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Type inference settings.
    pub inference: InferenceConfig,
    /// Detector thresholds shared by generic and domain checks.
    pub detection: DetectionConfig,
    /// How column names are matched against registry aliases.
    pub match_mode: MatchMode,
    /// Number of leading rows kept in the report.
    pub sample_rows: usize,
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            inference: InferenceConfig::default(),
            detection: DetectionConfig::default(),
            match_mode: MatchMode::default(),
            sample_rows: 5,
        }
    }
}

impl AssayConfig {
    pub fn with_csv_mode(mut self, mode: CsvMode) -> Self {
        self.parser.csv_mode = mode;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }
}

/// The main analysis engine.
///
/// Each call to [`Assay::analyze`] builds its table and findings from
/// scratch; nothing is retained between calls.
pub struct Assay {
    config: AssayConfig,
    parser: Parser,
    registry: Cow<'static, ParameterRegistry>,
}

impl Assay {
    /// Create an analyzer with default configuration and the soil registry.
    pub fn new() -> Self {
        Self::with_config(AssayConfig::default())
    }

    /// Create an analyzer with custom configuration and the soil registry.
    pub fn with_config(config: AssayConfig) -> Self {
        Self {
            parser: Parser::with_config(config.parser.clone()),
            registry: Cow::Borrowed(ParameterRegistry::soil()),
            config,
        }
    }

    /// Use a different parameter registry for domain rules.
    pub fn with_registry(mut self, registry: ParameterRegistry) -> Self {
        self.registry = Cow::Owned(registry);
        self
    }

    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    /// Analyze a data file.
    ///
    /// A file that parses to zero data rows is reported as
    /// [`AssayError::EmptyDataset`].
    pub fn analyze(&self, path: impl AsRef<Path>) -> Result<Report> {
        let (table, source) = self.parser.parse_file(path)?;
        if table.is_empty() {
            return Err(AssayError::EmptyDataset(source.file));
        }
        Ok(self.analyze_table(&table, source))
    }

    /// Analyze an already parsed table.
    pub fn analyze_table(&self, table: &DataTable, source: SourceMetadata) -> Report {
        let domain = DomainRuleEngine::new(&self.registry)
            .with_match_mode(self.config.match_mode)
            .with_config(self.config.detection.clone());

        // Domain rules run after the generic checks.
        let mut validation = ValidationEngine::with_config(&self.config.detection);
        validation.add_validator(domain.clone());
        let issues = validation.validate(table);

        let matches = domain.match_columns(table);
        let assessments = domain.assess(table, &matches);
        debug!(assessments = assessments.len(), "assessed matched columns");

        let report = ReportAssembler::new()
            .with_inference(self.config.inference.clone())
            .with_sample_rows(self.config.sample_rows)
            .assemble(source, self.registry.name(), table, &matches, issues, assessments);

        let counts = report.summary.issues_by_severity;
        info!(
            file = %report.source.file,
            rows = report.row_count,
            columns = report.column_count,
            errors = counts.error,
            warnings = counts.warning,
            info = counts.info,
            "analysis complete"
        );

        report
    }
}

impl Default for Assay {
    fn default() -> Self {
        Self::new()
    }
}
