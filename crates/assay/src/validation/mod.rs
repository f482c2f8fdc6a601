//! Validation engine for detecting data quality issues.

mod issue;
mod validators;

pub use issue::{IssueCategory, QualityIssue, Severity, ValueExample};
pub use validators::{
    CompletenessValidator, DetectionConfig, DuplicateDetector, Fence, OutlierDetector,
    OutlierFinding, ValidationEngine, Validator,
};
