//! Column type inference and descriptive statistics.

mod statistical;

pub use statistical::{InferenceConfig, StatisticsCalculator, TypeInferencer};
