//! Check command - data quality report.

use crate::cli::InputArgs;
use crate::markdown;

pub fn run(args: InputArgs) -> Result<(), Box<dyn std::error::Error>> {
    super::run_report(&args, markdown::render_quality)
}
