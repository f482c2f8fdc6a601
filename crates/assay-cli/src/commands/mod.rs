//! CLI command implementations.

pub mod analyze;
pub mod check;

use assay::{Assay, AssayConfig, CsvMode, MatchMode, ParameterRegistry, Report};
use tracing::debug;

use crate::cli::{Domain, InputArgs};

/// Build an analyzer from the shared input options.
pub fn build_assay(args: &InputArgs) -> assay::Result<Assay> {
    let mut config = AssayConfig::default().with_sample_rows(args.rows);
    if args.quoted_csv {
        config = config.with_csv_mode(CsvMode::Quoted);
    }
    if args.legacy_matching {
        config = config.with_match_mode(MatchMode::Substring);
    }

    let assay = Assay::with_config(config);
    let assay = match (&args.registry, args.domain) {
        (Some(path), _) => assay.with_registry(ParameterRegistry::from_path(path)?),
        (None, Domain::Generic) => assay.with_registry(ParameterRegistry::generic()),
        (None, Domain::Soil) => assay,
    };
    debug!(
        registry = assay.registry().name(),
        parameters = assay.registry().len(),
        "registry loaded"
    );
    Ok(assay)
}

/// Analyze the input file and print it with `render`, or as JSON.
pub fn run_report(
    args: &InputArgs,
    render: fn(&Report) -> String,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_assay(args)?.analyze(&args.file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(file: PathBuf) -> InputArgs {
        InputArgs {
            file,
            domain: Domain::Soil,
            registry: None,
            quoted_csv: false,
            legacy_matching: false,
            json: false,
            rows: 5,
        }
    }

    #[test]
    fn test_build_assay_registry_selection() {
        let mut input = args(PathBuf::from("data.csv"));
        assert_eq!(build_assay(&input).unwrap().registry().name(), "soil");

        input.domain = Domain::Generic;
        assert!(build_assay(&input).unwrap().registry().is_empty());
    }

    #[test]
    fn test_build_assay_from_registry_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "water", "parameters": [{{"name": "turbidity"}}]}}"#).unwrap();

        let mut input = args(PathBuf::from("data.csv"));
        input.registry = Some(file.path().to_path_buf());
        input.quoted_csv = true;
        input.legacy_matching = true;
        let assay = build_assay(&input).unwrap();

        assert_eq!(assay.registry().name(), "water");
        assert_eq!(assay.config().parser.csv_mode, CsvMode::Quoted);
        assert_eq!(assay.config().match_mode, MatchMode::Substring);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let input = args(PathBuf::from("/nonexistent/soil.csv"));
        let err = run_report(&input, crate::markdown::render_quality).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
