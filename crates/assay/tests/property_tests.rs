//! Property-based tests for Assay statistics and detectors.
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p assay --test property_tests
//! ```

use proptest::prelude::*;

use assay::DataTable;
use assay::domain::{ParameterRegistry, classify_level, classify_value};
use assay::inference::{StatisticsCalculator, TypeInferencer};
use assay::input::Cell;
use assay::validation::{DuplicateDetector, OutlierDetector};

// =============================================================================
// Test Strategies
// =============================================================================

/// A raw cell as it might appear in a CSV field.
fn raw_value() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1.0e6f64..1.0e6).prop_map(|v| format!("{}", v)),
        (0u32..100_000).prop_map(|v| v.to_string()),
        "[a-z]{1,8}",
        Just(String::new()),
        Just("1,234".to_string()),
    ]
}

fn column() -> impl Strategy<Value = Vec<Cell>> {
    prop::collection::vec(raw_value().prop_map(Cell::from_text), 0..60)
}

fn table() -> impl Strategy<Value = DataTable> {
    (1usize..4).prop_flat_map(|width| {
        prop::collection::vec(
            prop::collection::vec("[ab]{0,1}".prop_map(Cell::from_text), width),
            1..30,
        )
        .prop_map(move |rows| {
            let headers = (0..width).map(|i| format!("c{}", i)).collect();
            DataTable::new(headers, rows)
        })
    })
}

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

// =============================================================================
// Statistics
// =============================================================================

proptest! {
    #[test]
    fn stats_count_never_exceeds_rows(values in column()) {
        match StatisticsCalculator::compute(&values) {
            Some(stats) => {
                prop_assert!(stats.count <= values.len());
                let parsed = values.iter().filter(|c| c.as_number().is_some()).count();
                prop_assert_eq!(stats.count == values.len(), parsed == values.len());
                prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
                prop_assert!(stats.min <= stats.mean + 1e-6 && stats.mean <= stats.max + 1e-6);
                prop_assert!(stats.spread >= 0.0);
            }
            None => prop_assert!(values.iter().all(|c| c.as_number().is_none())),
        }
    }

    #[test]
    fn inference_is_deterministic(values in column()) {
        let inferencer = TypeInferencer::new();
        prop_assert_eq!(inferencer.infer(&values), inferencer.infer(&values));
    }
}

// =============================================================================
// Duplicates
// =============================================================================

proptest! {
    #[test]
    fn appended_copy_is_reported(table in table(), pick in any::<prop::sample::Index>()) {
        let mut table = table;
        let source = pick.index(table.row_count());
        let copy = table.rows[source].clone();
        table.rows.push(copy);

        let duplicates = DuplicateDetector::find_duplicates(&table);
        prop_assert_eq!(duplicates.last().copied(), Some(table.row_count()));
        let repeats_earlier = table.rows[..source].contains(&table.rows[source]);
        prop_assert_eq!(duplicates.contains(&(source + 1)), repeats_earlier);
    }

    #[test]
    fn duplicates_are_sorted_and_unique(table in table()) {
        let duplicates = DuplicateDetector::find_duplicates(&table);
        prop_assert!(duplicates.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(duplicates.iter().all(|&r| r >= 2 && r <= table.row_count()));
    }
}

// =============================================================================
// Outliers
// =============================================================================

proptest! {
    #[test]
    fn short_columns_are_never_evaluated(values in prop::collection::vec(finite(), 0..10)) {
        let cells: Vec<Cell> = values.into_iter().map(Cell::Number).collect();
        prop_assert!(OutlierDetector::new().find_outliers("x", &cells).is_none());
    }

    #[test]
    fn fence_boundary_is_inclusive(values in prop::collection::vec(finite(), 10..80)) {
        let detector = OutlierDetector::new();
        let fence = detector.fence(&values).expect("enough values");

        prop_assert!(!fence.excludes(fence.lower));
        prop_assert!(!fence.excludes(fence.upper));
        prop_assert!(fence.excludes(fence.upper + 1.0));
        prop_assert!(fence.excludes(fence.lower - 1.0));

        let cells: Vec<Cell> = values.iter().copied().map(Cell::Number).collect();
        let expected = values.iter().filter(|&&v| fence.excludes(v)).count();
        let found = detector.find_outliers("x", &cells).map_or(0, |f| f.count);
        prop_assert_eq!(found, expected);
    }
}

// =============================================================================
// Classification
// =============================================================================

proptest! {
    #[test]
    fn every_ph_gets_a_band(value in -5.0f64..20.0) {
        let ph = ParameterRegistry::soil().get("ph").expect("ph parameter");
        prop_assert!(classify_value(ph, value).is_some());
    }

    #[test]
    fn levels_are_monotonic(a in 0.0f64..1000.0, b in 0.0f64..1000.0) {
        let nitrogen = ParameterRegistry::soil()
            .get("nitrogen")
            .and_then(|p| p.thresholds)
            .expect("nitrogen thresholds");
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_level(&nitrogen, lo) <= classify_level(&nitrogen, hi));
    }
}
