//! Golden scenarios against the bundled formulary.
//!
//! These pin the figures users actually see for the shipped products.

use fever_dose_core::engine::calculate_all_dosages;
use fever_dose_core::formulary::Formulary;
use fever_dose_core::models::{AgeUnit, DosageInput, DosageResult, DosageStatus};
use fever_dose_core::{group_by_formulation, ChartSpec, DosageCalculator, Market, WeightChart};

/// Expected outcome for one product.
struct GoldenCase {
    id: &'static str,
    product_id: &'static str,
    weight: f64,
    age: u32,
    age_unit: AgeUnit,
    expected_status: DosageStatus,
    expected_min_ml: Option<f64>,
    expected_max_ml: Option<f64>,
    expected_max_daily_ml: Option<f64>,
    expect_message: bool,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "tylenol-heavy-capped",
            product_id: "tylenol_susp_100ml_kr",
            weight: 70.0,
            age: 36,
            age_unit: AgeUnit::Months,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(20.3),
            expected_max_ml: Some(20.3),
            expected_max_daily_ml: Some(164.1),
            expect_message: true,
        },
        GoldenCase {
            id: "tylenol-daily-maximum",
            product_id: "tylenol_susp_100ml_kr",
            weight: 10.0,
            age: 12,
            age_unit: AgeUnit::Months,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(3.1),
            expected_max_ml: Some(4.7),
            expected_max_daily_ml: Some(23.4),
            expect_message: false,
        },
        GoldenCase {
            id: "brufen-infant-blocked",
            product_id: "brufen_susp_100_5_kr",
            weight: 7.0,
            age: 3,
            age_unit: AgeUnit::Months,
            expected_status: DosageStatus::AgeBlock,
            expected_min_ml: None,
            expected_max_ml: None,
            expected_max_daily_ml: None,
            expect_message: true,
        },
        GoldenCase {
            id: "brufen-daily-ceiling",
            product_id: "brufen_susp_100_5_kr",
            weight: 20.0,
            age: 24,
            age_unit: AgeUnit::Months,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(5.0),
            expected_max_ml: Some(10.0),
            expected_max_daily_ml: Some(25.0),
            expect_message: false,
        },
        GoldenCase {
            id: "maxibufen-daily-ceiling",
            product_id: "maxibufen_susp_12_1_kr",
            weight: 20.0,
            age: 2,
            age_unit: AgeUnit::Years,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(8.3),
            expected_max_ml: Some(11.7),
            expected_max_daily_ml: Some(25.0),
            expect_message: false,
        },
        GoldenCase {
            id: "motrin-school-age-uncapped",
            product_id: "childrens_motrin_us",
            weight: 32.0,
            age: 9,
            age_unit: AgeUnit::Years,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(8.0),
            expected_max_ml: Some(16.0),
            expected_max_daily_ml: Some(64.0),
            expect_message: false,
        },
        GoldenCase {
            id: "champ-at-minimum-age",
            product_id: "champ_syrup_kr",
            weight: 6.0,
            age: 4,
            age_unit: AgeUnit::Months,
            expected_status: DosageStatus::Success,
            expected_min_ml: Some(1.9),
            expected_max_ml: Some(2.8),
            expected_max_daily_ml: Some(14.1),
            expect_message: false,
        },
    ]
}

fn find<'a>(results: &'a [DosageResult], id: &str) -> &'a DosageResult {
    results
        .iter()
        .find(|r| r.product.id == id)
        .unwrap_or_else(|| panic!("product {} missing from results", id))
}

#[test]
fn test_golden_cases() {
    let formulary = Formulary::bundled().unwrap();
    let cases = get_golden_cases();
    let mut failures = Vec::new();

    for case in &cases {
        let input = DosageInput {
            weight: case.weight,
            age: case.age,
            age_unit: case.age_unit,
        };
        let results = calculate_all_dosages(&input, formulary.products());
        let result = find(&results, case.product_id);

        if result.status() != case.expected_status {
            failures.push(format!(
                "{}: status {:?} != {:?}",
                case.id,
                result.status(),
                case.expected_status
            ));
        }
        if result.min_ml() != case.expected_min_ml {
            failures.push(format!(
                "{}: min_ml {:?} != {:?}",
                case.id,
                result.min_ml(),
                case.expected_min_ml
            ));
        }
        if result.max_ml() != case.expected_max_ml {
            failures.push(format!(
                "{}: max_ml {:?} != {:?}",
                case.id,
                result.max_ml(),
                case.expected_max_ml
            ));
        }
        if result.max_daily_ml() != case.expected_max_daily_ml {
            failures.push(format!(
                "{}: max_daily_ml {:?} != {:?}",
                case.id,
                result.max_daily_ml(),
                case.expected_max_daily_ml
            ));
        }
        if result.message().is_some() != case.expect_message {
            failures.push(format!(
                "{}: message {:?}, expected present = {}",
                case.id,
                result.message(),
                case.expect_message
            ));
        }
    }

    assert!(failures.is_empty(), "golden failures:\n{}", failures.join("\n"));
}

#[test]
fn test_every_bundled_product_yields_one_result() {
    let formulary = Formulary::bundled().unwrap();
    let input = DosageInput {
        weight: 5.0,
        age: 2,
        age_unit: AgeUnit::Months,
    };

    let results = calculate_all_dosages(&input, formulary.products());
    assert_eq!(results.len(), formulary.len());
    assert!(results.iter().all(|r| r.status() == DosageStatus::AgeBlock));
}

#[test]
fn test_korean_chart_and_grouping() {
    let formulary = Formulary::bundled().unwrap().for_market(Market::Ko);
    let chart = WeightChart::build(
        DosageCalculator::shared(),
        formulary.products(),
        &ChartSpec::default(),
    );

    // 24 months clears every bundled age gate
    assert!(chart
        .rows
        .iter()
        .all(|row| row.cells.iter().all(|c| c.min_ml.is_some())));

    let input = DosageInput {
        weight: 14.0,
        age: 30,
        age_unit: AgeUnit::Months,
    };
    let results = calculate_all_dosages(&input, formulary.products());
    let groups = group_by_formulation(&results);

    // Tylenol and Champ share acetaminophen 32 mg/mL
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].results.len(), 2);
    assert_eq!(groups[0].primary().product.id, "tylenol_susp_100ml_kr");
}
