//! Sustainability scoring scenarios.

use approx::assert_relative_eq;
use ecoyield::scoring::{ScoringConfig, SustainabilityBand, SustainabilityScorer};
use rstest::rstest;

#[rstest]
#[case::balanced(24.0, 40.0, 20.0, 20.0, 0.30, SustainabilityBand::Sustainable)]
#[case::standard(12.0, 40.0, 40.0, 40.0, 0.10, SustainabilityBand::Moderate)]
#[case::excessive(5.0, 80.0, 80.0, 80.0, 5.0 / 240.0, SustainabilityBand::Unsustainable)]
#[case::no_inputs(3.0, 0.0, 0.0, 0.0, 3.0, SustainabilityBand::Sustainable)]
#[case::zero_yield(0.0, 10.0, 10.0, 10.0, 0.0, SustainabilityBand::Unsustainable)]
fn band_scenarios(
    #[case] yield_estimate: f64,
    #[case] n: f64,
    #[case] p: f64,
    #[case] k: f64,
    #[case] efficiency: f64,
    #[case] band: SustainabilityBand,
) {
    let result = SustainabilityScorer::default().score(yield_estimate, n, p, k);
    assert_relative_eq!(result.efficiency(), efficiency, max_relative = 1e-12);
    assert_eq!(result.band(), band);
    assert_eq!(result.yield_estimate(), yield_estimate);
    assert_eq!(result.total_nutrients(), n + p + k);
}

#[rstest]
#[case::sustainable_boundary(15.0, 100.0, SustainabilityBand::Moderate)]
#[case::moderate_boundary(8.0, 100.0, SustainabilityBand::Unsustainable)]
fn thresholds_are_strict(
    #[case] yield_estimate: f64,
    #[case] total: f64,
    #[case] band: SustainabilityBand,
) {
    let result = SustainabilityScorer::default().score(yield_estimate, total, 0.0, 0.0);
    assert_eq!(result.band(), band);
}

#[test]
fn negative_totals_use_unit_divisor() {
    // Only reachable with range checks disabled.
    let result = SustainabilityScorer::default().score(0.05, -10.0, 0.0, 0.0);
    assert_eq!(result.total_nutrients(), -10.0);
    assert_eq!(result.efficiency(), 0.05);
    assert_eq!(result.band(), SustainabilityBand::Unsustainable);
}

#[test]
fn labels_and_colors() {
    assert_eq!(SustainabilityBand::Sustainable.label(), "SUSTAINABLE (Eco-Friendly)");
    assert_eq!(SustainabilityBand::Moderate.label(), "MODERATE (Standard)");
    assert_eq!(
        SustainabilityBand::Unsustainable.label(),
        "UNSUSTAINABLE (Excessive Chemicals)"
    );
    assert_eq!(SustainabilityBand::Moderate.color(), "orange");
    assert_eq!(SustainabilityBand::Unsustainable.color(), "red");
}

#[test]
fn result_serializes_for_adapters() {
    let result = SustainabilityScorer::default().score(24.0, 40.0, 20.0, 20.0);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["band"], "SUSTAINABLE");
    assert_eq!(json["total_nutrients"], 80.0);
    assert_eq!(
        json["recommendation"],
        "Excellent balance! Maintain current practices."
    );
}

#[test]
fn configured_thresholds() {
    let config = ScoringConfig::builder()
        .sustainable_above(0.25)
        .moderate_above(0.12)
        .build()
        .unwrap();
    let scorer = SustainabilityScorer::new(config);
    assert_eq!(scorer.classify(0.20), SustainabilityBand::Moderate);
    assert_eq!(scorer.classify(0.10), SustainabilityBand::Unsustainable);
    assert_eq!(scorer.classify(0.30), SustainabilityBand::Sustainable);
}
