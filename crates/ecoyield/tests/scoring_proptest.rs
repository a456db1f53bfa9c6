//! Property-based tests for the codec and the scorer.

use proptest::collection::btree_set;
use proptest::prelude::*;

use ecoyield::codec::{CodecError, LabelCodec};
use ecoyield::scoring::{SustainabilityBand, SustainabilityScorer};

fn rank(band: SustainabilityBand) -> u8 {
    match band {
        SustainabilityBand::Unsustainable => 0,
        SustainabilityBand::Moderate => 1,
        SustainabilityBand::Sustainable => 2,
    }
}

proptest! {
    #[test]
    fn codec_roundtrips_every_class(names in btree_set("[a-z]{1,12}", 1..40)) {
        let codec = LabelCodec::fit(names.iter().map(String::as_str)).unwrap();
        prop_assert_eq!(codec.len(), names.len());
        for name in &names {
            let index = codec.encode(name).unwrap();
            prop_assert!(index < codec.len());
            prop_assert_eq!(codec.decode(index).unwrap(), name.as_str());
        }
        for (i, class) in codec.classes().iter().enumerate() {
            prop_assert_eq!(codec.encode(class).unwrap(), i);
        }
    }

    #[test]
    fn codec_rejects_names_outside_vocabulary(
        names in btree_set("[a-z]{1,8}", 1..20),
        probe in "[A-Z][a-z]{0,8}",
    ) {
        let codec = LabelCodec::fit(names.iter().map(String::as_str)).unwrap();
        let is_unknown = matches!(codec.encode(&probe), Err(CodecError::UnknownCrop { .. }));
        prop_assert!(is_unknown);
        let out_of_range = matches!(
            codec.decode(names.len()),
            Err(CodecError::InvalidIndex { .. })
        );
        prop_assert!(out_of_range);
    }

    #[test]
    fn efficiency_never_increases_with_more_nutrients(
        yield_estimate in 0.0f64..50.0,
        n in 1.0f64..140.0,
        p in 0.0f64..145.0,
        k in 0.0f64..205.0,
        extra in 0.0f64..100.0,
    ) {
        let scorer = SustainabilityScorer::default();
        let base = scorer.score(yield_estimate, n, p, k);
        let more = scorer.score(yield_estimate, n + extra, p, k);
        prop_assert!(more.efficiency() <= base.efficiency());
        prop_assert!(rank(more.band()) <= rank(base.band()));
    }

    #[test]
    fn efficiency_matches_ratio(
        yield_estimate in 0.0f64..50.0,
        n in 0.0f64..140.0,
        p in 0.0f64..145.0,
        k in 0.0f64..205.0,
    ) {
        let result = SustainabilityScorer::default().score(yield_estimate, n, p, k);
        let total = n + p + k;
        let expected = if total > 0.0 { yield_estimate / total } else { yield_estimate };
        prop_assert_eq!(result.efficiency(), expected);
        prop_assert!(result.efficiency() >= 0.0);
    }

    #[test]
    fn band_agrees_with_strict_thresholds(efficiency in 0.0f64..1.0) {
        let band = SustainabilityScorer::default().classify(efficiency);
        let expected = if efficiency > 0.15 {
            SustainabilityBand::Sustainable
        } else if efficiency > 0.08 {
            SustainabilityBand::Moderate
        } else {
            SustainabilityBand::Unsustainable
        };
        prop_assert_eq!(band, expected);
    }
}
