use insurance_charts::core::CombinedRecord;
use insurance_charts::data::{ScaleRequest, SharedAxis, derive_scales, extent};
use proptest::prelude::*;

fn records(pairs: &[(f64, f64)]) -> Vec<CombinedRecord> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, (rate, density))| {
            CombinedRecord::new(format!("state-{index}"))
                .with_metric("insuranceRate", *rate)
                .with_metric("populationDensity", *density)
        })
        .collect()
}

proptest! {
    #[test]
    fn normalized_value_never_exceeds_primary_upper_bound(
        pairs in prop::collection::vec((0.0f64..1_000_000.0, 0.0f64..1.0), 1..40),
        magnitude in prop_oneof![
            Just(1e-310),
            Just(f64::MIN_POSITIVE),
            Just(1e-6),
            Just(1.0),
            Just(100_000.0),
        ]
    ) {
        let scaled: Vec<(f64, f64)> = pairs
            .iter()
            .map(|(rate, density)| (*rate, density * magnitude))
            .collect();
        let input = records(&scaled);
        let derived = derive_scales(
            &input,
            ScaleRequest::shared("insuranceRate", "populationDensity", SharedAxis::Normalize),
            1e-6,
        );

        for record in &derived.normalized {
            prop_assert!(record.normalized.is_finite());
            prop_assert!(record.normalized <= derived.primary.max * 1.0001);
        }
    }

    #[test]
    fn domains_start_at_zero_with_positive_upper_bound(
        pairs in prop::collection::vec((-1_000.0f64..1_000.0, -1_000.0f64..1_000.0), 0..40),
        epsilon in 1e-9f64..1.0
    ) {
        let input = records(&pairs);
        let derived = derive_scales(
            &input,
            ScaleRequest::shared("insuranceRate", "populationDensity", SharedAxis::CombinedMax),
            epsilon,
        );

        for domain in [
            Some(derived.primary),
            derived.secondary,
            derived.shared,
        ]
        .into_iter()
        .flatten()
        {
            prop_assert_eq!(domain.min, 0.0);
            prop_assert!(domain.max > 0.0);
            prop_assert!(domain.max.is_finite());
        }
    }

    #[test]
    fn extent_is_never_empty(values in prop::collection::vec(-1e6f64..1e6, 1..30)) {
        let domain = extent(values.iter().copied(), 1e-6).expect("non-empty extent");

        prop_assert!(domain.min < domain.max);
        for value in values {
            prop_assert!(domain.min <= value && value <= domain.max);
        }
    }
}
