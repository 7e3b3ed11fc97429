use approx::assert_relative_eq;
use insurance_charts::core::{BandScale, LinearScale, MetricDomain, SqrtScale};

#[test]
fn metric_domain_rejects_inverted_or_non_finite_bounds() {
    assert!(MetricDomain::new(0.0, 1.0).is_ok());
    assert!(MetricDomain::new(1.0, 1.0).is_err());
    assert!(MetricDomain::new(2.0, 1.0).is_err());
    assert!(MetricDomain::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn linear_scale_supports_inverted_ranges() {
    let domain = MetricDomain::new(0.0, 3000.0).expect("domain");
    let scale = LinearScale::new(domain, 500.0, 0.0).expect("scale");

    assert_relative_eq!(scale.map(0.0).expect("map"), 500.0);
    assert_relative_eq!(scale.map(3000.0).expect("map"), 0.0);
    assert_relative_eq!(scale.invert(250.0).expect("invert"), 1500.0);
    assert!(scale.map(f64::NAN).is_err());
}

#[test]
fn sqrt_scale_maps_area_proportionally() {
    let domain = MetricDomain::new(0.0, 400.0).expect("domain");
    let scale = SqrtScale::new(domain, 4.0, 20.0).expect("scale");

    assert_relative_eq!(scale.map(0.0).expect("map"), 4.0);
    assert_relative_eq!(scale.map(100.0).expect("map"), 12.0);
    assert_relative_eq!(scale.map(400.0).expect("map"), 20.0);
}

#[test]
fn band_scale_centers_padded_bands() {
    let scale = BandScale::new(["Alabama", "Ohio", "Texas"], 0.0, 310.0, 0.1).expect("scale");

    assert_eq!(scale.len(), 3);
    assert_relative_eq!(scale.step(), 100.0);
    assert_relative_eq!(scale.bandwidth(), 90.0);
    assert_relative_eq!(scale.position("Alabama").expect("band"), 10.0);
    assert_relative_eq!(scale.position("Texas").expect("band"), 210.0);
    assert_eq!(scale.position("Utah"), None);
}

#[test]
fn band_scale_rejects_out_of_range_padding() {
    assert!(BandScale::new(["a"], 0.0, 1.0, 1.5).is_err());
    assert!(BandScale::new(["a"], 0.0, 1.0, f64::NAN).is_err());
}

#[test]
fn duplicate_band_categories_collapse() {
    let scale = BandScale::new(["Texas", "Texas", "Ohio"], 0.0, 100.0, 0.0).expect("scale");

    assert_eq!(scale.categories().collect::<Vec<_>>(), vec!["Texas", "Ohio"]);
    assert_relative_eq!(scale.bandwidth(), 50.0);
}
