use std::collections::BTreeMap;

use super::*;
use crate::cube::units::SpectralUnit;
use crate::cube::volume::Volume;

fn cube(values: Vec<f32>) -> Volume {
    let n = values.len();
    let mut header = BTreeMap::new();
    header.insert("BUNIT".to_string(), serde_json::json!("K"));
    Volume::new(
        [n, 1, 1],
        values,
        (0..n).map(|i| i as f64).collect(),
        SpectralUnit::KilometrePerSecond,
        header,
    )
    .unwrap()
}

#[test]
fn full_percentiles_give_extremes() {
    let v = cube(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    let r = resolve_range(&v, ValueBounds::default(), [0.0, 100.0]).unwrap();
    assert_eq!(r, ResolvedRange { min: 1.0, max: 5.0 });
}

#[test]
fn estimates_are_rounded_to_four_figures() {
    let v = cube(vec![0.123_456, 9.876_54]);
    let r = resolve_range(&v, ValueBounds::default(), [0.0, 100.0]).unwrap();
    assert!((r.min - 0.1235).abs() < 1e-9);
    assert!((r.max - 9.877).abs() < 1e-9);
}

#[test]
fn explicit_bounds_are_verbatim() {
    let v = cube(vec![1.0, 2.0]);
    let r = resolve_range(
        &v,
        ValueBounds {
            min: Some(-1.234_567),
            max: None,
        },
        [0.0, 100.0],
    )
    .unwrap();
    assert_eq!(r.min, -1.234_567);
    assert_eq!(r.max, 2.0);
}

#[test]
fn non_finite_values_are_ignored() {
    let v = cube(vec![f32::NAN, 2.0, f32::INFINITY, 4.0]);
    let r = resolve_range(&v, ValueBounds::default(), [0.0, 100.0]).unwrap();
    assert_eq!(r, ResolvedRange { min: 2.0, max: 4.0 });
}

#[test]
fn all_blank_cube_is_configuration_error() {
    let v = cube(vec![f32::NAN, f32::NAN]);
    let err = resolve_range(&v, ValueBounds::default(), [0.25, 99.75]).unwrap_err();
    assert!(matches!(err, CubeMovieError::Configuration(_)));
}

#[test]
fn inverted_or_invalid_inputs_are_rejected() {
    let v = cube(vec![1.0, 2.0]);
    let inverted = ValueBounds {
        min: Some(3.0),
        max: Some(1.0),
    };
    assert!(resolve_range(&v, inverted, [0.0, 100.0]).is_err());
    assert!(resolve_range(&v, ValueBounds::default(), [-1.0, 100.0]).is_err());
}

#[test]
fn normalize_maps_bounds_to_unit_interval() {
    let r = ResolvedRange { min: 1.0, max: 5.0 };
    assert_eq!(r.normalize(1.0), 0.0);
    assert_eq!(r.normalize(5.0), 1.0);
    assert_eq!(r.normalize(3.0), 0.5);
    assert_eq!(ResolvedRange { min: 2.0, max: 2.0 }.normalize(7.0), 0.5);
}
