use super::*;

fn header(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn small_volume() -> Volume {
    Volume::new(
        [2, 2, 3],
        (0..12).map(|v| v as f32).collect(),
        vec![1000.0, 2000.0],
        SpectralUnit::MetrePerSecond,
        header(&[
            ("bunit", serde_json::json!("Jy/beam")),
            ("CTYPE1", serde_json::json!("RA---SIN")),
            ("CRVAL1", serde_json::json!(10.0)),
            ("CDELT1", serde_json::json!(-0.5)),
            ("CRPIX1", serde_json::json!(2.0)),
            ("CTYPE2", serde_json::json!("DEC--SIN")),
        ]),
    )
    .unwrap()
}

#[test]
fn slices_are_channel_major() {
    let v = small_volume();
    assert_eq!(v.channel_count(), 2);
    let s = v.slice(ChannelIndex(1)).unwrap();
    assert_eq!((s.rows(), s.cols()), (2, 3));
    assert_eq!(s.data(), &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    assert_eq!(s.get(1, 2), 11.0);
    assert_eq!(s.finite_min_max(), Some((6.0, 11.0)));
}

#[test]
fn slice_shape_must_match_its_data() {
    let short = [1.0f32; 3];
    let err = SliceView::new(4, 4, &short).unwrap_err();
    assert!(matches!(err, CubeMovieError::Render(_)));
    assert!(SliceView::new(0, 3, &[]).is_err());
    assert_eq!(SliceView::new(1, 3, &short).unwrap().data().len(), 3);
}

#[test]
fn out_of_range_channel_is_configuration_error() {
    let v = small_volume();
    let err = v.slice(ChannelIndex(2)).unwrap_err();
    assert!(matches!(err, CubeMovieError::Configuration(_)));
    assert!(v.spectral_value(ChannelIndex(5)).is_err());
}

#[test]
fn header_lookup_is_case_insensitive() {
    let v = small_volume();
    assert_eq!(v.header("BUNIT").as_deref(), Some("Jy/beam"));
    assert_eq!(v.header("ctype1").as_deref(), Some("RA---SIN"));
    assert_eq!(v.header("CRVAL1").as_deref(), Some("10.0"));
    assert_eq!(v.header("MISSING"), None);
}

#[test]
fn spatial_axes_follow_fits_convention() {
    let v = small_volume();
    let x = v.spatial_axis(SpatialAxis::X).unwrap();
    assert_eq!(x.ctype, "RA---SIN");
    assert_eq!(x.world(1.0), 10.0);
    assert_eq!(x.world(0.0), 10.5);

    let y = v.spatial_axis(SpatialAxis::Y).unwrap();
    assert_eq!(y.world(0.0), 0.0);
    assert_eq!(y.world(3.0), 3.0);
    assert!(v.coordinate_issue().is_none());
}

#[test]
fn missing_wcs_is_reported() {
    let v = Volume::new(
        [1, 1, 1],
        vec![1.0],
        vec![0.0],
        SpectralUnit::Hertz,
        header(&[("BUNIT", serde_json::json!("K"))]),
    )
    .unwrap();
    let issue = v.coordinate_issue().unwrap();
    assert!(issue.contains("axis 1 and axis 2"));
}

#[test]
fn spectral_values_carry_native_unit() {
    let v = small_volume();
    let q = v.spectral_value(ChannelIndex(1)).unwrap();
    assert_eq!(q, Quantity::new(2000.0, SpectralUnit::MetrePerSecond));
}

#[test]
fn constructor_validates_inputs() {
    let bunit = || header(&[("BUNIT", serde_json::json!("K"))]);
    assert!(Volume::new([1, 2, 2], vec![0.0; 3], vec![0.0], SpectralUnit::Hertz, bunit()).is_err());
    assert!(
        Volume::new([2, 1, 1], vec![0.0; 2], vec![0.0], SpectralUnit::Hertz, bunit()).is_err()
    );
    assert!(
        Volume::new(
            [2, 1, 1],
            vec![0.0; 2],
            vec![1.0, 1.0],
            SpectralUnit::Hertz,
            bunit()
        )
        .is_err()
    );
    assert!(Volume::new([1, 1, 1], vec![0.0], vec![0.0], SpectralUnit::Hertz, header(&[])).is_err());
    assert!(Volume::new([0, 1, 1], vec![], vec![], SpectralUnit::Hertz, bunit()).is_err());
}

#[test]
fn from_slices_rejects_ragged_channels() {
    let bunit = header(&[("BUNIT", serde_json::json!("K"))]);
    let ok = Volume::from_slices(
        vec![vec![vec![1.0, 2.0]], vec![vec![3.0, 4.0]]],
        vec![1.0, 2.0],
        SpectralUnit::KilometrePerSecond,
        bunit.clone(),
    )
    .unwrap();
    assert_eq!(ok.shape(), [2, 1, 2]);

    let ragged = Volume::from_slices(
        vec![vec![vec![1.0, 2.0]], vec![vec![3.0]]],
        vec![1.0, 2.0],
        SpectralUnit::KilometrePerSecond,
        bunit,
    );
    assert!(ragged.is_err());
}

#[test]
fn json_file_roundtrips_blanked_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.json");
    std::fs::write(
        &path,
        r#"{
            "shape": [1, 1, 2],
            "data": [1.5, null],
            "spectral_axis": { "values": [115.27e9], "unit": "Hz" },
            "header": { "BUNIT": "K" }
        }"#,
    )
    .unwrap();
    let v = Volume::read_json(&path).unwrap();
    let s = v.slice(ChannelIndex(0)).unwrap();
    assert_eq!(s.data()[0], 1.5);
    assert!(s.data()[1].is_nan());
    assert_eq!(s.finite_min_max(), Some((1.5, 1.5)));
}

#[test]
fn missing_json_file_has_context() {
    let err = Volume::read_json(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(format!("{err:#}").contains("open cube"));
}
