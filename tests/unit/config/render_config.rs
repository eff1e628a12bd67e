use super::*;
use crate::cube::volume::Volume;

fn cube(channels: usize) -> Volume {
    let mut header = BTreeMap::new();
    header.insert("BUNIT".to_string(), serde_json::json!("Jy/beam"));
    Volume::new(
        [channels, 2, 2],
        vec![0.5; channels * 4],
        (0..channels).map(|c| 1000.0 * c as f64).collect(),
        SpectralUnit::MetrePerSecond,
        header,
    )
    .unwrap()
}

#[test]
fn defaults_match_documented_values() {
    let c = RenderConfig::default();
    assert_eq!(c.cmap, "RdBu_r");
    assert_eq!(c.percentiles, [0.25, 99.75]);
    assert_eq!(c.decimals, 1);
    assert_eq!(c.fps, Fps { num: 2, den: 1 });
    assert_eq!(c.out, PathBuf::from("movie.mp4"));
    assert_eq!(c.encoder, "ffmpeg");
    assert_eq!(c.codec, "h264");
    assert_eq!(c.metadata["genre"], "astrophysics");
    assert!(c.show_colorbar);
    assert!(c.encodes());
}

#[test]
fn partial_json_keeps_other_defaults() {
    let c = RenderConfig::from_json_str(
        r#"{ "cmap": "viridis", "xlabel": "RA", "channel_unit": "km/s", "channels": [2, 0] }"#,
    )
    .unwrap();
    assert_eq!(c.cmap, "viridis");
    assert_eq!(c.xlabel, LabelSetting::Text("RA".to_string()));
    assert_eq!(c.ylabel, LabelSetting::Auto);
    assert_eq!(c.channel_unit, UnitSetting::Unit(SpectralUnit::KilometrePerSecond));
    assert_eq!(c.dpi, 100.0);
}

#[test]
fn bad_json_is_configuration_error() {
    let err = RenderConfig::from_json_str(r#"{ "channel_unit": "parsec" }"#).unwrap_err();
    assert!(matches!(err, CubeMovieError::Configuration(_)));
}

#[test]
fn preview_disables_encoding_unless_requested() {
    let mut c = RenderConfig {
        preview: true,
        ..RenderConfig::default()
    };
    assert!(!c.encodes());
    c.encode = Some(true);
    assert!(c.encodes());
}

#[test]
fn empty_channel_list_selects_all() {
    let seq = RenderConfig::default().frame_sequence(&cube(3)).unwrap();
    assert_eq!(seq, vec![ChannelIndex(0), ChannelIndex(1), ChannelIndex(2)]);
}

#[test]
fn out_of_range_frame_index_is_rejected() {
    let c = RenderConfig {
        channels: vec![0, 3],
        ..RenderConfig::default()
    };
    let err = c.validate(&cube(3)).unwrap_err();
    assert!(matches!(err, CubeMovieError::Configuration(_)));
    assert!(err.to_string().contains("frame index 3"));
}

#[test]
fn validation_checks_cmap_and_unit() {
    let bad_cmap = RenderConfig {
        cmap: "jetstream".to_string(),
        ..RenderConfig::default()
    };
    assert!(bad_cmap.validate(&cube(1)).is_err());

    let bad_unit = RenderConfig {
        channel_unit: UnitSetting::Unit(SpectralUnit::Gigahertz),
        ..RenderConfig::default()
    };
    assert!(bad_unit.validate(&cube(1)).is_err());

    let good_unit = RenderConfig {
        channel_unit: UnitSetting::Unit(SpectralUnit::KilometrePerSecond),
        ..RenderConfig::default()
    };
    good_unit.validate(&cube(1)).unwrap();
}

#[test]
fn label_setting_resolution() {
    assert_eq!(
        LabelSetting::Auto.resolve(|| Some("RA---SIN".to_string())),
        Some("RA---SIN".to_string())
    );
    assert_eq!(
        LabelSetting::Text("x".to_string()).resolve(|| None),
        Some("x".to_string())
    );
    assert_eq!(LabelSetting::from("AUTO".to_string()), LabelSetting::Auto);
}
