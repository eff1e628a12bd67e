use std::collections::BTreeMap;

use super::*;
use crate::config::render_config::UnitSetting;
use crate::cube::units::SpectralUnit;
use crate::cube::volume::Volume;
use crate::plot::backend::ArtistKind;
use crate::plot::recording::{BackendCall, RecordingBackend};
use crate::range::estimator::ResolvedRange;
use crate::scene::builder::SceneBuilder;

fn cube() -> Volume {
    let mut header = BTreeMap::new();
    header.insert("BUNIT".to_string(), serde_json::json!("K"));
    header.insert("CTYPE1".to_string(), serde_json::json!("GLON-CAR"));
    header.insert("CTYPE2".to_string(), serde_json::json!("GLAT-CAR"));
    Volume::from_slices(
        (0..3)
            .map(|c| vec![vec![c as f32, c as f32 + 0.5], vec![c as f32 + 1.0, c as f32]])
            .collect(),
        vec![-1500.0, 0.0, 1500.0],
        SpectralUnit::MetrePerSecond,
        header,
    )
    .unwrap()
}

fn setup(config: &RenderConfig) -> (RecordingBackend, Scene, Volume, Environment) {
    let env = Environment::isolated();
    let cube = cube();
    let mut backend = RecordingBackend::new();
    let scene = SceneBuilder::new(config, ResolvedRange { min: 0.0, max: 3.0 })
        .build(&mut backend, &cube, &env)
        .unwrap();
    (backend, scene, cube, env)
}

#[test]
fn image_and_text_are_identity_stable_contour_is_not() {
    let config = RenderConfig {
        contour_levels: vec![0.75],
        ..RenderConfig::default()
    };
    let (mut backend, mut scene, cube, env) = setup(&config);
    let (image, text) = (scene.image(), scene.text());
    let mut contour = scene.contour().unwrap();

    for c in [1, 2, 0] {
        let touched =
            update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(c)).unwrap();
        let new_contour = scene.contour().unwrap();
        assert_ne!(new_contour, contour);
        assert_eq!(touched, vec![image, new_contour, text]);
        assert_eq!((scene.image(), scene.text()), (image, text));

        let calls = backend.calls();
        let removed = calls
            .iter()
            .position(|call| *call == BackendCall::RemoveArtist(contour))
            .unwrap();
        let drawn = calls
            .iter()
            .position(|call| matches!(call, BackendCall::DrawContour { id, .. } if *id == new_contour))
            .unwrap();
        assert!(removed < drawn);
        contour = new_contour;
    }
    assert_eq!(backend.live_artists().len(), 4);
}

#[test]
fn label_uses_configured_unit_and_decimals() {
    let config = RenderConfig {
        channel_unit: UnitSetting::Unit(SpectralUnit::KilometrePerSecond),
        decimals: 2,
        ..RenderConfig::default()
    };
    let (mut backend, mut scene, cube, env) = setup(&config);
    update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(2)).unwrap();
    assert_eq!(scene.label(), "1.50 km/s");
    assert_eq!(backend.text(scene.text()), Some("1.50 km/s"));
    assert_eq!(scene.current(), ChannelIndex(2));
}

#[test]
fn image_array_follows_channel() {
    let config = RenderConfig::default();
    let (mut backend, mut scene, cube, env) = setup(&config);
    let touched =
        update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(2)).unwrap();
    assert_eq!(touched.len(), 2);
    assert!(backend.calls().contains(&BackendCall::UpdateArray {
        id: scene.image(),
        first_value: Some(2.0),
    }));
}

#[test]
fn backend_failure_propagates() {
    let config = RenderConfig::default();
    let env = Environment::isolated();
    let cube = cube();
    let mut backend = RecordingBackend::new().fail_update_after(0);
    let mut scene = SceneBuilder::new(&config, ResolvedRange { min: 0.0, max: 3.0 })
        .build(&mut backend, &cube, &env)
        .unwrap();
    assert!(update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(1)).is_err());
}

#[test]
fn failed_contour_redraw_recovers_on_the_next_frame() {
    let config = RenderConfig {
        contour_levels: vec![0.75],
        ..RenderConfig::default()
    };
    let (mut backend, mut scene, cube, env) = setup(&config);
    let first = scene.contour().unwrap();

    backend.fail_next_contours(1);
    assert!(update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(1)).is_err());
    assert_eq!(scene.contour(), None);
    assert!(backend.calls().contains(&BackendCall::RemoveArtist(first)));

    let touched =
        update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(2)).unwrap();
    let redrawn = scene.contour().unwrap();
    assert_ne!(redrawn, first);
    assert_eq!(touched, vec![scene.image(), redrawn, scene.text()]);
    let contours = backend
        .live_artists()
        .into_iter()
        .filter(|(_, kind)| *kind == ArtistKind::Contour)
        .count();
    assert_eq!(contours, 1);
}

#[test]
fn failed_contour_removal_keeps_the_live_handle() {
    let config = RenderConfig {
        contour_levels: vec![0.75],
        ..RenderConfig::default()
    };
    let (mut backend, mut scene, cube, env) = setup(&config);
    let first = scene.contour().unwrap();
    backend.remove_artist(first).unwrap();

    assert!(update_frame(&mut backend, &mut scene, &cube, &config, &env, ChannelIndex(1)).is_err());
    assert_eq!(scene.contour(), Some(first));
}
