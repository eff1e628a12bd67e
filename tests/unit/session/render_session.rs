use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use super::*;
use crate::cube::units::SpectralUnit;
use crate::cube::volume::Volume;
use crate::encode::sink::InMemorySink;
use crate::environment::state::{NoticeKind, WarningCategory};
use crate::foundation::core::Fps;
use crate::foundation::error::EncodingErrorKind;
use crate::plot::recording::{BackendCall, RecordingBackend};
use crate::session::preview::InMemoryPreview;

fn cube() -> Volume {
    Volume::from_slices(
        (1..=4)
            .map(|v| vec![vec![v as f32; 3]; 2])
            .collect(),
        vec![0.0, 1000.0, 2000.0, 3000.0],
        SpectralUnit::MetrePerSecond,
        BTreeMap::from([("BUNIT".to_string(), serde_json::json!("K"))]),
    )
    .unwrap()
}

fn preview_config() -> RenderConfig {
    RenderConfig {
        preview: true,
        fps: Fps::new(1000, 1).unwrap(),
        percentiles: [0.0, 100.0],
        ..RenderConfig::default()
    }
}

#[derive(Clone, Default)]
struct SharedPreview(std::rc::Rc<RefCell<Vec<ChannelIndex>>>);

impl PreviewSurface for SharedPreview {
    fn present(&mut self, channel: ChannelIndex, _frame: &FrameRGBA) -> CubeMovieResult<()> {
        self.0.borrow_mut().push(channel);
        Ok(())
    }
}

#[test]
fn preview_only_session_restores_the_environment() {
    let cube = cube();
    let env = Environment::isolated();
    let before = env.snapshot();
    let shown = SharedPreview::default();

    let report = RenderSession::new(&cube, preview_config())
        .with_environment(env.clone())
        .with_preview(shown.clone())
        .run(&mut RecordingBackend::new())
        .unwrap();

    assert_eq!(report.frames_previewed, 4);
    assert_eq!(report.frames_encoded, 0);
    assert!(report.output.is_none());
    assert_eq!((report.range.min, report.range.max), (1.0, 4.0));
    assert_eq!(
        *shown.0.borrow(),
        (0..4).map(ChannelIndex).collect::<Vec<_>>()
    );
    assert_eq!(report.notices.len(), 2);
    assert!(report.notices.iter().all(|n| n.kind == NoticeKind::Suppressed));
    assert_eq!(env.snapshot(), before);
}

#[test]
fn looping_preview_stops_at_the_limit() {
    let cube = cube();
    let config = RenderConfig {
        repeat: true,
        channels: vec![3, 1],
        ..preview_config()
    };
    let shown = SharedPreview::default();
    let report = RenderSession::new(&cube, config)
        .with_environment(Environment::isolated())
        .with_preview(shown.clone())
        .with_preview_limit(5)
        .run(&mut RecordingBackend::new())
        .unwrap();

    assert_eq!(report.frames_previewed, 5);
    assert_eq!(
        *shown.0.borrow(),
        [3, 1, 3, 1, 3].into_iter().map(ChannelIndex).collect::<Vec<_>>()
    );
}

struct StopAfterFirst(StopToken);

impl PreviewSurface for StopAfterFirst {
    fn present(&mut self, _channel: ChannelIndex, _frame: &FrameRGBA) -> CubeMovieResult<()> {
        self.0.request_stop();
        Ok(())
    }
}

#[test]
fn a_stop_request_pauses_the_preview() {
    let cube = cube();
    let config = RenderConfig {
        repeat: true,
        ..preview_config()
    };
    let session = RenderSession::new(&cube, config).with_environment(Environment::isolated());
    let token = session.stop_token();
    let report = session
        .with_preview(StopAfterFirst(token))
        .run(&mut RecordingBackend::new())
        .unwrap();
    assert_eq!(report.frames_previewed, 1);
}

#[test]
fn encodes_into_a_custom_sink_with_progress() {
    let cube = cube();
    let config = RenderConfig {
        channels: vec![0, 2, 2],
        percentiles: [0.0, 100.0],
        ..RenderConfig::default()
    };
    let progress = RefCell::new(Vec::new());
    let mut backend = RecordingBackend::new();

    let report = RenderSession::new(&cube, config)
        .with_environment(Environment::isolated())
        .with_sink(InMemorySink::new())
        .on_progress(|p| progress.borrow_mut().push(p.frame))
        .run(&mut backend)
        .unwrap();

    assert_eq!(report.frames_encoded, 3);
    assert_eq!(report.frames_previewed, 0);
    assert_eq!(report.output.as_deref(), Some(Path::new("movie.mp4")));
    assert_eq!(*progress.borrow(), vec![1, 2, 3]);
    let creates = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, BackendCall::CreateScene { .. }))
        .count();
    assert_eq!(creates, 1);
    assert_eq!(
        backend.text_history(),
        vec!["", "0.0 m/s", "2000.0 m/s", "2000.0 m/s"]
    );
}

#[test]
fn restored_warnings_are_reported() {
    let cube = cube();
    let report = RenderSession::new(&cube, preview_config())
        .with_environment(Environment::isolated())
        .restore_warnings(WarningSelection::One(WarningCategory::EmptyContour))
        .with_preview(InMemoryPreview::new())
        .run(&mut RecordingBackend::new())
        .unwrap();
    let restored: Vec<_> = report
        .notices
        .iter()
        .filter(|n| n.kind == NoticeKind::Restored)
        .map(|n| n.category)
        .collect();
    assert_eq!(restored, vec![WarningCategory::EmptyContour]);
}

#[test]
fn bad_frame_index_fails_before_drawing() {
    let cube = cube();
    let env = Environment::isolated();
    let before = env.snapshot();
    let mut backend = RecordingBackend::new();
    let err = RenderSession::new(
        &cube,
        RenderConfig {
            channels: vec![0, 9],
            ..RenderConfig::default()
        },
    )
    .with_environment(env.clone())
    .run(&mut backend)
    .unwrap_err();
    assert!(matches!(err, CubeMovieError::Configuration(_)));
    assert!(backend.calls().is_empty());
    assert_eq!(env.snapshot(), before);
}

#[test]
fn unsupported_encoder_fails_before_drawing_and_restores() {
    let cube = cube();
    let env = Environment::isolated();
    let before = env.snapshot();
    let mut backend = RecordingBackend::new();
    let err = RenderSession::new(
        &cube,
        RenderConfig {
            encoder: "imagemagick".to_string(),
            ..RenderConfig::default()
        },
    )
    .with_environment(env.clone())
    .run(&mut backend)
    .unwrap_err();
    assert_eq!(
        err.as_encoding().map(|f| f.kind),
        Some(EncodingErrorKind::UnsupportedEncoder)
    );
    assert!(backend.calls().is_empty());
    assert_eq!(env.snapshot(), before);
}

#[test]
fn backend_failure_mid_encode_restores_the_environment() {
    let cube = cube();
    let env = Environment::isolated();
    let before = env.snapshot();
    let mut sink_frames = 0;
    let err = RenderSession::new(
        &cube,
        RenderConfig {
            percentiles: [0.0, 100.0],
            ..RenderConfig::default()
        },
    )
    .with_environment(env.clone())
    .with_sink(InMemorySink::new())
    .on_progress(|_| sink_frames += 1)
    .run(&mut RecordingBackend::new().fail_update_after(2))
    .unwrap_err();
    assert!(matches!(err, CubeMovieError::Render(_)));
    assert_eq!(sink_frames, 2);
    assert_eq!(env.snapshot(), before);
}
