#![forbid(unsafe_code)]

//! Channel-map movies from spectral data cubes.
//!
//! A [`RenderSession`] takes a [`Cube`] and a [`RenderConfig`], builds one persistent figure on a
//! [`PlotBackend`], then patches it frame by frame for a preview pass and/or an encode pass
//! through the system `ffmpeg`.

pub mod animation;
pub mod config;
pub mod cube;
pub mod encode;
pub mod environment;
pub mod foundation;
pub mod plot;
pub mod range;
pub mod scene;
pub mod session;

pub use animation::clock::{FrameClock, ImmediateClock, IntervalClock, StopToken};
pub use animation::driver::{AnimationDriver, DriverState, PlaybackSession};
pub use config::render_config::{LabelSetting, RenderConfig, UnitSetting};
pub use cube::units::{Quantity, SpectralUnit};
pub use cube::volume::{Cube, LinearAxis, SliceView, SpatialAxis, Volume};
pub use encode::bridge::{EncodeProgress, EncodeRequest, EncoderBridge, EncoderKind, FrameSource};
pub use encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, VideoCodec};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use environment::guard::EnvironmentGuard;
pub use environment::state::{
    DisplayMode, Environment, Notice, NoticeKind, WarningCategory, WarningSelection,
};
pub use foundation::core::{Canvas, ChannelIndex, FigureSize, Fps, Rgba8};
pub use foundation::error::{CubeMovieError, CubeMovieResult, EncodingErrorKind, EncodingFailure};
pub use plot::backend::{ArtistId, FrameRGBA, PlotBackend};
pub use plot::colormap::Colormap;
pub use plot::raster::RasterBackend;
pub use plot::recording::{BackendCall, RecordingBackend};
pub use range::estimator::{ResolvedRange, ValueBounds, resolve_range};
pub use scene::model::Scene;
pub use session::preview::{InMemoryPreview, PngPreview, PreviewSurface};
pub use session::render_session::{RenderSession, SessionReport};
