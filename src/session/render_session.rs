use std::path::PathBuf;

use crate::animation::clock::{FrameClock, ImmediateClock, IntervalClock, StopToken};
use crate::animation::driver::AnimationDriver;
use crate::config::render_config::RenderConfig;
use crate::cube::volume::Cube;
use crate::encode::bridge::{EncodeProgress, EncodeRequest, EncoderBridge, FrameSource};
use crate::encode::sink::FrameSink;
use crate::environment::guard::EnvironmentGuard;
use crate::environment::state::{DisplayMode, Environment, Notice, WarningSelection};
use crate::foundation::core::{Canvas, ChannelIndex};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::backend::{FrameRGBA, PlotBackend};
use crate::range::estimator::{ResolvedRange, resolve_range};
use crate::scene::builder::SceneBuilder;
use crate::scene::model::Scene;
use crate::scene::updater::update_frame;
use crate::session::preview::PreviewSurface;

/// What a finished session did.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub range: ResolvedRange,
    pub frames_previewed: u64,
    pub frames_encoded: u64,
    /// Configured output path of the encode pass; `None` when not encoding. A caller-supplied
    /// sink decides where its frames go, so the path is reported as configured.
    pub output: Option<PathBuf>,
    /// Notices raised while the environment was held.
    pub notices: Vec<Notice>,
}

/// One render of a cube: guard, range, scene, then preview and/or encode.
///
/// ```no_run
/// use cubemovie::{RasterBackend, RenderConfig, RenderSession, Volume};
///
/// let cube = Volume::read_json("cube.json".as_ref())?;
/// let config = RenderConfig::default();
/// let report = RenderSession::new(&cube, config).run(&mut RasterBackend::new())?;
/// println!("{:?}", report.output);
/// # Ok::<(), cubemovie::CubeMovieError>(())
/// ```
pub struct RenderSession<'a> {
    cube: &'a dyn Cube,
    config: RenderConfig,
    env: Environment,
    preview: Option<Box<dyn PreviewSurface + 'a>>,
    preview_limit: Option<u64>,
    sink: Option<Box<dyn FrameSink + 'a>>,
    progress: Option<Box<dyn FnMut(EncodeProgress) + 'a>>,
    restore: Option<WarningSelection>,
    encoder_program: Option<PathBuf>,
    stop: StopToken,
}

impl<'a> RenderSession<'a> {
    pub fn new(cube: &'a dyn Cube, config: RenderConfig) -> Self {
        Self {
            cube,
            config,
            env: Environment::global(),
            preview: None,
            preview_limit: None,
            sink: None,
            progress: None,
            restore: None,
            encoder_program: None,
            stop: StopToken::new(),
        }
    }

    /// Use `env` instead of the process-wide environment.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Surface the preview pass presents to.
    pub fn with_preview(mut self, surface: impl PreviewSurface + 'a) -> Self {
        self.preview = Some(Box::new(surface));
        self
    }

    /// Stop the preview pass after `ticks` frames (a looping preview otherwise runs until stopped).
    pub fn with_preview_limit(mut self, ticks: u64) -> Self {
        self.preview_limit = Some(ticks);
        self
    }

    /// Encode into `sink` instead of the configured external encoder.
    pub fn with_sink(mut self, sink: impl FrameSink + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_encoder_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.encoder_program = Some(program.into());
        self
    }

    /// Re-enable warning categories right after the environment is entered.
    pub fn restore_warnings(mut self, selection: WarningSelection) -> Self {
        self.restore = Some(selection);
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(EncodeProgress) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Token that pauses the preview pass at the next frame boundary.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Run the session on `backend`.
    ///
    /// Configuration errors surface before the environment is touched. Once entered, the
    /// environment is restored on every path; a restore failure after another error is logged
    /// and the earlier error returned.
    #[tracing::instrument(skip_all, fields(channels = self.cube.channel_count() as u64))]
    pub fn run(mut self, backend: &mut dyn PlotBackend) -> CubeMovieResult<SessionReport> {
        self.config.validate(self.cube)?;
        let sequence = self.config.frame_sequence(self.cube)?;

        let mut guard = EnvironmentGuard::enter(&self.env, self.config.preview);
        if let Some(selection) = self.restore {
            guard.restore_warnings(selection);
        }
        let result = self.run_entered(backend, sequence);

        match (result, guard.exit()) {
            (Ok(mut report), Ok(notices)) => {
                report.notices = notices;
                Ok(report)
            }
            (Ok(_), Err(restore)) => Err(restore),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(restore)) => {
                tracing::error!(error = %restore, "environment restore failed after an earlier error");
                Err(e)
            }
        }
    }

    fn run_entered(
        &mut self,
        backend: &mut dyn PlotBackend,
        sequence: Vec<ChannelIndex>,
    ) -> CubeMovieResult<SessionReport> {
        let config = &self.config;
        let bridge = if config.encodes() {
            let mut request = EncodeRequest::from_config(config);
            request.program = self.encoder_program.clone();
            Some(EncoderBridge::new(request)?)
        } else {
            None
        };

        let range = resolve_range(self.cube, config.bounds(), config.percentiles)?;
        let scene = SceneBuilder::new(config, range).build(backend, self.cube, &self.env)?;
        let mut frames = SceneFrames {
            backend,
            scene,
            cube: self.cube,
            config,
            env: &self.env,
        };

        let mut frames_previewed = 0;
        if config.preview {
            match self.preview.as_mut() {
                Some(surface) => {
                    let clock: Box<dyn FrameClock> = match self.env.display_mode() {
                        DisplayMode::Interactive => Box::new(IntervalClock::from_fps(config.fps)),
                        DisplayMode::Batch => Box::new(ImmediateClock),
                    };
                    let mut driver =
                        AnimationDriver::new(clock).with_stop_token(self.stop.clone());
                    driver.arm(sequence.clone(), config.fps, config.repeat)?;
                    frames_previewed = driver.run(self.preview_limit, |channel| {
                        let frame = frames.render_frame(channel)?;
                        surface.present(channel, &frame)
                    })?;
                    tracing::info!(frames = frames_previewed, state = ?driver.state(), "preview finished");
                }
                None => tracing::warn!("preview requested but no preview surface is attached"),
            }
        }

        let mut frames_encoded = 0;
        let mut output = None;
        if let Some(bridge) = bridge {
            let mut driver = AnimationDriver::default();
            let mut no_progress = |_: EncodeProgress| {};
            let progress: &mut dyn FnMut(EncodeProgress) = match self.progress.as_mut() {
                Some(p) => p.as_mut(),
                None => &mut no_progress,
            };
            match self.sink.as_mut() {
                Some(sink) => {
                    frames_encoded = bridge.encode_with_sink(
                        &mut driver,
                        sequence,
                        &mut frames,
                        sink.as_mut(),
                        progress,
                    )?;
                    output = Some(bridge.request().out_path.clone());
                }
                None => {
                    let path = bridge.encode(&mut driver, sequence, &mut frames, progress)?;
                    frames_encoded = driver.ticks();
                    output = Some(path);
                }
            }
        }

        Ok(SessionReport {
            range,
            frames_previewed,
            frames_encoded,
            output,
            notices: Vec::new(),
        })
    }
}

/// Renders channels by patching the session's scene.
struct SceneFrames<'s> {
    backend: &'s mut dyn PlotBackend,
    scene: Scene,
    cube: &'s dyn Cube,
    config: &'s RenderConfig,
    env: &'s Environment,
}

impl FrameSource for SceneFrames<'_> {
    fn canvas(&self) -> CubeMovieResult<Canvas> {
        self.backend
            .canvas()
            .ok_or_else(|| CubeMovieError::render("scene has no figure"))
    }

    fn render_frame(&mut self, channel: ChannelIndex) -> CubeMovieResult<FrameRGBA> {
        update_frame(
            &mut *self.backend,
            &mut self.scene,
            self.cube,
            self.config,
            self.env,
            channel,
        )?;
        self.backend.render()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
