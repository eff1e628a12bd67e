use crate::foundation::core::Fps;
use crate::foundation::error::CubeMovieResult;
use crate::plot::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in output order.
///
/// Ordering contract: `push_frame` is called with strictly increasing output positions
/// (`0, 1, 2, ...`), independent of which channel each frame shows.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> CubeMovieResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, position: u64, frame: &FrameRGBA) -> CubeMovieResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> CubeMovieResult<()>;
    /// Called instead of `end` when producing frames failed. Must not delete output.
    fn abort(&mut self) {}
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin(&mut self, cfg: SinkConfig) -> CubeMovieResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, position: u64, frame: &FrameRGBA) -> CubeMovieResult<()> {
        (**self).push_frame(position, frame)
    }

    fn end(&mut self) -> CubeMovieResult<()> {
        (**self).end()
    }

    fn abort(&mut self) {
        (**self).abort()
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    pub(crate) frames: Vec<(u64, FrameRGBA)>,
    ended: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> CubeMovieResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, position: u64, frame: &FrameRGBA) -> CubeMovieResult<()> {
        self.frames.push((position, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> CubeMovieResult<()> {
        self.ended = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
