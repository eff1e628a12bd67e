use crate::animation::clock::{FrameClock, ImmediateClock, StopToken};
use crate::foundation::core::{ChannelIndex, Fps};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Armed frame sequence and playback position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSession {
    pub sequence: Vec<ChannelIndex>,
    pub fps: Fps,
    pub looped: bool,
    /// Index into `sequence` of the next frame.
    pub position: usize,
}

/// Walks a frame sequence tick by tick.
///
/// `arm` moves Idle to Running. `stop` pauses immediately (a [`StopToken`] request pauses at
/// the next tick boundary) and `start` resumes from the current position. A non-looping
/// sequence moves to Finished after its last frame; a looping one wraps around. Any callback
/// error forces Finished.
pub struct AnimationDriver {
    state: DriverState,
    session: Option<PlaybackSession>,
    clock: Box<dyn FrameClock>,
    stop: StopToken,
    ticks: u64,
    last: Option<ChannelIndex>,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new(Box::new(ImmediateClock))
    }
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("ticks", &self.ticks)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

impl AnimationDriver {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            state: DriverState::Idle,
            session: None,
            clock,
            stop: StopToken::new(),
            ticks: 0,
            last: None,
        }
    }

    /// Use `token` for stop requests from outside the driver.
    pub fn with_stop_token(mut self, token: StopToken) -> Self {
        self.stop = token;
        self
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Frames delivered since the last `arm`.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_visited(&self) -> Option<ChannelIndex> {
        self.last
    }

    /// Install a sequence and start running.
    pub fn arm(
        &mut self,
        sequence: Vec<ChannelIndex>,
        fps: Fps,
        looped: bool,
    ) -> CubeMovieResult<()> {
        if self.state != DriverState::Idle {
            return Err(CubeMovieError::render(format!(
                "cannot arm a driver that is {:?}; reset it first",
                self.state
            )));
        }
        if sequence.is_empty() {
            return Err(CubeMovieError::configuration("frame sequence is empty"));
        }
        tracing::debug!(frames = sequence.len(), fps = fps.as_f64(), looped, "driver armed");
        self.session = Some(PlaybackSession {
            sequence,
            fps,
            looped,
            position: 0,
        });
        self.ticks = 0;
        self.last = None;
        self.stop.take();
        self.clock.reset();
        self.state = DriverState::Running;
        Ok(())
    }

    /// Pause; the position is kept.
    pub fn stop(&mut self) {
        if self.state == DriverState::Running {
            self.state = DriverState::Paused;
        }
    }

    /// Resume a paused driver from its current position.
    pub fn start(&mut self) -> CubeMovieResult<()> {
        match self.state {
            DriverState::Running => Ok(()),
            DriverState::Paused => {
                self.stop.take();
                self.clock.reset();
                self.state = DriverState::Running;
                Ok(())
            }
            other => Err(CubeMovieError::render(format!(
                "cannot start a driver that is {other:?}"
            ))),
        }
    }

    pub fn force_finish(&mut self) {
        self.state = DriverState::Finished;
    }

    /// Drop the playback session and return to Idle.
    pub fn reset(&mut self) {
        self.session = None;
        self.state = DriverState::Idle;
        self.ticks = 0;
        self.last = None;
        self.stop.take();
        self.clock.reset();
    }

    /// Advance to the next frame without waiting on the clock.
    ///
    /// Returns `None` when the driver is not running, including when a pending stop request
    /// was just honoured.
    pub fn next_frame(&mut self) -> Option<ChannelIndex> {
        if self.state != DriverState::Running {
            return None;
        }
        if self.stop.take() {
            self.state = DriverState::Paused;
            return None;
        }
        let session = self.session.as_mut()?;
        let channel = *session.sequence.get(session.position)?;
        session.position += 1;
        if session.position == session.sequence.len() {
            if session.looped {
                session.position = 0;
            } else {
                self.state = DriverState::Finished;
            }
        }
        self.ticks += 1;
        self.last = Some(channel);
        Some(channel)
    }

    /// Wait for the clock, then hand the next frame to `on_frame`.
    pub fn tick<T>(
        &mut self,
        mut on_frame: impl FnMut(ChannelIndex) -> CubeMovieResult<T>,
    ) -> CubeMovieResult<Option<(ChannelIndex, T)>> {
        if self.state != DriverState::Running {
            return Ok(None);
        }
        self.clock.wait_next();
        let Some(channel) = self.next_frame() else {
            return Ok(None);
        };
        match on_frame(channel) {
            Ok(v) => Ok(Some((channel, v))),
            Err(e) => {
                self.force_finish();
                Err(e)
            }
        }
    }

    /// Tick until the driver stops running or `max_ticks` frames were delivered.
    ///
    /// Returns the number of frames delivered by this call.
    pub fn run(
        &mut self,
        max_ticks: Option<u64>,
        mut on_frame: impl FnMut(ChannelIndex) -> CubeMovieResult<()>,
    ) -> CubeMovieResult<u64> {
        let mut delivered = 0;
        while max_ticks.is_none_or(|max| delivered < max) {
            if self.tick(&mut on_frame)?.is_none() {
                break;
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/driver.rs"]
mod tests;
