use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Paces driver ticks.
pub trait FrameClock: Send {
    /// Block until the next tick is due.
    fn wait_next(&mut self);

    /// Forget the schedule; the next wait returns immediately.
    fn reset(&mut self);
}

/// Ticks spaced by a fixed interval.
///
/// Spacing is best effort: a tick that is already late fires immediately and the schedule
/// restarts from it, so slow frames never cause a burst of catch-up ticks.
#[derive(Debug)]
pub struct IntervalClock {
    interval: Duration,
    next: Option<Instant>,
}

impl IntervalClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn from_fps(fps: Fps) -> Self {
        Self::new(fps.frame_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameClock for IntervalClock {
    fn wait_next(&mut self) {
        let now = Instant::now();
        let due = match self.next {
            Some(due) if due > now => {
                std::thread::sleep(due - now);
                due
            }
            _ => now,
        };
        self.next = Some(due + self.interval);
    }

    fn reset(&mut self) {
        self.next = None;
    }
}

/// Ticks as fast as they are requested.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateClock;

impl FrameClock for ImmediateClock {
    fn wait_next(&mut self) {}

    fn reset(&mut self) {}
}

/// Cloneable stop request, observed by the driver at the next tick boundary.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Consume a pending request.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clock.rs"]
mod tests;
