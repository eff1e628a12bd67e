//! Frame clock and the playback state machine.

pub mod clock;
pub mod driver;
