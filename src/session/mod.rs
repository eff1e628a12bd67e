//! Render sessions and preview surfaces.

pub mod preview;
pub mod render_session;
