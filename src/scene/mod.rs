//! The persistent figure of a session: built once, then patched per frame.

pub mod builder;
pub mod model;
pub mod updater;
