//! Encoding: the encoder bridge and the frame sinks it writes to.

/// Encoder selection and the encode loop.
pub mod bridge;
/// System `ffmpeg` sink.
pub mod ffmpeg;
/// Frame sink trait and the in-memory sink.
pub mod sink;
