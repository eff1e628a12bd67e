use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::animation::driver::{AnimationDriver, DriverState};
use crate::config::render_config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, VideoCodec};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, ChannelIndex, Fps, Rgba8};
use crate::foundation::error::{CubeMovieError, CubeMovieResult, EncodingErrorKind};
use crate::plot::backend::FrameRGBA;

/// External encoders cubemovie integrates with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderKind {
    Ffmpeg,
}

impl EncoderKind {
    pub fn parse(name: &str) -> CubeMovieResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ffmpeg" => Ok(Self::Ffmpeg),
            _ => Err(CubeMovieError::encoding(
                EncodingErrorKind::UnsupportedEncoder,
                format!("encoder '{name}' is not supported; only 'ffmpeg' is"),
            )),
        }
    }
}

/// Everything the encoder needs besides the frames.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeRequest {
    pub out_path: PathBuf,
    pub encoder: String,
    pub codec: String,
    pub fps: Fps,
    pub bitrate_kbps: Option<u32>,
    pub metadata: BTreeMap<String, String>,
    pub extra_args: Vec<String>,
    /// Color transparent pixels are flattened over.
    pub background: Rgba8,
    /// Encoder executable override.
    pub program: Option<PathBuf>,
}

impl EncodeRequest {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            out_path: config.out.clone(),
            encoder: config.encoder.clone(),
            codec: config.codec.clone(),
            fps: config.fps,
            bitrate_kbps: config.bitrate_kbps,
            metadata: config.metadata.clone(),
            extra_args: config.encoder_args.clone(),
            background: config.background,
            program: None,
        }
    }
}

/// Per-frame progress: `frame` counts from 1 up to `total`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeProgress {
    pub frame: u64,
    pub total: u64,
}

/// Produces the pixels of one channel.
pub trait FrameSource {
    /// Canvas every produced frame has.
    fn canvas(&self) -> CubeMovieResult<Canvas>;

    fn render_frame(&mut self, channel: ChannelIndex) -> CubeMovieResult<FrameRGBA>;
}

/// Drives an [`AnimationDriver`] once through a sequence and streams the frames to an encoder.
///
/// Construction validates the encoder and codec names, so an unsupported choice fails before
/// anything is rendered or spawned. Failures are never retried and partial output is left in
/// place.
#[derive(Clone, Debug)]
pub struct EncoderBridge {
    request: EncodeRequest,
    kind: EncoderKind,
    codec: VideoCodec,
}

impl EncoderBridge {
    pub fn new(request: EncodeRequest) -> CubeMovieResult<Self> {
        let kind = EncoderKind::parse(&request.encoder)?;
        let codec = VideoCodec::parse(&request.codec)?;
        if request.bitrate_kbps == Some(0) {
            return Err(CubeMovieError::configuration("bitrate must be > 0"));
        }
        Ok(Self {
            request,
            kind,
            codec,
        })
    }

    pub fn request(&self) -> &EncodeRequest {
        &self.request
    }

    pub fn kind(&self) -> EncoderKind {
        self.kind
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    /// Sink for the configured encoder.
    pub fn sink(&self) -> Box<dyn FrameSink> {
        match self.kind {
            EncoderKind::Ffmpeg => {
                let mut opts = FfmpegSinkOpts::new(&self.request.out_path);
                opts.codec = self.codec;
                opts.background = self.request.background;
                opts.bitrate_kbps = self.request.bitrate_kbps;
                opts.metadata = self.request.metadata.clone();
                opts.extra_args = self.request.extra_args.clone();
                if let Some(program) = &self.request.program {
                    opts.program = program.clone();
                }
                Box::new(FfmpegSink::new(opts))
            }
        }
    }

    /// Encode with the configured encoder. Returns the output path.
    pub fn encode(
        &self,
        driver: &mut AnimationDriver,
        sequence: Vec<ChannelIndex>,
        source: &mut dyn FrameSource,
        progress: &mut dyn FnMut(EncodeProgress),
    ) -> CubeMovieResult<PathBuf> {
        let mut sink = self.sink();
        self.encode_with_sink(driver, sequence, source, sink.as_mut(), progress)?;
        Ok(self.request.out_path.clone())
    }

    /// Encode into `sink`. Returns the number of frames written.
    ///
    /// The driver is reset and armed without looping, whatever the session's loop setting.
    #[tracing::instrument(skip_all, fields(out = %self.request.out_path.display(), frames = sequence.len()))]
    pub fn encode_with_sink(
        &self,
        driver: &mut AnimationDriver,
        sequence: Vec<ChannelIndex>,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        progress: &mut dyn FnMut(EncodeProgress),
    ) -> CubeMovieResult<u64> {
        let total = sequence.len() as u64;
        let canvas = source.canvas()?;
        driver.reset();
        driver.arm(sequence, self.request.fps, false)?;
        sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.request.fps,
        })?;

        let mut written = 0u64;
        let pumped = driver.run(None, |channel| {
            let frame = source.render_frame(channel)?;
            sink.push_frame(written, &frame)?;
            written += 1;
            progress(EncodeProgress {
                frame: written,
                total,
            });
            Ok(())
        });

        let result = pumped.and_then(|_| {
            if driver.state() == DriverState::Finished && written == total {
                Ok(())
            } else {
                Err(CubeMovieError::encoding(
                    EncodingErrorKind::Process,
                    format!("encoding stopped after {written} of {total} frames"),
                ))
            }
        });
        if let Err(e) = result {
            driver.force_finish();
            sink.abort();
            return Err(e);
        }
        sink.end()?;
        tracing::info!(frames = written, "movie saved as {}", self.request.out_path.display());
        Ok(written)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/bridge.rs"]
mod tests;
