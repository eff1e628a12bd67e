use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, Rgba8};
use crate::foundation::error::{
    CubeMovieError, CubeMovieResult, EncodingErrorKind, EncodingFailure,
};
use crate::plot::backend::FrameRGBA;
use crate::plot::composite::flatten_over;

/// Video codecs the ffmpeg integration knows how to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    H264,
    Hevc,
    Mpeg4,
    Vp9,
    ProRes,
    Gif,
}

impl VideoCodec {
    pub const ALL: [Self; 6] = [
        Self::H264,
        Self::Hevc,
        Self::Mpeg4,
        Self::Vp9,
        Self::ProRes,
        Self::Gif,
    ];

    /// Parse a codec name; unknown names fail before any process is spawned.
    pub fn parse(name: &str) -> CubeMovieResult<Self> {
        let codec = match name.trim().to_ascii_lowercase().as_str() {
            "h264" | "libx264" | "avc" => Self::H264,
            "hevc" | "h265" | "libx265" => Self::Hevc,
            "mpeg4" => Self::Mpeg4,
            "vp9" | "libvpx-vp9" => Self::Vp9,
            "prores" | "prores_ks" => Self::ProRes,
            "gif" => Self::Gif,
            _ => {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                return Err(CubeMovieError::encoding(
                    EncodingErrorKind::UnsupportedCodec,
                    format!("codec '{name}' is not supported (known: {})", known.join(", ")),
                ));
            }
        };
        Ok(codec)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
            Self::Mpeg4 => "mpeg4",
            Self::Vp9 => "vp9",
            Self::ProRes => "prores",
            Self::Gif => "gif",
        }
    }

    /// ffmpeg encoder passed to `-c:v`.
    pub fn encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::Hevc => "libx265",
            Self::Mpeg4 => "mpeg4",
            Self::Vp9 => "libvpx-vp9",
            Self::ProRes => "prores_ks",
            Self::Gif => "gif",
        }
    }

    /// Output pixel format, if the codec needs one forced.
    pub fn pix_fmt(self) -> Option<&'static str> {
        match self {
            Self::H264 | Self::Hevc | Self::Mpeg4 | Self::Vp9 => Some("yuv420p"),
            Self::ProRes => Some("yuv422p10le"),
            Self::Gif => None,
        }
    }

    /// Chroma-subsampled formats need even frame dimensions.
    pub fn needs_even_dimensions(self) -> bool {
        self != Self::Gif
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Background used to flatten alpha.
    pub background: Rgba8,
    pub codec: VideoCodec,
    pub bitrate_kbps: Option<u32>,
    /// Written as `-metadata key=value`.
    pub metadata: BTreeMap<String, String>,
    /// Inserted right before the output path.
    pub extra_args: Vec<String>,
    /// ffmpeg executable; a bare name is looked up on `PATH`.
    pub program: PathBuf,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            background: Rgba8::WHITE,
            codec: VideoCodec::H264,
            bitrate_kbps: None,
            metadata: BTreeMap::new(),
            extra_args: Vec::new(),
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// Full argument list for a `width x height` stream at `fps`.
    pub fn command_args(&self, width: u32, height: u32, fps: Fps) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        args.push(if self.overwrite { "-y" } else { "-n" }.to_string());
        // Input: raw RGBA8 frames, flattened before writing (ffmpeg has no premultiplied input).
        for a in [
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
        ] {
            args.push(a.to_string());
        }
        args.push(format!("{width}x{height}"));
        args.push("-r".to_string());
        args.push(format!("{}/{}", fps.num, fps.den));
        args.extend(["-i".to_string(), "pipe:0".to_string(), "-an".to_string()]);

        args.extend(["-c:v".to_string(), self.codec.encoder().to_string()]);
        if let Some(pix_fmt) = self.codec.pix_fmt() {
            args.extend(["-pix_fmt".to_string(), pix_fmt.to_string()]);
        }
        if let Some(kbps) = self.bitrate_kbps {
            args.extend(["-b:v".to_string(), format!("{kbps}k")]);
        }
        for (key, value) in &self.metadata {
            args.extend(["-metadata".to_string(), format!("{key}={value}")]);
        }
        if matches!(self.codec, VideoCodec::H264 | VideoCodec::Hevc) {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(self.out_path.display().to_string());
        args
    }
}

/// Sink that spawns `ffmpeg` and streams raw frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_position: Option<u64>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_position: None,
        }
    }

    pub fn opts(&self) -> &FfmpegSinkOpts {
        &self.opts
    }

    fn failure(&self, kind: EncodingErrorKind, message: String) -> CubeMovieError {
        let path = &self.opts.out_path;
        CubeMovieError::Encoding(EncodingFailure {
            kind,
            message,
            partial_output: path.exists().then(|| path.clone()),
        })
    }

    /// Close stdin, wait for the process and collect its stderr.
    fn finish(&mut self) -> CubeMovieResult<Option<(ExitStatus, String)>> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(None);
        };
        let status = child.wait().map_err(|e| {
            CubeMovieError::encoding(
                EncodingErrorKind::Process,
                format!("failed to wait for ffmpeg to finish: {e}"),
            )
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| {
                    CubeMovieError::encoding(
                        EncodingErrorKind::Process,
                        "ffmpeg stderr drain thread panicked",
                    )
                })?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        self.cfg = None;
        Ok(Some((
            status,
            String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
        )))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> CubeMovieResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(CubeMovieError::configuration("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(CubeMovieError::configuration(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if self.opts.codec.needs_even_dimensions()
            && (!cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2))
        {
            return Err(CubeMovieError::configuration(format!(
                "{} output needs even width/height, got {}x{}",
                self.opts.codec.name(),
                cfg.width,
                cfg.height
            )));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(CubeMovieError::configuration(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        let args = self.opts.command_args(cfg.width, cfg.height, cfg.fps);
        tracing::debug!(program = %self.opts.program.display(), ?args, "spawning ffmpeg");
        let mut child = Command::new(&self.opts.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                let kind = match e.kind() {
                    std::io::ErrorKind::NotFound => EncodingErrorKind::EncoderNotFound,
                    std::io::ErrorKind::PermissionDenied => EncodingErrorKind::PermissionDenied,
                    _ => EncodingErrorKind::Process,
                };
                CubeMovieError::encoding(
                    kind,
                    format!(
                        "failed to spawn '{}' (is ffmpeg installed and on PATH?): {e}",
                        self.opts.program.display()
                    ),
                )
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            CubeMovieError::encoding(EncodingErrorKind::Process, "failed to open ffmpeg stdin")
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            CubeMovieError::encoding(EncodingErrorKind::Process, "failed to open ffmpeg stderr")
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_position = None;
        Ok(())
    }

    fn push_frame(&mut self, position: u64, frame: &FrameRGBA) -> CubeMovieResult<()> {
        let cfg = self.cfg.ok_or_else(|| {
            CubeMovieError::encoding(EncodingErrorKind::Process, "ffmpeg sink not started")
        })?;
        if self.last_position.is_some_and(|last| position <= last) {
            return Err(CubeMovieError::encoding(
                EncodingErrorKind::Process,
                "ffmpeg sink received out-of-order frame",
            ));
        }
        self.last_position = Some(position);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(CubeMovieError::render(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let bg = self.opts.background;
        if frame.premultiplied {
            flatten_over(&mut self.scratch, &frame.data, [bg.r, bg.g, bg.b])?;
        } else {
            let premul: Vec<u8> = frame
                .data
                .chunks_exact(4)
                .flat_map(|px| {
                    Rgba8 {
                        r: px[0],
                        g: px[1],
                        b: px[2],
                        a: px[3],
                    }
                    .premul()
                })
                .collect();
            flatten_over(&mut self.scratch, &premul, [bg.r, bg.g, bg.b])?;
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CubeMovieError::encoding(
                EncodingErrorKind::Process,
                "ffmpeg sink is already finalized",
            ));
        };

        use std::io::Write as _;
        if let Err(e) = stdin.write_all(&self.scratch) {
            let io_kind = e.kind();
            let diagnostic = match self.finish() {
                Ok(Some((_, stderr))) if !stderr.is_empty() => stderr,
                _ => e.to_string(),
            };
            let kind = match classify_ffmpeg_stderr(&diagnostic) {
                EncodingErrorKind::Process if io_kind == std::io::ErrorKind::StorageFull => {
                    EncodingErrorKind::DiskFull
                }
                k => k,
            };
            return Err(self.failure(
                kind,
                format!("ffmpeg stopped accepting frames at frame {position}: {diagnostic}"),
            ));
        }
        Ok(())
    }

    fn end(&mut self) -> CubeMovieResult<()> {
        let Some((status, stderr)) = self.finish()? else {
            return Err(CubeMovieError::encoding(
                EncodingErrorKind::Process,
                "ffmpeg sink not started",
            ));
        };
        if !status.success() {
            return Err(self.failure(
                classify_ffmpeg_stderr(&stderr),
                format!("ffmpeg exited with status {status}: {stderr}"),
            ));
        }
        Ok(())
    }

    fn abort(&mut self) {
        match self.finish() {
            Ok(Some((status, stderr))) => {
                tracing::warn!(%status, stderr = %stderr, "ffmpeg aborted");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to stop ffmpeg"),
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// Map ffmpeg's stderr to a failure class.
pub fn classify_ffmpeg_stderr(stderr: &str) -> EncodingErrorKind {
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("no space left on device") || lower.contains("disk quota exceeded") {
        EncodingErrorKind::DiskFull
    } else if lower.contains("permission denied") || lower.contains("read-only file system") {
        EncodingErrorKind::PermissionDenied
    } else if lower.contains("unknown encoder")
        || lower.contains("encoder not found")
        || lower.contains("codec not currently supported")
        || lower.contains("could not find tag for codec")
    {
        EncodingErrorKind::UnsupportedCodec
    } else {
        EncodingErrorKind::Process
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CubeMovieResult<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|e| {
        let kind = match e.kind() {
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::ReadOnlyFilesystem => {
                EncodingErrorKind::PermissionDenied
            }
            std::io::ErrorKind::StorageFull => EncodingErrorKind::DiskFull,
            _ => EncodingErrorKind::Process,
        };
        CubeMovieError::encoding(
            kind,
            format!("failed to create output directory '{}': {e}", parent.display()),
        )
    })
}

/// Return `true` when `program -version` runs successfully.
pub fn is_program_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_program_available(Path::new("ffmpeg"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
