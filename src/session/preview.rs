use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::core::ChannelIndex;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::backend::FrameRGBA;

/// Where preview frames are shown.
pub trait PreviewSurface {
    fn present(&mut self, channel: ChannelIndex, frame: &FrameRGBA) -> CubeMovieResult<()>;
}

impl<P: PreviewSurface + ?Sized> PreviewSurface for &mut P {
    fn present(&mut self, channel: ChannelIndex, frame: &FrameRGBA) -> CubeMovieResult<()> {
        (**self).present(channel, frame)
    }
}

/// Preview that keeps rewriting one PNG file, for viewers that reload on change.
///
/// Each frame is written to a sibling temporary file and renamed into place so readers never
/// see a partial image.
#[derive(Debug)]
pub struct PngPreview {
    path: PathBuf,
    presented: u64,
}

impl PngPreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            presented: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl PreviewSurface for PngPreview {
    fn present(&mut self, channel: ChannelIndex, frame: &FrameRGBA) -> CubeMovieResult<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        write_png(&tmp, frame)?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace preview '{}'", self.path.display()))?;
        self.presented += 1;
        tracing::debug!(channel = channel.0, path = %self.path.display(), "preview updated");
        Ok(())
    }
}

/// Preview that keeps every presented frame in memory.
#[derive(Debug, Default)]
pub struct InMemoryPreview {
    frames: Vec<(ChannelIndex, FrameRGBA)>,
}

impl InMemoryPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[(ChannelIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn channels(&self) -> Vec<ChannelIndex> {
        self.frames.iter().map(|(c, _)| *c).collect()
    }
}

impl PreviewSurface for InMemoryPreview {
    fn present(&mut self, channel: ChannelIndex, frame: &FrameRGBA) -> CubeMovieResult<()> {
        self.frames.push((channel, frame.clone()));
        Ok(())
    }
}

/// Write a frame as a straight-alpha RGBA PNG.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> CubeMovieResult<()> {
    if frame.data.len() != frame.width as usize * frame.height as usize * 4 {
        return Err(CubeMovieError::render(format!(
            "frame buffer of {} bytes does not match {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/preview.rs"]
mod tests;
