use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cube::units::SpectralUnit;
use crate::cube::volume::Cube;
use crate::foundation::core::{Canvas, ChannelIndex, FigureSize, Fps, Rgba8};
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::plot::colormap::Colormap;
use crate::range::estimator::ValueBounds;

/// Open map of backend-specific options for one drawing primitive.
pub type ExtraOptions = BTreeMap<String, serde_json::Value>;

/// A label that is either derived from the cube header or given verbatim.
///
/// Serialized as a plain string; `"auto"` selects [`LabelSetting::Auto`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LabelSetting {
    #[default]
    Auto,
    Text(String),
}

impl LabelSetting {
    /// The explicit text, or the header lookup result for `Auto`.
    pub fn resolve(&self, lookup: impl FnOnce() -> Option<String>) -> Option<String> {
        match self {
            Self::Auto => lookup(),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl From<String> for LabelSetting {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else {
            Self::Text(value)
        }
    }
}

impl From<LabelSetting> for String {
    fn from(value: LabelSetting) -> Self {
        match value {
            LabelSetting::Auto => "auto".to_string(),
            LabelSetting::Text(s) => s,
        }
    }
}

/// Unit the channel label is shown in; `"auto"` keeps the cube's native unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UnitSetting {
    #[default]
    Auto,
    Unit(SpectralUnit),
}

impl TryFrom<String> for UnitSetting {
    type Error = CubeMovieError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            SpectralUnit::parse(&value).map(Self::Unit)
        }
    }
}

impl From<UnitSetting> for String {
    fn from(value: UnitSetting) -> Self {
        match value {
            UnitSetting::Auto => "auto".to_string(),
            UnitSetting::Unit(u) => u.symbol().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageStyle {
    /// Opacity of the colormapped image, `0..=1`.
    pub alpha: f32,
    pub extra: ExtraOptions,
}

impl Default for ImageStyle {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            extra: ExtraOptions::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContourStyle {
    pub color: Rgba8,
    /// Line width in points.
    pub line_width: f64,
    pub extra: ExtraOptions,
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::BLACK,
            line_width: 1.0,
            extra: ExtraOptions::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChannelLabelStyle {
    pub color: Rgba8,
    /// Font size in points.
    pub font_size: f64,
    pub font_family: String,
    pub extra: ExtraOptions,
}

impl Default for ChannelLabelStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::BLACK,
            font_size: 14.0,
            font_family: "sans-serif".to_string(),
            extra: ExtraOptions::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorbarStyle {
    /// Share of the full axes width given to the colorbar.
    pub fraction: f64,
    /// Gap between axes and colorbar, as a share of the full axes width.
    pub pad: f64,
    pub extra: ExtraOptions,
}

impl Default for ColorbarStyle {
    fn default() -> Self {
        Self {
            fraction: 0.042,
            pad: 0.04,
            extra: ExtraOptions::new(),
        }
    }
}

/// Every option of a render session.
///
/// All fields have defaults, so a JSON config file may list any subset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub figure_size: FigureSize,
    pub dpi: f64,
    pub background: Rgba8,

    pub cmap: String,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub percentiles: [f64; 2],
    pub image_style: ImageStyle,

    /// Empty disables contours.
    pub contour_levels: Vec<f64>,
    pub contour_style: ContourStyle,

    pub xlabel: LabelSetting,
    pub ylabel: LabelSetting,

    /// Fractional digits of the channel label; negative values round to tens, hundreds, ...
    pub decimals: i32,
    pub channel_unit: UnitSetting,
    pub label_style: ChannelLabelStyle,

    pub show_colorbar: bool,
    pub colorbar_label: LabelSetting,
    pub colorbar_style: ColorbarStyle,

    /// Channel indices in playback order; empty selects every channel.
    pub channels: Vec<usize>,
    pub fps: Fps,
    pub repeat: bool,

    pub preview: bool,
    /// Whether to encode a movie; unset means "encode unless previewing".
    pub encode: Option<bool>,
    pub out: PathBuf,
    pub encoder: String,
    pub codec: String,
    pub bitrate_kbps: Option<u32>,
    pub metadata: BTreeMap<String, String>,
    /// Extra arguments passed to the encoder before the output path.
    pub encoder_args: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let metadata = [
            ("title", "channel maps movie"),
            ("author", "cubemovie"),
            ("genre", "astrophysics"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            figure_size: FigureSize::default(),
            dpi: 100.0,
            background: Rgba8::WHITE,
            cmap: "RdBu_r".to_string(),
            vmin: None,
            vmax: None,
            percentiles: [0.25, 99.75],
            image_style: ImageStyle::default(),
            contour_levels: Vec::new(),
            contour_style: ContourStyle::default(),
            xlabel: LabelSetting::Auto,
            ylabel: LabelSetting::Auto,
            decimals: 1,
            channel_unit: UnitSetting::Auto,
            label_style: ChannelLabelStyle::default(),
            show_colorbar: true,
            colorbar_label: LabelSetting::Auto,
            colorbar_style: ColorbarStyle::default(),
            channels: Vec::new(),
            fps: Fps::default(),
            repeat: false,
            preview: false,
            encode: None,
            out: PathBuf::from("movie.mp4"),
            encoder: "ffmpeg".to_string(),
            codec: "h264".to_string(),
            bitrate_kbps: None,
            metadata,
            encoder_args: Vec::new(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(s: &str) -> CubeMovieResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| CubeMovieError::configuration(format!("invalid render config: {e}")))
    }

    pub fn read_json(path: &Path) -> CubeMovieResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read render config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn bounds(&self) -> ValueBounds {
        ValueBounds {
            min: self.vmin,
            max: self.vmax,
        }
    }

    pub fn canvas(&self) -> CubeMovieResult<Canvas> {
        self.figure_size.canvas_at(self.dpi)
    }

    /// Whether the session encodes a movie.
    pub fn encodes(&self) -> bool {
        self.encode.unwrap_or(!self.preview)
    }

    /// The frame index sequence, with every index checked against `cube`.
    pub fn frame_sequence(&self, cube: &dyn Cube) -> CubeMovieResult<Vec<ChannelIndex>> {
        let count = cube.channel_count();
        if self.channels.is_empty() {
            return Ok((0..count).map(ChannelIndex).collect());
        }
        self.channels
            .iter()
            .map(|&c| {
                if c < count {
                    Ok(ChannelIndex(c))
                } else {
                    Err(CubeMovieError::configuration(format!(
                        "frame index {c} out of range for cube with {count} channels"
                    )))
                }
            })
            .collect()
    }

    /// Check every option that can be checked before anything is drawn.
    ///
    /// Encoder and codec names are checked by the encoder bridge.
    pub fn validate(&self, cube: &dyn Cube) -> CubeMovieResult<()> {
        self.frame_sequence(cube)?;
        self.canvas()?;
        Fps::new(self.fps.num, self.fps.den)?;
        Colormap::by_name(&self.cmap)?;

        let [p0, p1] = self.percentiles;
        if !(0.0..=100.0).contains(&p0) || !(0.0..=100.0).contains(&p1) || p0 > p1 {
            return Err(CubeMovieError::configuration(format!(
                "percentiles must satisfy 0 <= low <= high <= 100, got [{p0}, {p1}]"
            )));
        }
        if !(-12..=12).contains(&self.decimals) {
            return Err(CubeMovieError::configuration(format!(
                "decimals must be within -12..=12, got {}",
                self.decimals
            )));
        }
        if !(0.0..=1.0).contains(&self.image_style.alpha) {
            return Err(CubeMovieError::configuration("image alpha must be within 0..=1"));
        }
        if !(self.contour_style.line_width.is_finite() && self.contour_style.line_width > 0.0) {
            return Err(CubeMovieError::configuration(
                "contour line width must be finite and > 0",
            ));
        }
        if !(self.label_style.font_size.is_finite() && self.label_style.font_size > 0.0) {
            return Err(CubeMovieError::configuration(
                "channel label font size must be finite and > 0",
            ));
        }
        let cb = &self.colorbar_style;
        if !(cb.fraction > 0.0 && cb.pad >= 0.0 && cb.fraction + cb.pad < 0.5) {
            return Err(CubeMovieError::configuration(format!(
                "colorbar fraction {} and pad {} leave no room for the axes",
                cb.fraction, cb.pad
            )));
        }
        if let UnitSetting::Unit(unit) = self.channel_unit {
            cube.spectral_value(ChannelIndex(0))?.to(unit)?;
        }
        if self.bitrate_kbps == Some(0) {
            return Err(CubeMovieError::configuration("bitrate must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/render_config.rs"]
mod tests;
