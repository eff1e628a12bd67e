use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::cube::units::{Quantity, SpectralUnit};
use crate::foundation::core::ChannelIndex;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};

/// Header key holding the display unit of the cube's values.
pub const BUNIT: &str = "BUNIT";

/// The two spatial axes of a cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialAxis {
    /// Columns, FITS axis 1.
    X,
    /// Rows, FITS axis 2.
    Y,
}

impl SpatialAxis {
    fn fits_number(self) -> u8 {
        match self {
            Self::X => 1,
            Self::Y => 2,
        }
    }
}

/// Linear world-coordinate description of one spatial axis (FITS `CTYPEn`, `CRVALn`, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct LinearAxis {
    pub ctype: String,
    pub crval: f64,
    pub cdelt: f64,
    pub crpix: f64,
    pub cunit: Option<String>,
}

impl LinearAxis {
    /// World coordinate of a 0-based pixel position.
    pub fn world(&self, pixel: f64) -> f64 {
        self.crval + (pixel + 1.0 - self.crpix) * self.cdelt
    }
}

/// Borrowed 2D slice of a cube in row-major order.
///
/// Only [`SliceView::new`] builds one, so `data.len() == rows * cols` always holds.
#[derive(Clone, Copy, Debug)]
pub struct SliceView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f32],
}

impl<'a> SliceView<'a> {
    pub fn new(rows: usize, cols: usize, data: &'a [f32]) -> CubeMovieResult<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(CubeMovieError::render(format!(
                "slice of {rows}x{cols} does not match {} values",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Values in row-major order.
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// Minimum and maximum over finite values, if any.
    pub fn finite_min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Read access to a labeled data cube.
///
/// This is everything the render pipeline needs from a loader: slices by channel, header
/// lookups, physical values along the spectral axis and the spatial coordinate system.
pub trait Cube {
    /// Number of channels (depth slices).
    fn channel_count(&self) -> usize;

    /// Borrow the 2D slice at `channel`.
    fn slice(&self, channel: ChannelIndex) -> CubeMovieResult<SliceView<'_>>;

    /// Header value for `key` (case-insensitive), rendered as a string.
    fn header(&self, key: &str) -> Option<String>;

    /// Physical value of the spectral axis at `channel`, in the cube's native unit.
    fn spectral_value(&self, channel: ChannelIndex) -> CubeMovieResult<Quantity>;

    /// World-coordinate description of a spatial axis, if the header defines one.
    fn spatial_axis(&self, axis: SpatialAxis) -> Option<LinearAxis> {
        let n = axis.fits_number();
        let ctype = self.header(&format!("CTYPE{n}"))?;
        let num = |key: String, default: f64| -> Option<f64> {
            match self.header(&key) {
                Some(v) => v.trim().parse::<f64>().ok(),
                None => Some(default),
            }
        };
        let cdelt = num(format!("CDELT{n}"), 1.0)?;
        if cdelt == 0.0 || !cdelt.is_finite() {
            return None;
        }
        Some(LinearAxis {
            ctype,
            crval: num(format!("CRVAL{n}"), 0.0)?,
            cdelt,
            crpix: num(format!("CRPIX{n}"), 1.0)?,
            cunit: self.header(&format!("CUNIT{n}")),
        })
    }

    /// Describe why the spatial coordinate system is unusable, if it is.
    fn coordinate_issue(&self) -> Option<String> {
        let missing: Vec<&str> = [SpatialAxis::X, SpatialAxis::Y]
            .into_iter()
            .filter(|a| self.spatial_axis(*a).is_none())
            .map(|a| match a {
                SpatialAxis::X => "axis 1",
                SpatialAxis::Y => "axis 2",
            })
            .collect();
        if missing.is_empty() {
            None
        } else {
            Some(format!(
                "no valid world coordinate system for {}; falling back to pixel coordinates",
                missing.join(" and ")
            ))
        }
    }
}

/// In-memory cube: `channels x rows x cols` values plus spectral axis and header.
#[derive(Clone, Debug)]
pub struct Volume {
    channels: usize,
    rows: usize,
    cols: usize,
    data: Vec<f32>,
    spectral_values: Vec<f64>,
    spectral_unit: SpectralUnit,
    header: BTreeMap<String, serde_json::Value>,
}

impl Volume {
    /// Build a volume from channel-major data.
    ///
    /// The header must contain [`BUNIT`]; header keys are stored upper-cased.
    pub fn new(
        shape: [usize; 3],
        data: Vec<f32>,
        spectral_values: Vec<f64>,
        spectral_unit: SpectralUnit,
        header: BTreeMap<String, serde_json::Value>,
    ) -> CubeMovieResult<Self> {
        let [channels, rows, cols] = shape;
        if channels == 0 || rows == 0 || cols == 0 {
            return Err(CubeMovieError::configuration(format!(
                "cube shape must be non-empty, got {channels}x{rows}x{cols}"
            )));
        }
        let expected = channels
            .checked_mul(rows)
            .and_then(|v| v.checked_mul(cols))
            .ok_or_else(|| CubeMovieError::configuration("cube shape overflows"))?;
        if data.len() != expected {
            return Err(CubeMovieError::configuration(format!(
                "cube shape {channels}x{rows}x{cols} needs {expected} values, got {}",
                data.len()
            )));
        }
        if spectral_values.len() != channels {
            return Err(CubeMovieError::configuration(format!(
                "spectral axis has {} values for {channels} channels",
                spectral_values.len()
            )));
        }
        if spectral_values.iter().any(|v| !v.is_finite()) {
            return Err(CubeMovieError::configuration(
                "spectral axis values must be finite",
            ));
        }
        let monotonic = spectral_values.windows(2).all(|w| w[0] < w[1])
            || spectral_values.windows(2).all(|w| w[0] > w[1]);
        if !monotonic {
            return Err(CubeMovieError::configuration(
                "spectral axis values must be strictly monotonic",
            ));
        }

        let header: BTreeMap<String, serde_json::Value> = header
            .into_iter()
            .map(|(k, v)| (k.to_ascii_uppercase(), v))
            .collect();
        if !header.contains_key(BUNIT) {
            return Err(CubeMovieError::configuration(
                "cube header must contain a BUNIT entry",
            ));
        }

        Ok(Self {
            channels,
            rows,
            cols,
            data,
            spectral_values,
            spectral_unit,
            header,
        })
    }

    /// Build a volume from per-channel slices of equal shape.
    pub fn from_slices(
        slices: Vec<Vec<Vec<f32>>>,
        spectral_values: Vec<f64>,
        spectral_unit: SpectralUnit,
        header: BTreeMap<String, serde_json::Value>,
    ) -> CubeMovieResult<Self> {
        let channels = slices.len();
        let rows = slices.first().map(Vec::len).unwrap_or(0);
        let cols = slices
            .first()
            .and_then(|s| s.first())
            .map(Vec::len)
            .unwrap_or(0);
        let mut data = Vec::with_capacity(channels * rows * cols);
        for (c, slice) in slices.into_iter().enumerate() {
            if slice.len() != rows || slice.iter().any(|row| row.len() != cols) {
                return Err(CubeMovieError::configuration(format!(
                    "channel {c} does not have shape {rows}x{cols}"
                )));
            }
            data.extend(slice.into_iter().flatten());
        }
        Self::new(
            [channels, rows, cols],
            data,
            spectral_values,
            spectral_unit,
            header,
        )
    }

    /// Read a cube from a JSON file (see [`VolumeFile`]).
    pub fn read_json(path: &Path) -> CubeMovieResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open cube '{}'", path.display()))?;
        let file: VolumeFile = serde_json::from_reader(std::io::BufReader::new(f))
            .with_context(|| format!("parse cube JSON '{}'", path.display()))?;
        Self::try_from(file)
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.rows, self.cols]
    }

    pub fn spectral_unit(&self) -> SpectralUnit {
        self.spectral_unit
    }

    pub fn spectral_values(&self) -> &[f64] {
        &self.spectral_values
    }

    pub fn header_map(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.header
    }
}

impl Cube for Volume {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn slice(&self, channel: ChannelIndex) -> CubeMovieResult<SliceView<'_>> {
        if channel.0 >= self.channels {
            return Err(CubeMovieError::configuration(format!(
                "channel {channel} out of range for cube with {} channels",
                self.channels
            )));
        }
        let len = self.rows * self.cols;
        let start = channel.0 * len;
        SliceView::new(self.rows, self.cols, &self.data[start..start + len])
    }

    fn header(&self, key: &str) -> Option<String> {
        match self.header.get(&key.to_ascii_uppercase())? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn spectral_value(&self, channel: ChannelIndex) -> CubeMovieResult<Quantity> {
        let value = self.spectral_values.get(channel.0).ok_or_else(|| {
            CubeMovieError::configuration(format!(
                "channel {channel} out of range for cube with {} channels",
                self.channels
            ))
        })?;
        Ok(Quantity::new(*value, self.spectral_unit))
    }
}

/// On-disk JSON representation of a [`Volume`].
///
/// `data` is channel-major and row-major within a channel; `null` entries are read as NaN
/// (blanked pixels).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VolumeFile {
    pub shape: [usize; 3],
    pub data: Vec<Option<f32>>,
    pub spectral_axis: SpectralAxisFile,
    #[serde(default)]
    pub header: BTreeMap<String, serde_json::Value>,
}

/// Spectral axis of a [`VolumeFile`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SpectralAxisFile {
    pub values: Vec<f64>,
    pub unit: SpectralUnit,
}

impl TryFrom<VolumeFile> for Volume {
    type Error = CubeMovieError;

    fn try_from(file: VolumeFile) -> Result<Self, Self::Error> {
        let data = file
            .data
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();
        Volume::new(
            file.shape,
            data,
            file.spectral_axis.values,
            file.spectral_axis.unit,
            file.header,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cube/volume.rs"]
mod tests;
