use crate::foundation::error::{CubeMovieError, CubeMovieResult};

pub use kurbo::{Point, Rect};

/// Index of one channel (depth slice) of a cube.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChannelIndex(pub usize);

impl std::fmt::Display for ChannelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rational playback rate in frames per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> CubeMovieResult<Self> {
        if den == 0 {
            return Err(CubeMovieError::configuration("fps den must be > 0"));
        }
        if num == 0 {
            return Err(CubeMovieError::configuration("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frame_interval(self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.frame_duration_secs())
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 2, den: 1 }
    }
}

/// Figure size in inches.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FigureSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl Default for FigureSize {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 8.0,
        }
    }
}

impl FigureSize {
    /// Pixel canvas for this figure at `dpi`.
    ///
    /// Dimensions are rounded up to even numbers because yuv420p output needs them.
    pub fn canvas_at(self, dpi: f64) -> CubeMovieResult<Canvas> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.width_in) || !valid(self.height_in) || !valid(dpi) {
            return Err(CubeMovieError::configuration(
                "figure size and dpi must be finite and > 0",
            ));
        }
        let to_px = |inches: f64| -> CubeMovieResult<u32> {
            let px = (inches * dpi).round().max(2.0);
            if px > f64::from(u16::MAX) {
                return Err(CubeMovieError::configuration(format!(
                    "figure dimension of {px} px exceeds {} px",
                    u16::MAX
                )));
            }
            let px = px as u32;
            Ok(px + (px % 2))
        };
        Ok(Canvas {
            width: to_px(self.width_in)?,
            height: to_px(self.height_in)?,
        })
    }
}

/// Pixel dimensions of a rendered figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn byte_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Straight-alpha RGBA8 color.
///
/// Serialized as a string: a short matplotlib-style name (`"k"`, `"white"`, ...) or `#rrggbb[aa]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn parse(s: &str) -> CubeMovieResult<Self> {
        let named = match s.trim().to_ascii_lowercase().as_str() {
            "k" | "black" => Some(Self::BLACK),
            "w" | "white" => Some(Self::WHITE),
            "r" | "red" => Some(Self::opaque(255, 0, 0)),
            "g" | "green" => Some(Self::opaque(0, 128, 0)),
            "b" | "blue" => Some(Self::opaque(0, 0, 255)),
            "gray" | "grey" => Some(Self::opaque(128, 128, 128)),
            "none" | "transparent" => Some(Self {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            }),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }

        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| CubeMovieError::configuration(format!("unknown color '{s}'")))?;
        let byte = |i: usize| -> CubeMovieResult<u8> {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| CubeMovieError::configuration(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(CubeMovieError::configuration(format!(
                "invalid hex color '{s}'"
            ))),
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        let premul = |c: u8| -> u8 { ((u16::from(c) * u16::from(self.a) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }

    /// `#rrggbbaa` representation, also used for SVG fills.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = CubeMovieError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
