use std::sync::Arc;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::range::estimator::ResolvedRange;

const LUT_SIZE: usize = 256;

/// Named colormaps and their anchor colors, evenly spaced from low to high.
const ANCHORS: &[(&str, &[u32])] = &[
    (
        "viridis",
        &[
            0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58,
            0xb5de2b, 0xfde725,
        ],
    ),
    (
        "magma",
        &[
            0x000004, 0x180f3d, 0x440f76, 0x721f81, 0x9e2f7f, 0xcd4071, 0xf1605d, 0xfd9668,
            0xfeca8d, 0xfcfdbf,
        ],
    ),
    (
        "inferno",
        &[
            0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06,
            0xf7d13d, 0xfcffa4,
        ],
    ),
    (
        "plasma",
        &[
            0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a,
            0xfdca26, 0xf0f921,
        ],
    ),
    (
        "cividis",
        &[
            0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8779, 0xa69d75, 0xc4b56c,
            0xe4cf5b, 0xfee838,
        ],
    ),
    ("gray", &[0x000000, 0xffffff]),
    (
        "RdBu",
        &[
            0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de,
            0x4393c3, 0x2166ac, 0x053061,
        ],
    ),
    (
        "coolwarm",
        &[
            0x3b4cc0, 0x6788ee, 0x9abbff, 0xc9d7f0, 0xedd1c2, 0xf7a889, 0xe26952, 0xb40426,
        ],
    ),
    (
        "Spectral",
        &[
            0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4,
            0x66c2a5, 0x3288bd, 0x5e4fa2,
        ],
    ),
];

/// 256-entry lookup table mapping normalized values to colors.
///
/// Any map can be reversed with an `_r` suffix (`"RdBu_r"`). Values below or above the range
/// clamp to the end colors; NaN maps to transparent.
#[derive(Clone, Debug)]
pub struct Colormap {
    name: String,
    lut: Arc<[Rgba8; LUT_SIZE]>,
}

impl Colormap {
    pub fn by_name(name: &str) -> CubeMovieResult<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let anchors = ANCHORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(base) || (base == "grey" && *n == "gray"))
            .map(|(_, a)| *a)
            .ok_or_else(|| {
                CubeMovieError::configuration(format!(
                    "unknown colormap '{name}' (known: {})",
                    Self::names().join(", ")
                ))
            })?;

        let mut lut = [Rgba8::BLACK; LUT_SIZE];
        for (i, slot) in lut.iter_mut().enumerate() {
            let mut t = i as f64 / (LUT_SIZE - 1) as f64;
            if reversed {
                t = 1.0 - t;
            }
            *slot = interpolate(anchors, t);
        }
        Ok(Self {
            name: name.to_string(),
            lut: Arc::new(lut),
        })
    }

    /// Base names of the built-in maps.
    pub fn names() -> Vec<&'static str> {
        ANCHORS.iter().map(|(n, _)| *n).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color for `t` in `0..=1`.
    pub fn sample(&self, t: f64) -> Rgba8 {
        if t.is_nan() {
            return Rgba8 {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            };
        }
        let idx = (t.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f64).round() as usize;
        self.lut[idx]
    }

    /// Color for a data value under `range`.
    pub fn map_value(&self, v: f32, range: &ResolvedRange) -> Rgba8 {
        if !v.is_finite() {
            return self.sample(f64::NAN);
        }
        self.sample(range.normalize(f64::from(v)))
    }
}

fn interpolate(anchors: &[u32], t: f64) -> Rgba8 {
    let rgb = |c: u32| -> [f64; 3] {
        [
            f64::from((c >> 16) as u8),
            f64::from((c >> 8) as u8),
            f64::from(c as u8),
        ]
    };
    let segments = anchors.len() - 1;
    let pos = t * segments as f64;
    let i = (pos.floor() as usize).min(segments - 1);
    let f = pos - i as f64;
    let a = rgb(anchors[i]);
    let b = rgb(anchors[i + 1]);
    let ch = |k: usize| -> u8 { (a[k] + (b[k] - a[k]) * f).round().clamp(0.0, 255.0) as u8 };
    Rgba8::opaque(ch(0), ch(1), ch(2))
}

#[cfg(test)]
#[path = "../../tests/unit/plot/colormap.rs"]
mod tests;
