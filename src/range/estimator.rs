use rayon::prelude::*;

use crate::cube::volume::Cube;
use crate::foundation::core::ChannelIndex;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::foundation::math::{percentile_sorted, round_to_significant};

/// Significant figures kept for auto-computed bounds.
pub const RANGE_SIGNIFICANT_DIGITS: u32 = 4;

/// Optional explicit bounds; missing ones are estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValueBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Color-mapping range fixed for a whole session.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResolvedRange {
    pub min: f64,
    pub max: f64,
}

impl ResolvedRange {
    /// Position of `v` inside the range, in `0..=1` for values within bounds.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.5;
        }
        (v - self.min) / span
    }
}

/// Resolve the color-mapping range.
///
/// Explicit bounds are used as given. A missing bound becomes the matching percentile of every
/// finite value in the cube, rounded to [`RANGE_SIGNIFICANT_DIGITS`] significant figures.
#[tracing::instrument(skip(cube))]
pub fn resolve_range(
    cube: &dyn Cube,
    bounds: ValueBounds,
    percentiles: [f64; 2],
) -> CubeMovieResult<ResolvedRange> {
    for p in percentiles {
        if !(0.0..=100.0).contains(&p) {
            return Err(CubeMovieError::configuration(format!(
                "percentile {p} outside 0..=100"
            )));
        }
    }

    let (min, max) = match (bounds.min, bounds.max) {
        (Some(min), Some(max)) => (min, max),
        (min, max) => {
            let sorted = sorted_finite_values(cube)?;
            let estimate = |q: f64| -> CubeMovieResult<f64> {
                percentile_sorted(&sorted, q)
                    .map(|v| round_to_significant(v, RANGE_SIGNIFICANT_DIGITS))
                    .ok_or_else(|| {
                        CubeMovieError::configuration("cube contains no finite values")
                    })
            };
            let min = match min {
                Some(v) => v,
                None => {
                    let v = estimate(percentiles[0])?;
                    tracing::info!("plotting from {}th percentile ({v})", percentiles[0]);
                    v
                }
            };
            let max = match max {
                Some(v) => v,
                None => {
                    let v = estimate(percentiles[1])?;
                    tracing::info!("plotting to {}th percentile ({v})", percentiles[1]);
                    v
                }
            };
            (min, max)
        }
    };

    if !min.is_finite() || !max.is_finite() {
        return Err(CubeMovieError::configuration(format!(
            "value range must be finite, got {min}..{max}"
        )));
    }
    if min > max {
        return Err(CubeMovieError::configuration(format!(
            "value range minimum {min} exceeds maximum {max}"
        )));
    }
    Ok(ResolvedRange { min, max })
}

fn sorted_finite_values(cube: &dyn Cube) -> CubeMovieResult<Vec<f32>> {
    let mut values = Vec::new();
    for c in 0..cube.channel_count() {
        let slice = cube.slice(ChannelIndex(c))?;
        values.extend(slice.data().iter().copied().filter(|v| v.is_finite()));
    }
    values.par_sort_unstable_by(f32::total_cmp);
    Ok(values)
}

#[cfg(test)]
#[path = "../../tests/unit/range/estimator.rs"]
mod tests;
