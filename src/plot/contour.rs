use crate::cube::volume::SliceView;
use crate::foundation::core::Point;
use crate::foundation::error::{CubeMovieError, CubeMovieResult};

/// Message emitted when no requested level intersects a slice.
pub const EMPTY_CONTOUR_MESSAGE: &str = "No contour levels were found within the data range.";

/// Iso-line segments of one level, in data coordinates (`x` = column, `y` = row).
#[derive(Clone, Debug, PartialEq)]
pub struct ContourLevel {
    pub level: f64,
    pub segments: Vec<[Point; 2]>,
}

/// Levels must be finite and strictly increasing.
pub fn check_levels(levels: &[f64]) -> CubeMovieResult<()> {
    if let Some(bad) = levels.iter().find(|l| !l.is_finite()) {
        return Err(CubeMovieError::render(format!(
            "contour level {bad} is not finite"
        )));
    }
    if let Some(w) = levels.windows(2).find(|w| w[0] >= w[1]) {
        return Err(CubeMovieError::render(format!(
            "contour levels must be strictly increasing ({} then {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Whether any level lies inside the finite data range of `slice`.
pub fn any_level_in_range(slice: &SliceView<'_>, levels: &[f64]) -> bool {
    let Some((lo, hi)) = slice.finite_min_max() else {
        return false;
    };
    let (lo, hi) = (f64::from(lo), f64::from(hi));
    levels.iter().any(|l| (lo..=hi).contains(l))
}

#[derive(Clone, Copy)]
enum Edge {
    Bottom,
    Right,
    Top,
    Left,
}

/// Marching squares over `slice` for every level.
///
/// Cells touching a non-finite value are skipped. Saddle cells are resolved by the average of
/// their four corners.
pub fn trace(slice: &SliceView<'_>, levels: &[f64]) -> CubeMovieResult<Vec<ContourLevel>> {
    check_levels(levels)?;
    Ok(levels
        .iter()
        .map(|&level| ContourLevel {
            level,
            segments: trace_level(slice, level),
        })
        .collect())
}

fn trace_level(slice: &SliceView<'_>, level: f64) -> Vec<[Point; 2]> {
    use Edge::{Bottom, Left, Right, Top};

    let mut out = Vec::new();
    if slice.rows() < 2 || slice.cols() < 2 {
        return out;
    }
    let at = |r: usize, c: usize| f64::from(slice.get(r, c));

    for r in 0..slice.rows() - 1 {
        for c in 0..slice.cols() - 1 {
            let bl = at(r, c);
            let br = at(r, c + 1);
            let tr = at(r + 1, c + 1);
            let tl = at(r + 1, c);
            if ![bl, br, tr, tl].iter().all(|v| v.is_finite()) {
                continue;
            }

            let bit = |v: f64, b: u8| if v >= level { b } else { 0 };
            let case = bit(tl, 8) | bit(tr, 4) | bit(br, 2) | bit(bl, 1);
            let center_above = (bl + br + tr + tl) / 4.0 >= level;

            let pairs: &[(Edge, Edge)] = match case {
                1 | 14 => &[(Left, Bottom)],
                2 | 13 => &[(Bottom, Right)],
                3 | 12 => &[(Left, Right)],
                4 | 11 => &[(Right, Top)],
                6 | 9 => &[(Bottom, Top)],
                7 | 8 => &[(Left, Top)],
                5 if center_above => &[(Left, Top), (Bottom, Right)],
                5 => &[(Left, Bottom), (Right, Top)],
                10 if center_above => &[(Left, Bottom), (Right, Top)],
                10 => &[(Left, Top), (Bottom, Right)],
                _ => &[],
            };

            let (x0, y0) = (c as f64, r as f64);
            let point = |edge: Edge| -> Point {
                let lerp = |a: f64, b: f64| if a == b { 0.5 } else { (level - a) / (b - a) };
                match edge {
                    Bottom => Point::new(x0 + lerp(bl, br), y0),
                    Top => Point::new(x0 + lerp(tl, tr), y0 + 1.0),
                    Left => Point::new(x0, y0 + lerp(bl, tl)),
                    Right => Point::new(x0 + 1.0, y0 + lerp(br, tr)),
                }
            };
            for &(a, b) in pairs {
                out.push([point(a), point(b)]);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/plot/contour.rs"]
mod tests;
