pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Round `x` to `digits` significant figures.
///
/// Zero and non-finite values are returned unchanged. Values too small for the scaling factor to
/// be representable are also returned unchanged.
pub fn round_to_significant(x: f64, digits: u32) -> f64 {
    if x == 0.0 || !x.is_finite() || digits == 0 {
        return x;
    }
    let magnitude = x.abs().log10().floor() as i32;
    let decimals = digits as i32 - 1 - magnitude;
    if decimals >= 0 {
        let p = 10f64.powi(decimals);
        if !p.is_finite() || !(x * p).is_finite() {
            return x;
        }
        (x * p).round() / p
    } else {
        let p = 10f64.powi(-decimals);
        (x / p).round() * p
    }
}

/// Linear-interpolated percentile of an ascending-sorted sample.
///
/// `q` is in percent (`0..=100`). Returns `None` for an empty sample.
pub fn percentile_sorted(sorted: &[f32], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let q = q.clamp(0.0, 100.0);
    let rank = q / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let a = f64::from(sorted[lo]);
    let b = f64::from(sorted[hi.min(n - 1)]);
    Some(a + (b - a) * (rank - lo as f64))
}

/// Evenly spaced "nice" tick values covering `[lo, hi]`.
///
/// Returns at most `max_ticks + 1` values, all inside the closed interval.
pub(crate) fn nice_ticks(lo: f64, hi: f64, max_ticks: usize) -> Vec<f64> {
    if !lo.is_finite() || !hi.is_finite() || max_ticks == 0 {
        return Vec::new();
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(1.0) {
        return vec![lo];
    }

    let raw_step = span / max_ticks as f64;
    let mag = 10f64.powf(raw_step.log10().floor());
    let norm = raw_step / mag;
    let step = mag
        * if norm <= 1.0 {
            1.0
        } else if norm <= 2.0 {
            2.0
        } else if norm <= 2.5 {
            2.5
        } else if norm <= 5.0 {
            5.0
        } else {
            10.0
        };

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last)
        .map(|k| {
            let v = k as f64 * step;
            if v.abs() < step * 1e-9 { 0.0 } else { v }
        })
        .collect()
}

/// Compact tick label: fixed notation with trailing zeros trimmed, or scientific notation for
/// very large or very small magnitudes.
pub(crate) fn format_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let a = v.abs();
    if !(1e-3..1e5).contains(&a) {
        return format!("{v:.2e}");
    }
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
