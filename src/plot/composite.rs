use crate::foundation::error::{CubeMovieError, CubeMovieResult};
use crate::foundation::math::mul_div255_u16;

/// One premultiplied RGBA8 pixel.
pub type Premul = [u8; 4];

/// Source-over of premultiplied pixels, with the source scaled by `opacity`.
pub fn over(dst: Premul, src: Premul, opacity: f32) -> Premul {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let sa = mul_div255_u16(u16::from(src[3]), op);
    let inv = 255 - sa;
    let mut out = [0u8; 4];
    for i in 0..4 {
        let s = if i == 3 {
            sa
        } else {
            mul_div255_u16(u16::from(src[i]), op)
        };
        out[i] = (s + mul_div255_u16(u16::from(dst[i]), inv)).min(255) as u8;
    }
    out
}

/// Composite a whole layer over `dst`.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> CubeMovieResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CubeMovieError::render(
            "layer composite expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn fill(dst: &mut [u8], px: Premul) {
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

/// Flatten premultiplied pixels over an opaque straight-alpha background.
pub fn flatten_over(dst: &mut [u8], src: &[u8], bg: [u8; 3]) -> CubeMovieResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(CubeMovieError::render(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for i in 0..3 {
            d[i] = (u16::from(s[i]) + mul_div255_u16(u16::from(bg[i]), inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/plot/composite.rs"]
mod tests;
