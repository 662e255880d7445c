//! Glow layer generation: pad, dilate, blur.

use crate::{
    blur::gaussian_blur,
    composite::PremulRgba8,
    config::BloomParams,
    error::{GlowError, GlowResult},
    raster::Raster,
};

/// Transparent border added on each side before dilating and blurring, so the glow can bleed
/// past the text without clipping.
pub const BLOOM_PAD: u32 = 10;

/// Copy `src` into a transparent raster `2 * pad` larger in each dimension, at `(pad, pad)`.
pub fn pad(src: &Raster, pad: u32) -> GlowResult<Raster> {
    let width = src
        .width
        .checked_add(2 * pad)
        .ok_or_else(|| GlowError::render("padded width overflow"))?;
    let height = src
        .height
        .checked_add(2 * pad)
        .ok_or_else(|| GlowError::render("padded height overflow"))?;
    let mut out = Raster::new(width, height)?;
    out.blit(src, pad, pad);
    Ok(out)
}

/// Morphological dilation with a disc of the given radius.
///
/// Each output pixel takes the brightest pixel (by channel sum) among the neighbours whose
/// offset `(dx, dy)` satisfies `dx² + dy² <= (radius + 0.5)²`. Ties keep the centre pixel, then
/// the first in scan order. Radii below `0.5` are a no-op.
pub fn dilate(src: &Raster, radius: f32) -> GlowResult<Raster> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(GlowError::config("dilate radius must be finite and >= 0"));
    }
    let offsets = disc_offsets(radius);
    if offsets.is_empty() {
        return Ok(src.clone());
    }

    let mut out = Raster::new(src.width, src.height)?;
    let (w, h) = (i64::from(src.width), i64::from(src.height));
    for y in 0..h {
        for x in 0..w {
            let mut best = src.pixel(x as u32, y as u32);
            let mut best_key = brightness(best);
            for &(dx, dy) in &offsets {
                let (sx, sy) = (x + dx, y + dy);
                if sx < 0 || sy < 0 || sx >= w || sy >= h {
                    continue;
                }
                let px = src.pixel(sx as u32, sy as u32);
                let key = brightness(px);
                if key > best_key {
                    best = px;
                    best_key = key;
                }
            }
            out.set_pixel(x as u32, y as u32, best);
        }
    }
    Ok(out)
}

/// Non-zero neighbour offsets inside the dilation disc.
fn disc_offsets(radius: f32) -> Vec<(i64, i64)> {
    let reach = radius + 0.5;
    let r = reach.floor() as i64;
    let limit = reach * reach;
    let mut out = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) == (0, 0) {
                continue;
            }
            if ((dx * dx + dy * dy) as f32) <= limit {
                out.push((dx, dy));
            }
        }
    }
    out
}

fn brightness(px: PremulRgba8) -> u16 {
    px.iter().map(|&c| u16::from(c)).sum()
}

/// Build the glow layer for a rendered text canvas. The result is always
/// `(width + 2 * BLOOM_PAD, height + 2 * BLOOM_PAD)`.
#[tracing::instrument(skip(src), fields(width = src.width, height = src.height))]
pub fn bloom(src: &Raster, params: BloomParams) -> GlowResult<Raster> {
    let padded = pad(src, BLOOM_PAD)?;
    let dilated = dilate(&padded, params.dilate_radius)?;
    let glow = gaussian_blur(&dilated, params.gaussian_sigma)?;
    tracing::debug!(
        glow_width = glow.width,
        glow_height = glow.height,
        "bloom layer ready"
    );
    Ok(glow)
}
