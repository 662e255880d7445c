use std::path::Path;

use anyhow::Context as _;

use crate::{
    bloom::BLOOM_PAD,
    error::{GlowError, GlowResult},
    raster::Raster,
};

pub type PremulRgba8 = [u8; 4];

pub const OPAQUE_BLACK: PremulRgba8 = [0, 0, 0, 255];

/// Premultiplied source-over.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Decode a background image (any format the `image` crate reads) into a premultiplied raster.
#[tracing::instrument]
pub fn load_background(path: &Path) -> GlowResult<Raster> {
    let img = image::open(path)
        .with_context(|| format!("open background image '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(width, height, "decoded background");
    Raster::from_straight(width, height, rgba.into_raw())
}

/// Layer the final image: background (or solid black), then the glow at the origin, then the
/// crisp text offset by the bloom padding so the glow surrounds it.
///
/// The glow is larger than the canvas by twice the padding; its bottom and right edges are
/// clipped.
#[tracing::instrument(skip(background, glow, text))]
pub fn compose(
    width: u32,
    height: u32,
    background: Option<&Raster>,
    glow: &Raster,
    text: &Raster,
) -> GlowResult<Raster> {
    if glow.width != text.width + 2 * BLOOM_PAD || glow.height != text.height + 2 * BLOOM_PAD {
        return Err(GlowError::render(format!(
            "glow layer {}x{} does not match text layer {}x{} plus padding",
            glow.width, glow.height, text.width, text.height
        )));
    }

    let mut out = Raster::filled(width, height, OPAQUE_BLACK)?;
    if let Some(bg) = background {
        out.draw_over(bg, 0, 0);
    }
    out.draw_over(glow, 0, 0);
    out.draw_over(text, i64::from(BLOOM_PAD), i64::from(BLOOM_PAD));
    Ok(out)
}
