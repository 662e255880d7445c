use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{GlowError, GlowResult},
    raster::Raster,
};

/// Encode `raster` as an RGBA PNG at `path`, creating missing parent directories.
#[tracing::instrument(skip(raster), fields(width = raster.width, height = raster.height))]
pub fn write_png(raster: &Raster, path: &Path) -> GlowResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        &raster.to_straight(),
        raster.width,
        raster.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// Target size for a resize: width is `percent * canvas_width`, height keeps the source aspect
/// ratio. Both are rounded and at least 1.
///
/// Widths round to the nearest pixel rather than truncating, so `0.333 * 1024` gives 341, not 340.
pub fn resize_target(
    src_width: u32,
    src_height: u32,
    canvas_width: u32,
    percent: f64,
) -> GlowResult<(u32, u32)> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(GlowError::config("resize percent must be finite and > 0"));
    }
    if src_width == 0 || src_height == 0 {
        return Err(GlowError::render("cannot resize an empty image"));
    }

    let width = (percent * f64::from(canvas_width)).round().max(1.0);
    let height = (f64::from(src_height) * width / f64::from(src_width))
        .round()
        .max(1.0);
    if width > f64::from(u32::MAX) || height > f64::from(u32::MAX) {
        return Err(GlowError::config("resize target exceeds u32"));
    }
    Ok((width as u32, height as u32))
}

/// Reopen the PNG at `path`, resample it with Lanczos3 to the [`resize_target`] size and
/// overwrite it. Returns the new dimensions.
#[tracing::instrument]
pub fn resize_png_in_place(path: &Path, canvas_width: u32, percent: f64) -> GlowResult<(u32, u32)> {
    let img = image::open(path).with_context(|| format!("reopen png '{}'", path.display()))?;
    let (width, height) = resize_target(img.width(), img.height(), canvas_width, percent)?;
    if (width, height) == (img.width(), img.height()) {
        return Ok((width, height));
    }

    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    resized
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write resized png '{}'", path.display()))?;
    tracing::debug!(width, height, "resized output");
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_target_identity_and_half() {
        assert_eq!(resize_target(1024, 400, 1024, 1.0).unwrap(), (1024, 400));
        assert_eq!(resize_target(1024, 400, 1024, 0.5).unwrap(), (512, 200));
        assert_eq!(resize_target(1000, 333, 1000, 0.5).unwrap(), (500, 167));
    }

    #[test]
    fn resize_target_rounds_to_nearest_pixel() {
        assert_eq!(resize_target(1024, 400, 1024, 0.333).unwrap(), (341, 133));
    }

    #[test]
    fn resize_target_never_collapses_to_zero() {
        assert_eq!(resize_target(10, 10, 10, 0.001).unwrap(), (1, 1));
    }

    #[test]
    fn resize_target_rejects_bad_percent() {
        assert!(resize_target(10, 10, 10, 0.0).is_err());
        assert!(resize_target(10, 10, 10, f64::INFINITY).is_err());
    }
}
