use std::path::PathBuf;

use crate::{
    bloom::bloom,
    composite::{compose, load_background},
    config::Config,
    error::GlowResult,
    output::{resize_png_in_place, write_png},
    raster::Raster,
    text::{TextRenderer, TextStyle, read_input_text, split_lines},
};

/// What [`run`] wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Render the text canvas described by `cfg`: font, input lines, color and margins.
pub fn render_text(cfg: &Config) -> GlowResult<Raster> {
    let mut renderer = TextRenderer::from_font_file(cfg.font_path())?;
    let text = read_input_text(&cfg.input)?;
    let lines = split_lines(&text);
    tracing::debug!(lines = lines.len(), family = renderer.family_name(), "laying out text");
    renderer.render_lines(&lines, &TextStyle::from_config(cfg))
}

/// Bloom and composite an already rendered text canvas.
pub fn glow_composite(cfg: &Config, text: &Raster) -> GlowResult<Raster> {
    let glow = bloom(text, cfg.bloom)?;
    let background = cfg
        .bg_image
        .as_deref()
        .map(load_background)
        .transpose()?;
    compose(cfg.width, cfg.height, background.as_ref(), &glow, text)
}

/// Full in-memory pipeline: text, bloom, composite. Nothing is written.
#[tracing::instrument(skip(cfg), fields(input = %cfg.input.display()))]
pub fn render_glow(cfg: &Config) -> GlowResult<Raster> {
    cfg.validate()?;
    let text = render_text(cfg)?;
    glow_composite(cfg, &text)
}

/// Render, write the PNG, then resize it in place when `cfg.resize != 1.0`.
/// All inputs are read before the output file is opened.
#[tracing::instrument(skip(cfg), fields(output = %cfg.output.display()))]
pub fn run(cfg: &Config) -> GlowResult<RunSummary> {
    let image = render_glow(cfg)?;

    write_png(&image, &cfg.output)?;
    let (width, height) = if cfg.needs_resize() {
        resize_png_in_place(&cfg.output, cfg.width, cfg.resize)?
    } else {
        image.dimensions()
    };

    tracing::info!(output = %cfg.output.display(), width, height, "wrote png");
    Ok(RunSummary {
        output: cfg.output.clone(),
        width,
        height,
    })
}
