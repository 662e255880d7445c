use std::path::Path;

use anyhow::Context as _;

use crate::{
    config::{Config, Rgb},
    error::{GlowError, GlowResult},
    raster::Raster,
};

/// Distance from the top margin to the first baseline, and between consecutive baselines.
pub const LINE_STEP_PX: i32 = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgb> for TextBrushRgba8 {
    fn from(c: Rgb) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

/// Where and how the lines go on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub width: u32,
    pub height: u32,
    pub margin_left: i32,
    pub margin_top: i32,
    pub size_px: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            margin_left: cfg.margin_left,
            margin_top: cfg.margin_top,
            size_px: cfg.font_size,
            color: cfg.color,
        }
    }

    /// Baseline y of the `index`-th line: `margin_top + 32 + 32 * index`.
    pub fn baseline(&self, index: usize) -> f64 {
        f64::from(self.margin_top) + f64::from(LINE_STEP_PX) * (index as f64 + 1.0)
    }
}

/// Split input text into rendered lines. Handles `\n` and `\r\n`; a trailing newline does not add
/// an empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Read the input file. Bytes that are not valid UTF-8 become U+FFFD instead of failing the run.
#[tracing::instrument]
pub fn read_input_text(path: &Path) -> GlowResult<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read input text '{}'", path.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), "input is not valid UTF-8; replacing bad bytes");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };
    Ok(text)
}

/// Stateful helper for building Parley text layouts from a single registered font.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and use its first family for every layout.
    pub fn new(font_bytes: &[u8]) -> GlowResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| GlowError::font("no font families registered from font bytes"))?;

        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| GlowError::font("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape one line of text. No wrapping is applied.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> GlowResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(GlowError::config("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Draws lines of text with one font onto fresh canvases.
pub struct TextRenderer {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

impl TextRenderer {
    pub fn from_font_bytes(font_bytes: Vec<u8>) -> GlowResult<Self> {
        let engine = TextLayoutEngine::new(&font_bytes)?;
        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self { engine, font })
    }

    #[tracing::instrument]
    pub fn from_font_file(path: &Path) -> GlowResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
        let renderer = Self::from_font_bytes(bytes).map_err(|e| match e {
            GlowError::Font(msg) => GlowError::font(format!("'{}': {msg}", path.display())),
            other => other,
        })?;
        tracing::debug!(family = renderer.family_name(), "loaded font");
        Ok(renderer)
    }

    pub fn family_name(&self) -> &str {
        self.engine.family_name()
    }

    /// Render `lines` left-aligned at `margin_left`, one baseline every 32 px starting
    /// 32 px below `margin_top`. Ink outside the canvas is clipped.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn render_lines(&mut self, lines: &[&str], style: &TextStyle) -> GlowResult<Raster> {
        let width: u16 = style
            .width
            .try_into()
            .map_err(|_| GlowError::render("canvas width exceeds u16"))?;
        let height: u16 = style
            .height
            .try_into()
            .map_err(|_| GlowError::render("canvas height exceeds u16"))?;

        let brush = TextBrushRgba8::from(style.color);
        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            brush.r, brush.g, brush.b, brush.a,
        ));

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let layout = self.engine.layout_line(line, style.size_px, brush)?;
            let baseline = style.baseline(index);

            for layout_line in layout.lines() {
                let dy = baseline - f64::from(layout_line.metrics().baseline);
                ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                    f64::from(style.margin_left),
                    dy,
                )));

                for item in layout_line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&self.font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        Raster::from_premul(
            style.width,
            style.height,
            pixmap.data_as_u8_slice().to_vec(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_handles_endings() {
        assert_eq!(split_lines("a\nb\r\nc\n"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn baselines_step_by_32_from_top_margin() {
        let style = TextStyle::from_config(&Config::new("in.txt"));
        assert_eq!(style.baseline(0), 42.0);
        assert_eq!(style.baseline(1), 74.0);
        assert_eq!(style.baseline(2), 106.0);
    }

    #[test]
    fn brush_is_opaque_config_color() {
        let b = TextBrushRgba8::from(Rgb {
            r: 178,
            g: 0,
            b: 255,
        });
        assert_eq!((b.r, b.g, b.b, b.a), (178, 0, 255, 255));
    }

    #[test]
    fn garbage_font_bytes_are_a_font_error() {
        let err = TextRenderer::from_font_bytes(b"not a font".to_vec())
            .err()
            .unwrap();
        assert!(matches!(err, GlowError::Font(_)), "{err}");
    }

    #[test]
    fn missing_font_file_names_path() {
        let err = TextRenderer::from_font_file(Path::new("target/no-such-font.ttf"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("no-such-font.ttf"));
    }

    #[test]
    fn non_utf8_input_is_decoded_lossily() {
        let dir = std::path::PathBuf::from("target").join("neonglow-unit");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("latin1.txt");
        std::fs::write(&path, b"caf\xe9\nNEON\n").unwrap();

        let text = read_input_text(&path).unwrap();
        assert_eq!(split_lines(&text), vec!["caf\u{FFFD}", "NEON"]);
    }

    #[test]
    fn missing_input_names_path() {
        let err = read_input_text(Path::new("target/no-such-input.txt")).unwrap_err();
        assert!(err.to_string().contains("no-such-input.txt"));
    }
}
