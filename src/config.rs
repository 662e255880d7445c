use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;
use serde::Deserialize;

use crate::error::{GlowError, GlowResult};

/// Font used when no `--font` is given, relative to the working directory.
pub const DEFAULT_FONT_PATH: &str = "fonts/Sportrop.ttf";
pub const DEFAULT_OUTPUT_PATH: &str = "output.png";
pub const DEFAULT_RGB: Rgb = Rgb {
    r: 178,
    g: 0,
    b: 255,
};

/// Largest canvas edge the raster surfaces accept.
pub const MAX_CANVAS_DIM: u32 = u16::MAX as u32;

/// Largest canvas area, in pixels. Each full-canvas layer costs 4 bytes per pixel.
pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse a `"r,g,b"` triplet. Components may carry surrounding whitespace and must each be
    /// an integer in `0..=255`.
    pub fn parse(s: &str) -> GlowResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(GlowError::config(format!(
                "rgb '{s}' must have exactly 3 comma-separated components, got {}",
                parts.len()
            )));
        }

        let mut out = [0u8; 3];
        for (slot, part) in out.iter_mut().zip(&parts) {
            let v: i64 = part.parse().map_err(|_| {
                GlowError::config(format!("rgb component '{part}' in '{s}' is not an integer"))
            })?;
            *slot = u8::try_from(v).map_err(|_| {
                GlowError::config(format!("rgb component {v} in '{s}' is outside 0..=255"))
            })?;
        }

        Ok(Self {
            r: out[0],
            g: out[1],
            b: out[2],
        })
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = GlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomParams {
    /// Dilation radius in pixels. `0` disables dilation.
    pub dilate_radius: f32,
    /// Gaussian sigma in pixels. `0` disables the blur.
    pub gaussian_sigma: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            dilate_radius: 0.5,
            gaussian_sigma: 10.0,
        }
    }
}

/// Fully resolved settings for one render. Built once, then passed by reference to every stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub font: Option<PathBuf>,
    pub bg_image: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub margin_left: i32,
    pub margin_top: i32,
    pub font_size: f32,
    pub color: Rgb,
    pub bloom: BloomParams,
    /// Output width as a fraction of `width`; `1.0` keeps the canvas size.
    pub resize: f64,
}

impl Config {
    /// Defaults for every setting except the input path.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            font: None,
            bg_image: None,
            width: 1024,
            height: 400,
            margin_left: 10,
            margin_top: 10,
            font_size: 48.0,
            color: DEFAULT_RGB,
            bloom: BloomParams::default(),
            resize: 1.0,
        }
    }

    pub fn font_path(&self) -> &Path {
        self.font
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_FONT_PATH))
    }

    pub fn needs_resize(&self) -> bool {
        self.resize != 1.0
    }

    pub fn validate(&self) -> GlowResult<()> {
        for (name, v) in [("width", self.width), ("height", self.height)] {
            if v == 0 || v > MAX_CANVAS_DIM {
                return Err(GlowError::config(format!(
                    "{name} must be in 1..={MAX_CANVAS_DIM}, got {v}"
                )));
            }
        }
        let pixels = u64::from(self.width) * u64::from(self.height);
        if pixels > MAX_CANVAS_PIXELS {
            return Err(GlowError::config(format!(
                "canvas {}x{} is {pixels} pixels, more than {MAX_CANVAS_PIXELS}",
                self.width, self.height
            )));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(GlowError::config("font size must be finite and > 0"));
        }
        if !self.bloom.dilate_radius.is_finite() || self.bloom.dilate_radius < 0.0 {
            return Err(GlowError::config("bloom dilate radius must be finite and >= 0"));
        }
        if !self.bloom.gaussian_sigma.is_finite() || self.bloom.gaussian_sigma < 0.0 {
            return Err(GlowError::config("bloom gaussian sigma must be finite and >= 0"));
        }
        if !self.resize.is_finite() || self.resize <= 0.0 {
            return Err(GlowError::config("resize percent must be finite and > 0"));
        }
        Ok(())
    }
}

/// A partial set of settings. Used both for the JSON config file and for CLI flags, so the two
/// layers merge field by field before falling back to [`Config::new`] defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ConfigOverrides {
    pub output: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub bg_image: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub margin_left: Option<i32>,
    pub margin_top: Option<i32>,
    pub font_size: Option<f32>,
    pub rgb: Option<String>,
    pub bloom_dilate: Option<f32>,
    pub bloom_gaussian: Option<f32>,
    pub resize: Option<f64>,
}

impl ConfigOverrides {
    pub fn from_json_str(s: &str) -> GlowResult<Self> {
        serde_json::from_str(s).map_err(|e| GlowError::config(format!("config JSON: {e}")))
    }

    pub fn from_json_file(path: &Path) -> GlowResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Fill every unset field of `self` from `lower`.
    pub fn or(self, lower: Self) -> Self {
        Self {
            output: self.output.or(lower.output),
            font: self.font.or(lower.font),
            bg_image: self.bg_image.or(lower.bg_image),
            width: self.width.or(lower.width),
            height: self.height.or(lower.height),
            margin_left: self.margin_left.or(lower.margin_left),
            margin_top: self.margin_top.or(lower.margin_top),
            font_size: self.font_size.or(lower.font_size),
            rgb: self.rgb.or(lower.rgb),
            bloom_dilate: self.bloom_dilate.or(lower.bloom_dilate),
            bloom_gaussian: self.bloom_gaussian.or(lower.bloom_gaussian),
            resize: self.resize.or(lower.resize),
        }
    }

    pub fn resolve(self, input: impl Into<PathBuf>) -> GlowResult<Config> {
        let mut cfg = Config::new(input);
        if let Some(v) = self.output {
            cfg.output = v;
        }
        cfg.font = self.font;
        cfg.bg_image = self.bg_image;
        if let Some(v) = self.width {
            cfg.width = v;
        }
        if let Some(v) = self.height {
            cfg.height = v;
        }
        if let Some(v) = self.margin_left {
            cfg.margin_left = v;
        }
        if let Some(v) = self.margin_top {
            cfg.margin_top = v;
        }
        if let Some(v) = self.font_size {
            cfg.font_size = v;
        }
        if let Some(v) = self.rgb.as_deref() {
            cfg.color = Rgb::parse(v)?;
        }
        if let Some(v) = self.bloom_dilate {
            cfg.bloom.dilate_radius = v;
        }
        if let Some(v) = self.bloom_gaussian {
            cfg.bloom.gaussian_sigma = v;
        }
        if let Some(v) = self.resize {
            cfg.resize = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
