#![forbid(unsafe_code)]

pub mod bloom;
pub mod blur;
pub mod composite;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod raster;
pub mod text;

pub use bloom::{BLOOM_PAD, bloom};
pub use composite::{compose, load_background};
pub use config::{BloomParams, Config, ConfigOverrides, DEFAULT_FONT_PATH, Rgb};
pub use error::{GlowError, GlowResult};
pub use output::{resize_png_in_place, resize_target, write_png};
pub use pipeline::{RunSummary, glow_composite, render_glow, render_text, run};
pub use raster::Raster;
pub use text::{TextRenderer, TextStyle, split_lines};
