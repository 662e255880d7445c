use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Render a text file as a neon-glow PNG.
#[derive(Parser, Debug)]
#[command(name = "neonglow", version)]
struct Cli {
    /// Text file to render, one canvas row per line.
    input: PathBuf,

    /// TrueType font file [default: fonts/Sportrop.ttf].
    #[arg(long)]
    font: Option<PathBuf>,

    /// Background image drawn under the glow (JPEG or any format `image` decodes).
    #[arg(long)]
    bg_image: Option<PathBuf>,

    /// Text left margin in pixels [default: 10].
    #[arg(long, allow_hyphen_values = true)]
    margin_left: Option<i32>,

    /// Text top margin in pixels [default: 10].
    #[arg(long, allow_hyphen_values = true)]
    margin_top: Option<i32>,

    /// Canvas width in pixels [default: 1024].
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels [default: 400].
    #[arg(long)]
    height: Option<u32>,

    /// Output width as a fraction of the canvas width [default: 1.0].
    #[arg(long)]
    resize: Option<f64>,

    /// Bloom dilation radius in pixels [default: 0.5].
    #[arg(long)]
    bloom_dilate: Option<f32>,

    /// Bloom gaussian sigma in pixels [default: 10].
    #[arg(long)]
    bloom_gaussian: Option<f32>,

    /// Font size [default: 48].
    #[arg(long)]
    font_size: Option<f32>,

    /// PNG file to write [default: output.png].
    #[arg(long)]
    output: Option<PathBuf>,

    /// Accepted for compatibility and ignored; the input is the positional argument.
    #[arg(long)]
    file: Option<String>,

    /// Text color as "r,g,b" [default: 178,0,255].
    #[arg(long)]
    rgb: Option<String>,

    /// JSON file with default settings; keys are the long flag names.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log pipeline stages to stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> neonglow::ConfigOverrides {
        neonglow::ConfigOverrides {
            output: self.output.clone(),
            font: self.font.clone(),
            bg_image: self.bg_image.clone(),
            width: self.width,
            height: self.height,
            margin_left: self.margin_left,
            margin_top: self.margin_top,
            font_size: self.font_size,
            rgb: self.rgb.clone(),
            bloom_dilate: self.bloom_dilate,
            bloom_gaussian: self.bloom_gaussian,
            resize: self.resize,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.file.is_some() {
        tracing::warn!("--file is ignored; pass the input path as the positional argument");
    }

    let file_layer = match cli.config.as_deref() {
        Some(path) => neonglow::ConfigOverrides::from_json_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => neonglow::ConfigOverrides::default(),
    };
    let cfg = cli
        .overrides()
        .or(file_layer)
        .resolve(cli.input.clone())
        .context("resolve configuration")?;

    let summary = neonglow::run(&cfg)?;
    eprintln!(
        "wrote {} ({}x{})",
        summary.output.display(),
        summary.width,
        summary.height
    );
    Ok(())
}
