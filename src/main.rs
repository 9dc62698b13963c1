use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ditherlab::models::{AppConfig, PresetConfig};
use ditherlab::rendering::{decode_png, encode_png, optimize_png};
use ditherlab::services::{
    native_resolution, ExportRequest, PerformanceRecorder, RenderTokens, ResolutionExporter,
    TileScheduler,
};
use dither_engine::{
    BlueNoiseMask, Color, DitherAlgorithm, PaletteExtractor, PixelBuffer, DEFAULT_MAX_COLORS,
};

#[derive(Parser)]
#[command(name = "ditherlab")]
#[command(about = "Dither images with error diffusion, ordered and stochastic strategies")]
struct Cli {
    /// Config file (default: $DITHERLAB_CONFIG or ditherlab.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tone-adjust and dither a PNG at its native resolution
    Dither {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        #[command(flatten)]
        options: DitherOptions,
    },
    /// Dither at the working resolution and upscale to the target size
    Export {
        /// Input PNG file
        input: PathBuf,

        /// Output PNG file
        output: PathBuf,

        /// Longer-edge pixel budget (default: from config)
        #[arg(long)]
        working_resolution: Option<u32>,

        /// Output width (default: source width)
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Output height (default: source height)
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Gaussian pre-blur sigma for the working buffer
        #[arg(long)]
        pre_blur: Option<f32>,

        /// Force a tile edge for tile-safe strategies
        #[arg(long)]
        tile_size: Option<u32>,

        /// Print per-stage timings
        #[arg(long)]
        timings: bool,

        #[command(flatten)]
        options: DitherOptions,
    },
    /// Extract a median-cut palette from a PNG
    Palette {
        /// Input PNG file
        input: PathBuf,

        /// Maximum number of colors
        #[arg(long, default_value_t = DEFAULT_MAX_COLORS)]
        max_colors: usize,

        /// Print the palette as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// List available dither algorithms
    Algorithms,
}

/// Dither settings; each flag overrides the preset value.
#[derive(Args)]
struct DitherOptions {
    /// Preset from the config file
    #[arg(short, long)]
    preset: Option<String>,

    /// Algorithm id (see `ditherlab algorithms`)
    #[arg(short, long)]
    algorithm: Option<DitherAlgorithm>,

    /// Binary threshold, 0-255
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Swap black and white
    #[arg(long)]
    invert: bool,

    /// Scan every row left to right
    #[arg(long)]
    no_serpentine: bool,

    /// Error diffusion strength multiplier
    #[arg(long)]
    strength: Option<f32>,

    /// Palette as comma-separated hex RGB (e.g. "#000000,#FFFFFF,#FF0000")
    #[arg(long)]
    palette: Option<String>,

    /// Extract an N-color palette from the toned image and dither with it
    #[arg(long, value_name = "N")]
    extract_palette: Option<usize>,

    /// Contrast, -100 to 100
    #[arg(long, allow_hyphen_values = true)]
    contrast: Option<f32>,

    /// Gamma, 0.5 to 2.0
    #[arg(long)]
    gamma: Option<f32>,

    /// Highlight boost, 0 to 100
    #[arg(long)]
    highlights: Option<f32>,

    /// Seed for random-threshold and reshuffled blue noise
    #[arg(long)]
    seed: Option<u64>,

    /// Reshuffle the blue-noise mask on every run
    #[arg(long)]
    reshuffle_blue_noise: bool,

    /// Halftone cell edge in pixels
    #[arg(long)]
    halftone_cell: Option<u32>,

    /// Re-compress the output PNG with oxipng
    #[arg(long)]
    optimize: bool,
}

impl DitherOptions {
    /// Apply flag overrides on top of `preset`.
    fn apply(&self, mut preset: PresetConfig) -> anyhow::Result<PresetConfig> {
        let params = &mut preset.params;
        if let Some(algorithm) = self.algorithm {
            params.algorithm = algorithm;
        }
        if let Some(threshold) = self.threshold {
            params.threshold = threshold;
        }
        if self.invert {
            params.invert = true;
        }
        if self.no_serpentine {
            params.serpentine = false;
        }
        if let Some(strength) = self.strength {
            params.error_diffusion_strength = strength;
        }
        if let Some(ref palette) = self.palette {
            params.palette = Some(parse_palette(palette)?);
        }
        if let Some(seed) = self.seed {
            params.seed = Some(seed);
        }
        if self.reshuffle_blue_noise {
            params.blue_noise_mask = BlueNoiseMask::Reshuffle;
        }
        if let Some(cell) = self.halftone_cell {
            params.halftone_cell = cell;
        }

        let tone = &mut preset.tone;
        if let Some(contrast) = self.contrast {
            tone.contrast = contrast;
        }
        if let Some(gamma) = self.gamma {
            tone.gamma = gamma;
        }
        if let Some(highlights) = self.highlights {
            tone.highlights = highlights;
        }
        Ok(preset)
    }
}

fn parse_palette(value: &str) -> anyhow::Result<Vec<Color>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Color>()
                .with_context(|| format!("Invalid palette color '{s}'"))
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ditherlab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Dither {
            input,
            output,
            options,
        } => {
            let config = load_config(cli.config.as_deref());
            let preset = options.apply(config.preset(options.preset.as_deref())?)?;
            let source = read_png(&input)?;
            let mut request = ExportRequest::from_preset(&preset, native_resolution(&source));
            request.pre_blur = 0.0;
            request.extract_palette = options.extract_palette;
            run_export(
                &source,
                &request,
                ResolutionExporter::new(),
                &output,
                options.optimize,
                None,
            )
            .await
        }
        Commands::Export {
            input,
            output,
            working_resolution,
            width,
            height,
            pre_blur,
            tile_size,
            timings,
            options,
        } => {
            let config = load_config(cli.config.as_deref());
            let preset = options.apply(config.preset(options.preset.as_deref())?)?;
            let source = read_png(&input)?;

            let mut request = ExportRequest::from_preset(
                &preset,
                working_resolution.unwrap_or(config.working_resolution),
            );
            if let (Some(w), Some(h)) = (width, height) {
                request = request.target(w, h);
            }
            if let Some(sigma) = pre_blur {
                request = request.pre_blur(sigma);
            }
            request.extract_palette = options.extract_palette;

            let mut scheduler = TileScheduler::new();
            if let Some(size) = tile_size {
                scheduler = scheduler.with_tile_size(size);
            }
            let recorder = Arc::new(PerformanceRecorder::new());
            let exporter = ResolutionExporter::new()
                .with_scheduler(scheduler)
                .with_recorder(recorder.clone());

            run_export(
                &source,
                &request,
                exporter,
                &output,
                options.optimize,
                timings.then_some(recorder),
            )
            .await
        }
        Commands::Palette {
            input,
            max_colors,
            json,
        } => run_palette_command(&input, max_colors, json),
        Commands::Algorithms => {
            run_algorithms_command();
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> AppConfig {
    AppConfig::load_or_default(&AppConfig::resolve_path(explicit))
}

fn read_png(path: &Path) -> anyhow::Result<PixelBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    decode_png(&bytes).with_context(|| format!("Failed to decode {}", path.display()))
}

/// Run one export and write the result as PNG.
async fn run_export(
    source: &PixelBuffer,
    request: &ExportRequest,
    exporter: ResolutionExporter,
    output: &Path,
    optimize: bool,
    timings: Option<Arc<PerformanceRecorder>>,
) -> anyhow::Result<()> {
    let token = RenderTokens::new().issue();
    let buffer = exporter
        .export(source, request, &token)
        .await?
        .completed()
        .context("Render was cancelled")?;

    let mut png_bytes = encode_png(&buffer)?;
    if optimize {
        png_bytes = optimize_png(png_bytes);
    }
    std::fs::write(output, &png_bytes)?;

    let (width, height) = buffer.dimensions();
    println!(
        "Rendered {} ({}x{}, {}, {} bytes)",
        output.display(),
        width,
        height,
        request.params.algorithm,
        png_bytes.len()
    );

    if let Some(recorder) = timings {
        for stage in recorder.summary() {
            println!(
                "  {:<10} {:>4}x  total {:>10.3?}  max {:>10.3?}",
                stage.label, stage.count, stage.total, stage.max
            );
        }
    }
    Ok(())
}

/// Print a median-cut palette for an image
fn run_palette_command(input: &Path, max_colors: usize, json: bool) -> anyhow::Result<()> {
    let source = read_png(input)?;
    let Some(palette) = PaletteExtractor::new().max_colors(max_colors).extract(&source) else {
        eprintln!("Not enough distinct opaque colors to build a palette");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&palette)?);
    } else {
        for color in &palette {
            println!("{color}");
        }
    }
    Ok(())
}

/// List every algorithm id with its family and description
fn run_algorithms_command() {
    for algorithm in DitherAlgorithm::ALL {
        println!(
            "  {:<20} {:<16} {}",
            algorithm.id(),
            algorithm.family().to_string(),
            algorithm.description()
        );
    }
}
