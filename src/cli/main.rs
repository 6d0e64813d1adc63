//! InkFlow Studio CLI
//!
//! Runs the studio tools (key-out, crop, placement) and the design service
//! from the command line.

use super::config::CliConfigBuilder;
use crate::{
    booking::{
        estimate_price, upcoming_dates, Complexity, TattooSize, TattooStyle, BOOKING_WINDOW_DAYS,
        DEFAULT_ENHANCE_DESCRIPTION, TIME_SLOTS,
    },
    config::{OutputFormat, StudioConfig},
    cropper::Cropper,
    decode::decode_now,
    generation::{DesignService, GeminiClient, MockDesignService},
    geometry::{Point, Rect, Size},
    key_out::remove_background,
    placement::PlacementCompositor,
    services::{ImageIOService, OutputFormatHandler},
    tracing_config::{init_cli_tracing, spans},
    types::{ImageAsset, ToolOutcome},
    wizard::{DEFAULT_COMPLEXITY, DEFAULT_STYLE},
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// Tattoo studio design tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "inkflow")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON config file [default: <config dir>/inkflow/config.json when present]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format (overrides the config file)
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<CliOutputFormat>,

    /// JPEG quality (0-100)
    #[arg(long, global = true)]
    pub jpeg_quality: Option<u8>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Use the built-in mock design service instead of the network
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Make the near-white background of a design transparent
    KeyOut(KeyOutArgs),
    /// Crop an image using a selection made in display space
    Crop(CropArgs),
    /// Place a design over a body photo and flatten it
    Composite(CompositeArgs),
    /// Generate a design from a text description
    Generate(GenerateArgs),
    /// Redraw a reference sketch as a clean design
    Enhance(EnhanceArgs),
    /// Turn a placement composite into a realistic healed tattoo
    Simulate(SimulateArgs),
    /// Estimate the price range of a tattoo
    Quote(QuoteArgs),
    /// List bookable dates and time slots
    Dates(DatesArgs),
}

#[derive(Args, Debug)]
pub struct KeyOutArgs {
    /// Input image
    pub input: PathBuf,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Channel value every RGB channel must exceed to be keyed out
    #[arg(short, long)]
    pub threshold: Option<u8>,
}

#[derive(Args, Debug)]
pub struct CropArgs {
    /// Input image
    pub input: PathBuf,

    /// Size the image is displayed at, e.g. 400x300
    #[arg(long, value_parser = parse_size, default_value = "400x300")]
    pub display: Size,

    /// Selection in display space as x,y,width,height [default: centred 80%]
    #[arg(long, value_parser = parse_rect)]
    pub select: Option<Rect>,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompositeArgs {
    /// Body photo
    pub body: PathBuf,

    /// Design to place
    pub design: PathBuf,

    /// Placement container size, e.g. 500x500
    #[arg(long, value_parser = parse_size, default_value = "500x500")]
    pub viewport: Size,

    /// Overlay left edge in container space [default: centred]
    #[arg(long, requires = "y", allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Overlay top edge in container space [default: centred]
    #[arg(long, requires = "x", allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// Scale factor (0.2-3.0)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Rotation in degrees (0-360)
    #[arg(long)]
    pub rotation: Option<f64>,

    /// Ink opacity (0.3-1.0)
    #[arg(long)]
    pub opacity: Option<f64>,

    /// Overlay width in container pixels at scale 1
    #[arg(long)]
    pub base_width: Option<f64>,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// What the tattoo should show
    pub prompt: String,

    #[arg(long)]
    pub style: Option<TattooStyle>,

    #[arg(long)]
    pub complexity: Option<Complexity>,

    /// Send the prompt as typed, skipping the refine step
    #[arg(long)]
    pub no_refine: bool,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct EnhanceArgs {
    /// Reference sketch or photo
    pub reference: PathBuf,

    #[arg(long, default_value = DEFAULT_ENHANCE_DESCRIPTION)]
    pub description: String,

    #[arg(long)]
    pub style: Option<TattooStyle>,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Flattened placement composite
    pub composite: PathBuf,

    /// Short description of the design
    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Output file ("-" for stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    #[arg(long)]
    pub size: TattooSize,

    #[arg(long)]
    pub style: TattooStyle,

    #[arg(long)]
    pub complexity: Option<Complexity>,
}

#[derive(Args, Debug)]
pub struct DatesArgs {
    /// First bookable day as YYYY-MM-DD [default: today]
    #[arg(long)]
    pub from: Option<NaiveDate>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum CliOutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(format: CliOutputFormat) -> Self {
        match format {
            CliOutputFormat::Png => Self::Png,
            CliOutputFormat::Jpeg => Self::Jpeg,
            CliOutputFormat::Webp => Self::WebP,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_cli_tracing(cli.verbose, cli.json_logs).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;
    debug!(?config, "Resolved configuration");

    match &cli.command {
        Command::KeyOut(args) => {
            key_out(args, &config)
                .instrument(spans::command("key-out"))
                .await
        },
        Command::Crop(args) => crop(args, &config).instrument(spans::command("crop")).await,
        Command::Composite(args) => {
            composite(args, &config)
                .instrument(spans::command("composite"))
                .await
        },
        Command::Generate(args) => {
            let service = design_service(&cli, &config)?;
            generate(args, service.as_ref(), &config)
                .instrument(spans::command("generate"))
                .await
        },
        Command::Enhance(args) => {
            let service = design_service(&cli, &config)?;
            enhance(args, service.as_ref(), &config)
                .instrument(spans::command("enhance"))
                .await
        },
        Command::Simulate(args) => {
            let service = design_service(&cli, &config)?;
            simulate(args, service.as_ref(), &config)
                .instrument(spans::command("simulate"))
                .await
        },
        Command::Quote(args) => quote(args),
        Command::Dates(args) => {
            dates(args);
            Ok(())
        },
    }
}

fn design_service(cli: &Cli, config: &StudioConfig) -> Result<Box<dyn DesignService>> {
    if cli.offline {
        info!("Using offline mock design service");
        return Ok(Box::new(MockDesignService::new()));
    }
    let client = GeminiClient::new(&config.generation)
        .context("Failed to create the design service client (use --offline to run without it)")?;
    Ok(Box::new(client))
}

async fn key_out(args: &KeyOutArgs, config: &StudioConfig) -> Result<()> {
    let threshold = args
        .threshold
        .unwrap_or(config.placement.key_out_threshold);
    OutputFormatHandler::validate_for_key_out(config.output_format);

    let asset = load(&args.input)?;
    let keyed = remove_background(&asset, threshold).await;
    let output = finish_asset(keyed, config)?;

    let default_path = generate_output_path(&args.input, "keyed", config.output_format);
    write_output(&output, args.output.as_deref(), &default_path).await
}

async fn crop(args: &CropArgs, config: &StudioConfig) -> Result<()> {
    let asset = load(&args.input)?;
    let mut cropper = Cropper::new(asset, args.display).context("Invalid display size")?;
    if let Some(selection) = args.select {
        cropper.set_selection(selection);
    }
    info!(selection = %cropper.dimension_label(), "Cropping");

    let outcome = cropper.confirm().await.context("Crop failed")?;
    let cropped = completed(outcome)?;
    let output = finish_asset(cropped, config)?;

    let default_path = generate_output_path(&args.input, "cropped", config.output_format);
    write_output(&output, args.output.as_deref(), &default_path).await
}

async fn composite(args: &CompositeArgs, config: &StudioConfig) -> Result<()> {
    let body = load(&args.body)?;
    let design = load(&args.design)?;

    let mut placement_config = config.placement.clone();
    if let Some(base_width) = args.base_width {
        placement_config.base_width = base_width;
    }

    let mut compositor = PlacementCompositor::new(body, design, args.viewport, placement_config)
        .context("Invalid placement viewport")?;
    compositor
        .prepare()
        .await
        .context("Failed to prepare the design for placement")?;

    let mut transform = *compositor.transform();
    if let (Some(x), Some(y)) = (args.x, args.y) {
        transform = transform.with_position(Point::new(x, y));
    }
    if let Some(scale) = args.scale {
        transform = transform.with_scale(scale);
    }
    if let Some(rotation) = args.rotation {
        transform = transform.with_rotation(rotation);
    }
    if let Some(opacity) = args.opacity {
        transform = transform.with_opacity(opacity);
    }
    compositor.set_transform(transform);
    let applied = compositor.transform();
    info!(
        scale = %applied.scale_label(),
        rotation = %applied.rotation_label(),
        opacity = %applied.opacity_label(),
        "Flattening placement"
    );

    let outcome = compositor.confirm().await.context("Placement failed")?;
    let flattened = completed(outcome)?;
    let output = finish_asset(flattened, config)?;

    let default_path = generate_output_path(&args.body, "placed", config.output_format);
    write_output(&output, args.output.as_deref(), &default_path).await
}

async fn generate(
    args: &GenerateArgs,
    service: &dyn DesignService,
    config: &StudioConfig,
) -> Result<()> {
    let style = args.style.unwrap_or(DEFAULT_STYLE);
    let complexity = args.complexity.unwrap_or(DEFAULT_COMPLEXITY);

    let prompt = if args.no_refine {
        args.prompt.clone()
    } else {
        let pb = spinner("Refining description...");
        let refined = service
            .refine_text(&args.prompt)
            .instrument(spans::service_call(service.name(), "refine"))
            .await;
        pb.finish_and_clear();
        refined
    };
    info!(%prompt, %style, %complexity, "Generating design");

    let pb = spinner("Generating design...");
    let result = service
        .generate_design(&prompt, style, complexity)
        .instrument(spans::service_call(service.name(), "generate"))
        .await;
    pb.finish_and_clear();
    let design = result.context("Design generation failed")?;

    let output = finish_asset(design, config)?;
    let default_path = PathBuf::from(format!(
        "design.{}",
        OutputFormatHandler::get_extension(config.output_format)
    ));
    write_output(&output, args.output.as_deref(), &default_path).await
}

async fn enhance(
    args: &EnhanceArgs,
    service: &dyn DesignService,
    config: &StudioConfig,
) -> Result<()> {
    let reference = load(&args.reference)?;
    let style = args.style.unwrap_or(DEFAULT_STYLE);

    let pb = spinner("Enhancing reference...");
    let result = service
        .enhance_design(&reference, &args.description, style)
        .instrument(spans::service_call(service.name(), "enhance"))
        .await;
    pb.finish_and_clear();
    let design = result.context("Design enhancement failed")?;

    let output = finish_asset(design, config)?;
    let default_path = generate_output_path(&args.reference, "enhanced", config.output_format);
    write_output(&output, args.output.as_deref(), &default_path).await
}

async fn simulate(
    args: &SimulateArgs,
    service: &dyn DesignService,
    config: &StudioConfig,
) -> Result<()> {
    let composite = load(&args.composite)?;

    let pb = spinner("Simulating healed tattoo...");
    let result = service
        .simulate_on_body(&composite, &args.prompt)
        .instrument(spans::service_call(service.name(), "simulate"))
        .await;
    pb.finish_and_clear();
    let simulation = result.context("Simulation failed")?;

    let output = finish_asset(simulation, config)?;
    let default_path = generate_output_path(&args.composite, "simulated", config.output_format);
    write_output(&output, args.output.as_deref(), &default_path).await
}

fn quote(args: &QuoteArgs) -> Result<()> {
    let estimate = estimate_price(Some(args.size), Some(args.style), args.complexity)
        .context("A size and style are needed for an estimate")?;
    println!("{}", estimate);
    Ok(())
}

fn dates(args: &DatesArgs) {
    let from = args
        .from
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    for date in upcoming_dates(from, BOOKING_WINDOW_DAYS) {
        println!("{}", date.format("%a %Y-%m-%d"));
    }
    println!();
    println!("Time slots: {}", TIME_SLOTS.join(", "));
}

fn load(path: &Path) -> Result<ImageAsset> {
    if !ImageIOService::is_supported_format(path) {
        debug!(path = %path.display(), "Unrecognised extension, sniffing contents");
    }
    ImageIOService::load_asset(path)
        .with_context(|| format!("Failed to load image: {}", path.display()))
}

/// Unwrap a tool outcome, turning fallbacks into errors
fn completed(outcome: ToolOutcome) -> Result<ImageAsset> {
    let message = outcome.fallback_message().unwrap_or_default();
    match outcome {
        ToolOutcome::Completed(asset) => Ok(asset),
        ToolOutcome::DecodeFailed { reason } => anyhow::bail!("{} ({})", message, reason),
        ToolOutcome::Cancelled => anyhow::bail!("{}", message),
    }
}

/// Re-encode an asset into the configured output format when it differs
fn finish_asset(asset: ImageAsset, config: &StudioConfig) -> Result<ImageAsset> {
    let target_mime = OutputFormatHandler::mime_type(config.output_format);
    if asset.mime_type() == target_mime {
        return Ok(asset);
    }
    let image = decode_now(&asset).context("Failed to decode result for re-encoding")?;
    let converted = OutputFormatHandler::convert_format(image.to_rgba8(), config.output_format);
    ImageIOService::encode_image(&converted, config.output_format, config.jpeg_quality)
        .context("Failed to encode result")
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Write to the requested path, stdout for "-", or `default_path`
async fn write_output(asset: &ImageAsset, output: Option<&str>, default_path: &Path) -> Result<()> {
    match output {
        Some("-") => {
            let written = ImageIOService::save_to_writer(asset, tokio::io::stdout())
                .await
                .context("Failed to write image data to stdout")?;
            debug!(bytes = written, "Wrote image to stdout");
            Ok(())
        },
        Some(target) => save(asset, Path::new(target)),
        None => save(asset, default_path),
    }
}

fn save(asset: &ImageAsset, path: &Path) -> Result<()> {
    if !ImageIOService::is_supported_format(path) {
        warn!(
            path = %path.display(),
            mime_type = asset.mime_type(),
            "Output extension is not a recognised image type"
        );
    }
    ImageIOService::save_asset(asset, path)
        .with_context(|| format!("Failed to write output: {}", path.display()))?;
    info!(path = %path.display(), bytes = asset.len(), "Saved");
    println!("{}", path.display());
    Ok(())
}

/// `<dir>/<stem>_<suffix>.<ext>` next to the input
fn generate_output_path(input_path: &Path, suffix: &str, format: OutputFormat) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let dir = input_path.parent().unwrap_or(Path::new("."));
    dir.join(format!(
        "{}_{}.{}",
        stem.to_string_lossy(),
        suffix,
        OutputFormatHandler::get_extension(format)
    ))
}

fn parse_size(value: &str) -> std::result::Result<Size, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: f64 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}'", width))?;
    let height: f64 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}'", height))?;
    Ok(Size::new(width, height))
}

fn parse_rect(value: &str) -> std::result::Result<Rect, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", value, e))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => Err(format!("expected x,y,width,height, got '{}'", value)),
    }
}
