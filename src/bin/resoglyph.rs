use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use resoglyph::{
    CpuRasterSurface, FrameRGBA, GlyphEngine, ManualScheduler, RenderSettings, Rgba8, Signature,
    Viewport,
};

/// Virtual-time step per animation frame, in seconds.
const FRAME_STEP: f64 = 0.02;

/// Stage background behind the glyph.
const STAGE_CLEAR: Rgba8 = Rgba8::opaque(15, 23, 42);

#[derive(Parser, Debug)]
#[command(name = "resoglyph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a numbered PNG sequence of the animation loop.
    Sequence(SequenceArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input analysis payload JSON. Omit to render the idle glyph.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Render settings JSON. Omit for defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Virtual time into the loop, in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Square canvas size in logical px.
    #[arg(long, default_value_t = 400.0)]
    size: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Render the processing indicator instead of the glyph.
    #[arg(long)]
    processing: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Input analysis payload JSON. Omit to render the idle glyph.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Render settings JSON. Omit for defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Number of frames to render, stepping the loop's frame time.
    #[arg(long, default_value_t = 150)]
    frames: u64,

    /// Square canvas size in logical px.
    #[arg(long, default_value_t = 400.0)]
    size: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Render the processing indicator instead of the glyph.
    #[arg(long)]
    processing: bool,

    /// Output directory for frame_NNNN.png files.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Sequence(args) => cmd_sequence(args),
    }
}

fn read_payload_json(path: &Path) -> anyhow::Result<resoglyph::AnalysisPayload> {
    let f = File::open(path).with_context(|| format!("open analysis payload '{}'", path.display()))?;
    let r = BufReader::new(f);
    let payload: resoglyph::AnalysisPayload =
        serde_json::from_reader(r).with_context(|| "parse analysis payload JSON")?;
    Ok(payload)
}

fn read_settings_json(path: &Path) -> anyhow::Result<RenderSettings> {
    let f = File::open(path).with_context(|| format!("open settings '{}'", path.display()))?;
    let r = BufReader::new(f);
    let settings: RenderSettings =
        serde_json::from_reader(r).with_context(|| "parse settings JSON")?;
    Ok(settings)
}

fn attach_engine(
    size: f64,
    scale: f64,
    in_path: Option<&Path>,
    settings_path: Option<&Path>,
    processing: bool,
) -> anyhow::Result<GlyphEngine<CpuRasterSurface, ManualScheduler>> {
    let viewport = Viewport::new(size, size, scale)?;
    let surface = CpuRasterSurface::with_clear_color(viewport, STAGE_CLEAR)?;

    let settings = match settings_path {
        Some(path) => read_settings_json(path)?,
        None => RenderSettings::default(),
    };

    let mut engine = GlyphEngine::attach(surface, ManualScheduler::new(), settings)?;

    if let Some(path) = in_path {
        let payload = read_payload_json(path)?;
        engine.update_signature(Some(Signature::from(&payload)));
    }
    if processing {
        engine.set_processing(true);
    }

    Ok(engine)
}

fn step_frame(
    engine: &mut GlyphEngine<CpuRasterSurface, ManualScheduler>,
    dt: f64,
) -> anyhow::Result<()> {
    engine
        .scheduler_mut()
        .take_due()
        .ok_or_else(|| anyhow::anyhow!("animation scheduler starved (bug)"))?;
    engine.frame(dt)?;
    Ok(())
}

fn write_png(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

/// The clock only moves forward, so a backwards `--time` cannot be
/// honored and must not silently render t = 0.
fn validate_time(time: f64) -> anyhow::Result<f64> {
    if !time.is_finite() || time < 0.0 {
        anyhow::bail!("--time must be a finite, non-negative number of seconds (got {time})");
    }
    Ok(time)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let time = validate_time(args.time)?;
    let mut engine = attach_engine(
        args.size,
        args.scale,
        args.in_path.as_deref(),
        args.settings.as_deref(),
        args.processing,
    )?;

    // The composition is pure in virtual time, so one jump lands the
    // clock exactly on the requested instant.
    step_frame(&mut engine, time)?;

    let (surface, _scheduler) = engine.detach();
    write_png(&args.out, &surface.frame_rgba())?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(args: SequenceArgs) -> anyhow::Result<()> {
    let mut engine = attach_engine(
        args.size,
        args.scale,
        args.in_path.as_deref(),
        args.settings.as_deref(),
        args.processing,
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for i in 0..args.frames {
        // Frame i paints virtual time i * FRAME_STEP.
        let dt = if i == 0 { 0.0 } else { FRAME_STEP };
        step_frame(&mut engine, dt)?;

        let path = args.out_dir.join(format!("frame_{i:04}.png"));
        write_png(&path, &engine.surface().frame_rgba())?;
    }

    engine.detach();
    eprintln!(
        "wrote {} frames to {}",
        args.frames,
        args.out_dir.display()
    );
    Ok(())
}
