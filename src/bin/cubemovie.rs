use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cubemovie::{
    Cube, Fps, PngPreview, RasterBackend, RenderConfig, RenderSession, Volume, WarningCategory,
    WarningSelection,
};

#[derive(Parser, Debug)]
#[command(name = "cubemovie", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a channel-map movie (requires `ffmpeg` on PATH) and/or a PNG preview.
    Render(RenderArgs),
    /// Render a single channel as a PNG.
    Frame(FrameArgs),
    /// Print a cube summary and the resolved color range.
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct CubeArgs {
    /// Input cube JSON.
    #[arg(long)]
    cube: PathBuf,

    /// Render configuration JSON. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Colormap name (append `_r` to reverse).
    #[arg(long)]
    cmap: Option<String>,

    /// Lower end of the color range.
    #[arg(long, allow_hyphen_values = true)]
    vmin: Option<f64>,

    /// Upper end of the color range.
    #[arg(long, allow_hyphen_values = true)]
    vmax: Option<f64>,

    /// Contour levels, comma separated.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    levels: Option<Vec<f64>>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    cube: CubeArgs,

    /// Output movie path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Channel indices to render, comma separated (default: every channel).
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<usize>>,

    /// Video codec.
    #[arg(long)]
    codec: Option<String>,

    /// Target bitrate in kbit/s.
    #[arg(long)]
    bitrate: Option<u32>,

    /// Path to the ffmpeg program.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Show a preview by rewriting this PNG for every frame.
    #[arg(long)]
    preview_png: Option<PathBuf>,

    /// Loop the preview.
    #[arg(long = "loop")]
    looped: bool,

    /// Stop the preview after this many frames.
    #[arg(long)]
    preview_frames: Option<u64>,

    /// Also encode when previewing.
    #[arg(long)]
    encode: bool,

    /// Re-enable suppressed warnings for this render.
    #[arg(long, value_enum)]
    restore_warnings: Option<WarningChoice>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    cube: CubeArgs,

    /// Channel index (0-based).
    #[arg(long)]
    channel: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct InfoArgs {
    #[command(flatten)]
    cube: CubeArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WarningChoice {
    All,
    CoordinateSystem,
    EmptyContour,
}

impl From<WarningChoice> for WarningSelection {
    fn from(choice: WarningChoice) -> Self {
        match choice {
            WarningChoice::All => WarningSelection::All,
            WarningChoice::CoordinateSystem => {
                WarningSelection::One(WarningCategory::CoordinateSystem)
            }
            WarningChoice::EmptyContour => WarningSelection::One(WarningCategory::EmptyContour),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn load(args: &CubeArgs) -> anyhow::Result<(Volume, RenderConfig)> {
    let cube = Volume::read_json(&args.cube)?;
    let mut config = match &args.config {
        Some(path) => RenderConfig::read_json(path)?,
        None => RenderConfig::default(),
    };
    if let Some(cmap) = &args.cmap {
        config.cmap = cmap.clone();
    }
    if args.vmin.is_some() {
        config.vmin = args.vmin;
    }
    if args.vmax.is_some() {
        config.vmax = args.vmax;
    }
    if let Some(levels) = &args.levels {
        config.contour_levels = levels.clone();
    }
    Ok((cube, config))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (cube, mut config) = load(&args.cube)?;
    if let Some(out) = args.out {
        config.out = out;
    }
    if let Some(fps) = args.fps {
        config.fps = Fps::new(fps, 1)?;
    }
    if let Some(channels) = args.channels {
        config.channels = channels;
    }
    if let Some(codec) = args.codec {
        config.codec = codec;
    }
    if args.bitrate.is_some() {
        config.bitrate_kbps = args.bitrate;
    }
    if args.looped {
        config.repeat = true;
    }
    if args.preview_png.is_some() {
        config.preview = true;
        if args.encode {
            config.encode = Some(true);
        }
    }

    let mut session = RenderSession::new(&cube, config).on_progress(|p| {
        eprint!("\rframe {}/{}", p.frame, p.total);
        if p.frame == p.total {
            eprintln!();
        }
    });
    if let Some(path) = &args.preview_png {
        session = session.with_preview(PngPreview::new(path));
    }
    if let Some(limit) = args.preview_frames {
        session = session.with_preview_limit(limit);
    }
    if let Some(program) = args.ffmpeg {
        session = session.with_encoder_program(program);
    }
    if let Some(choice) = args.restore_warnings {
        session = session.restore_warnings(choice.into());
    }

    let report = session.run(&mut RasterBackend::new())?;
    if let Some(out) = &report.output {
        eprintln!("wrote {}", out.display());
    }
    if report.frames_previewed > 0 {
        eprintln!("previewed {} frames", report.frames_previewed);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (cube, mut config) = load(&args.cube)?;
    config.channels = vec![args.channel];
    config.preview = true;
    config.encode = Some(false);
    config.repeat = false;

    RenderSession::new(&cube, config)
        .with_preview(PngPreview::new(&args.out))
        .run(&mut RasterBackend::new())
        .with_context(|| format!("render channel {}", args.channel))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (cube, config) = load(&args.cube)?;
    let [channels, rows, cols] = cube.shape();
    let values = cube.spectral_values();

    println!("cube:      {}", display_path(&args.cube.cube));
    println!("shape:     {channels} x {rows} x {cols}");
    println!(
        "spectral:  {} .. {} {}",
        values.first().copied().unwrap_or(f64::NAN),
        values.last().copied().unwrap_or(f64::NAN),
        cube.spectral_unit()
    );
    println!(
        "bunit:     {}",
        cube.header(cubemovie::cube::volume::BUNIT).unwrap_or_default()
    );
    if let Some(issue) = cube.coordinate_issue() {
        println!("wcs:       {issue}");
    }

    let range = cubemovie::resolve_range(&cube, config.bounds(), config.percentiles)?;
    println!("range:     {} .. {}", range.min, range.max);
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
