use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vjmix::{Catalog, LiveSession, ManualClock, MixerState, RawDirSink, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "vjmix", version, about = "Live audio-visual mixer, headless tools")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one composited frame of a state snapshot as a PNG.
    Frame(FrameArgs),
    /// Run a simulated live session and record it into a raw capture directory.
    Capture(CaptureArgs),
    /// Merge WAV files into one crossfaded WAV.
    Megamix(MegamixArgs),
}

#[derive(Parser, Debug)]
struct SessionArgs {
    /// Mixer state snapshot (JSON). The stock state is used when omitted.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Session config (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root for relative media paths; defaults to the state file's directory.
    #[arg(long)]
    media_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Play for this many seconds before rendering.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Output directory (frames.rgba, audio.f32le, meta.json).
    #[arg(long)]
    out: PathBuf,

    /// Upper bound on recorded seconds.
    #[arg(long, default_value_t = 10.0)]
    secs: f64,

    /// Keep recording past the active media's end.
    #[arg(long, default_value_t = false)]
    no_auto_stop: bool,
}

#[derive(Parser, Debug)]
struct MegamixArgs {
    /// Input WAV files, in play order.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Output WAV path.
    #[arg(long)]
    out: PathBuf,

    /// Crossfade between consecutive tracks, in seconds.
    #[arg(long, default_value_t = 5.0)]
    crossfade: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Capture(args) => cmd_capture(args),
        Command::Megamix(args) => cmd_megamix(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_session(args: &SessionArgs) -> anyhow::Result<(LiveSession, ManualClock)> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(root) = &args.media_root {
        config.media_root = root.clone();
    } else if let Some(dir) = args.state.as_deref().and_then(Path::parent) {
        config.media_root = dir.to_path_buf();
    }

    let catalog = Arc::new(Catalog::new(config.media_root.clone()));
    let clock = ManualClock::new(0.0);
    let mut session = LiveSession::new(config, catalog, Box::new(clock.clone()))?;

    if let Some(path) = &args.state {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read state '{}'", path.display()))?;
        let state: MixerState = serde_json::from_str(&text)
            .with_context(|| format!("parse state '{}'", path.display()))?;
        session.load_state(state);
    }
    Ok((session, clock))
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut session, clock) = open_session(&args.session)?;
    let dt = session.config().frame_rate()?.frame_duration_secs();

    let frame = if args.at > 0.0 {
        session.play()?;
        let mut last = None;
        let mut t = 0.0;
        while t < args.at {
            clock.advance(dt * 1000.0);
            last = Some(session.step(dt)?.frame);
            t += dt;
        }
        match last {
            Some(f) => f,
            None => session.render_frame()?,
        }
    } else {
        session.render_frame()?
    };

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.secs.is_finite() && args.secs > 0.0,
        "--secs must be a positive number"
    );
    let (mut session, clock) = open_session(&args.session)?;
    let cfg = session.default_capture_config()?;
    let dt = cfg.fps.frame_duration_secs();

    session
        .start_capture(Box::new(RawDirSink::new(&args.out)), cfg, !args.no_auto_stop)
        .context("start capture")?;

    let mut summary = None;
    let mut t = 0.0;
    while t < args.secs {
        clock.advance(dt * 1000.0);
        if let Some(done) = session.step(dt)?.capture_finished {
            summary = Some(done);
            break;
        }
        t += dt;
    }
    let summary = match summary {
        Some(s) => s,
        None => session.stop_capture()?,
    };

    eprintln!(
        "wrote {} ({} frames, {:.2}s, suggested bitrate {} bps)",
        args.out.display(),
        summary.frames,
        summary.duration_secs(),
        summary.suggested_bitrate
    );
    Ok(())
}

fn cmd_megamix(args: MegamixArgs) -> anyhow::Result<()> {
    let mut tracks = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let pcm = vjmix::media::pcm::load_wav(path)
            .with_context(|| format!("read wav '{}'", path.display()))?;
        tracks.push(pcm);
    }

    ensure_parent_dir(&args.out)?;
    let secs = vjmix::audio::megamix::write_megamix(&args.out, &tracks, args.crossfade)
        .with_context(|| format!("write megamix '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}, {secs:.2}s)",
        args.out.display(),
        vjmix::audio::megamix::megamix_name(tracks.len())
    );
    Ok(())
}
