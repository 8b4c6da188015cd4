mod app;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use phosphor_core::{AudioDisplay, AudioSource, ScopeConfig, SignalSource, Waveform};
use phosphor_render::{RenderSettings, ScopeDriver, ScopeEvent, Size, SoftwareBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DisplayArg {
    /// Channel average against time
    Time,
    /// Left channel against right
    Xy,
}

impl From<DisplayArg> for AudioDisplay {
    fn from(arg: DisplayArg) -> Self {
        match arg {
            DisplayArg::Time => AudioDisplay::TimeDomain,
            DisplayArg::Xy => AudioDisplay::Xy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "phosphor", about = "GPU oscilloscope with phosphor persistence")]
struct Args {
    /// JSON config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Audio file to draw instead of the periodic generators
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// How audio is drawn
    #[arg(long, value_enum)]
    display: Option<DisplayArg>,

    /// X deflection waveform (sinusoid, sawtooth, triangle)
    #[arg(long)]
    waveform_x: Option<Waveform>,

    /// Y deflection waveform (sinusoid, sawtooth, triangle)
    #[arg(long)]
    waveform_y: Option<Waveform>,

    /// X deflection frequency in Hz
    #[arg(long)]
    freq_x: Option<f64>,

    /// Y deflection frequency in Hz
    #[arg(long)]
    freq_y: Option<f64>,

    /// Samples in the trace buffer
    #[arg(long)]
    capacity: Option<usize>,

    /// Afterimage decay rate per second
    #[arg(long)]
    decay: Option<f32>,

    #[arg(long)]
    no_graticule: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Render headlessly on the CPU and write a PNG instead of opening a window
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Ticks to run before writing the snapshot
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Seconds per snapshot tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// Snapshot width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Snapshot height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let audio = match &args.audio {
        Some(path) => Some(load_audio(path)?),
        None => None,
    };
    let source = signal_source(&config, audio.clone());

    match &args.snapshot {
        Some(path) => {
            let size = Size::new(args.width, args.height);
            run_snapshot(&config, source, size, args.frames, args.dt, path)
        }
        None => app::run(config, source, audio),
    }
}

/// Defaults or the config file, with command-line overrides applied on top.
fn build_config(args: &Args) -> anyhow::Result<ScopeConfig> {
    let mut config = match &args.config {
        Some(path) => ScopeConfig::load(path)?,
        None => ScopeConfig::default(),
    };

    if let Some(waveform) = args.waveform_x {
        config.x.waveform = waveform;
    }
    if let Some(waveform) = args.waveform_y {
        config.y.waveform = waveform;
    }
    if let Some(freq) = args.freq_x {
        config.x.frequency = freq;
    }
    if let Some(freq) = args.freq_y {
        config.y.frequency = freq;
    }
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(decay) = args.decay {
        config.decay_rate = decay;
    }
    if let Some(display) = args.display {
        config.audio_display = display.into();
    }
    if args.no_graticule {
        config.graticule = false;
    }

    config.validate().context("invalid settings")?;
    Ok(config)
}

fn load_audio(path: &Path) -> anyhow::Result<Arc<AudioSource>> {
    let decoded = phosphor_audio::load_audio_file(path)?;
    let source = decoded
        .into_source()
        .with_context(|| format!("unusable audio in {}", path.display()))?;
    Ok(Arc::new(source))
}

fn signal_source(config: &ScopeConfig, audio: Option<Arc<AudioSource>>) -> SignalSource {
    match audio {
        Some(source) => SignalSource::Audio {
            source,
            display: config.audio_display,
        },
        None => SignalSource::Periodic(config.periodic_signal()),
    }
}

/// Drive `frames` fixed-length ticks through the CPU passes and save the
/// final presented image. Audio starts on the first tick and is advanced
/// by the tick length.
fn run_snapshot(
    config: &ScopeConfig,
    source: SignalSource,
    size: Size,
    frames: u32,
    dt: f64,
    path: &Path,
) -> anyhow::Result<()> {
    anyhow::ensure!(!size.is_empty(), "snapshot size {size} has no pixels");
    anyhow::ensure!(dt.is_finite() && dt >= 0.0, "tick length must be finite and non-negative");

    let mut driver = ScopeDriver::new(config, source);
    let mut backend = SoftwareBackend::new(&RenderSettings::from(config));
    let events = driver.events();
    events.send(ScopeEvent::Resize(size));
    events.send(ScopeEvent::StartPlayback);

    for _ in 0..frames.max(1) {
        driver.tick_delta(&mut backend, dt).unwrap_or_else(|never| match never {});
    }

    backend.save_png(path)?;
    Ok(())
}
