//! Rainy - looping rain sound with play/pause and volume control.
//!
//! Reads control commands from stdin in place of the window's toggle button and volume
//! slider.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rainy::config::Config;
use rainy::control::{self, Exit};
use rainy::resource::resource_path;
use rainy::{AudioSubsystem, FadeCurve, PlaybackController, PlaybackSettings};

/// Command-line arguments for rainy
#[derive(Parser, Debug)]
#[command(name = "rainy")]
#[command(about = "Looping rain sound with play/pause and volume control")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "RAINY_CONFIG")]
    config: Option<PathBuf>,

    /// Sound to loop, relative to the install base unless absolute
    #[arg(short, long, env = "RAINY_ASSET")]
    asset: Option<PathBuf>,

    /// Starting volume, 0 to 100
    #[arg(long, env = "RAINY_VOLUME", value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// Fade-in/fade-out length in milliseconds
    #[arg(long, env = "RAINY_FADE_MS")]
    fade_ms: Option<u64>,

    /// Fade curve: linear, s-curve or equal-power
    #[arg(long, env = "RAINY_FADE_CURVE")]
    fade_curve: Option<FadeCurve>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rainy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(asset) = args.asset {
        config.playback.asset = asset;
    }
    if let Some(volume) = args.volume {
        config.playback.volume = control::slider_to_volume(volume);
    }
    if let Some(fade_ms) = args.fade_ms {
        config.playback.fade_ms = fade_ms;
    }
    if let Some(fade_curve) = args.fade_curve {
        config.playback.fade_curve = fade_curve;
    }

    let asset = resource_path(&config.playback.asset);
    let settings = config.playback.settings();
    info!(asset = %asset.display(), fade_ms = config.playback.fade_ms, "starting rainy");

    let subsystem = match AudioSubsystem::init() {
        Ok(subsystem) => Some(subsystem),
        Err(e) => {
            warn!("audio output unavailable, continuing silently: {}", e);
            None
        }
    };
    let mut controller = open_controller(subsystem.as_ref(), settings);

    // Failure is logged by the controller and leaves it stopped
    let _ = controller.load(&asset);

    let stdin = io::stdin();
    let exit = control::run(stdin.lock(), io::stdout(), &mut controller)
        .context("Failed to run control loop")?;
    if exit == Exit::InputClosed {
        info!("stdin closed, playing until interrupted");
        wait_for_interrupt()?;
    }

    drop(controller);
    if let Some(subsystem) = subsystem {
        subsystem.shutdown();
    }
    info!("shutdown complete");
    Ok(())
}

fn open_controller(
    subsystem: Option<&AudioSubsystem>,
    settings: PlaybackSettings,
) -> PlaybackController {
    match subsystem.map(|subsystem| PlaybackController::open(subsystem, settings)) {
        Some(Ok(controller)) => controller,
        Some(Err(e)) => {
            warn!("cannot open playback channel, continuing silently: {}", e);
            PlaybackController::silent(settings)
        }
        None => PlaybackController::silent(settings),
    }
}

/// Block until Ctrl-C so the sound keeps playing without a terminal attached.
fn wait_for_interrupt() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;
    runtime
        .block_on(tokio::signal::ctrl_c())
        .context("Failed to install Ctrl+C handler")?;
    info!("Received Ctrl+C, shutting down");
    Ok(())
}
