//! p4k - Main entry point
//!
//! Command-line video player: starts mpv, applies a quality preset and
//! optional anime overlay, loads the source and runs the event loop until the
//! engine shuts down or a termination signal arrives.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use p4k_common::config::{self, LoggingConfig, PlayerPaths};
use p4k_common::events::PlayerEvent;
use p4k_player::player::{LoopExit, PlayerOptions, StopFlag};
use p4k_player::{presets, Player};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for p4k
#[derive(Parser, Debug)]
#[command(name = "p4k")]
#[command(about = "Video player with GPU shader upscaling presets")]
#[command(version)]
struct Args {
    /// Quality mode: low, medium, high (unknown values select medium)
    #[arg(long)]
    mode: Option<String>,

    /// Enable the Anime4K shader overlay
    #[arg(long)]
    anime: bool,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// External subtitle file or URL
    #[arg(long)]
    sub: Option<String>,

    /// List quality modes and key bindings, then exit
    #[arg(long)]
    list_modes: bool,

    /// Start in fullscreen
    #[arg(long)]
    fs: bool,

    /// Initial volume
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=150))]
    volume: Option<i64>,

    /// Start position in seconds
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Configuration file (default: platform config directory)
    #[arg(long, env = "P4K_CONFIG")]
    config: Option<PathBuf>,

    /// Shader directory
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// mpv executable
    #[arg(long)]
    mpv: Option<PathBuf>,

    /// Video file or URL
    source: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = config::load_config_or_default(args.config.as_deref());
    init_tracing(&loaded.config.logging)?;
    if let Some(reason) = &loaded.ignored {
        warn!("{}; using defaults", reason);
    }
    if let Some(path) = &loaded.path {
        info!("Configuration: {}", path.display());
    }
    let toml_config = loaded.config;

    if args.list_modes {
        print_banner();
        print_modes();
        print_controls();
        return Ok(());
    }

    let Some(source) = args.source.clone() else {
        print_banner();
        print_usage();
        return Ok(());
    };

    let paths = PlayerPaths::resolve(args.shader_dir.as_deref(), args.mpv.as_deref(), &toml_config);
    info!("Shader directory: {}", paths.shader_dir.display());
    info!("mpv binary: {}", paths.mpv_binary.display());

    let player = Arc::new(start_player(&paths).context("Failed to initialize player")?);
    load_optional_resources(&player);

    let mode = args
        .mode
        .clone()
        .or_else(|| toml_config.default_mode.clone())
        .unwrap_or_else(|| presets::recommended().id().to_string());
    player.apply_preset_id(&mode);

    if args.anime || toml_config.anime {
        player.set_anime_overlay(true);
    }

    let volume = args.volume.or(toml_config.volume).unwrap_or(100);
    if volume != 100 {
        player.set_volume(volume);
    }

    let title = args.title.clone().unwrap_or_else(|| default_title(&source));
    player.set_title(&title);

    if args.fs {
        player.set_fullscreen(true);
    }

    let monitor = tokio::spawn(log_events(player.subscribe()));

    player
        .load_source(&source)
        .with_context(|| format!("Failed to load {}", source))?;

    if let Some(sub) = args.sub.as_deref() {
        if let Err(e) = player.load_external_subtitle(sub) {
            println!("[p4k] Warning: could not load subtitle: {}", e);
        }
    }

    if args.start > 0.0 {
        player.seek_absolute(args.start);
    }

    let stop = StopFlag::new();
    let loop_player = Arc::clone(&player);
    let loop_stop = stop.clone();
    let mut event_loop = tokio::task::spawn_blocking(move || loop_player.run(&loop_stop));

    tokio::select! {
        exit = &mut event_loop => {
            match exit {
                Ok(LoopExit::Shutdown) => info!("Player closed"),
                Ok(LoopExit::Stopped) => info!("Event loop stopped"),
                Err(e) => warn!("Event loop task failed: {}", e),
            }
        }
        _ = shutdown_signal() => {
            stop.request_stop();
            player.terminate();
            if let Err(e) = event_loop.await {
                warn!("Event loop task failed: {}", e);
            }
        }
    }

    player.terminate();
    monitor.abort();
    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let default_filter = format!("p4k={level},p4k_player={level}", level = logging.level);

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
    Ok(())
}

#[cfg(unix)]
fn start_player(paths: &PlayerPaths) -> Result<Player> {
    use p4k_player::engine::mpv_ipc::MpvOptions;

    let mpv = MpvOptions {
        binary: paths.mpv_binary.clone(),
        ..MpvOptions::default()
    };
    let player = Player::spawn_mpv(mpv, PlayerOptions::with_shader_dir(&paths.shader_dir))?;
    Ok(player)
}

#[cfg(not(unix))]
fn start_player(_paths: &PlayerPaths) -> Result<Player> {
    anyhow::bail!("no playback engine backend available on this platform")
}

/// Key bindings and on-screen controller, when shipped alongside
fn load_optional_resources(player: &Player) {
    if let Some(path) = config::find_optional_resource(Path::new("input.conf")) {
        info!("Key bindings: {}", path.display());
        player.load_input_config(&path);
    }

    if let Some(path) = config::find_optional_resource(&Path::new("scripts").join("osc.lua")) {
        match player.load_script(&path) {
            Ok(()) => info!("On-screen controller: {}", path.display()),
            Err(e) => warn!("On-screen controller not loaded: {}", e),
        }
    }
}

fn default_title(source: &str) -> String {
    let name = Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    format!("▶ {} - p4k", name)
}

async fn log_events(mut rx: tokio::sync::broadcast::Receiver<PlayerEvent>) {
    loop {
        match rx.recv().await {
            Ok(PlayerEvent::TimeUpdate { .. }) => {}
            Ok(PlayerEvent::PerformanceAdvisory { message, .. }) => {
                println!("[p4k] {}", message);
            }
            Ok(event) => match event.to_json() {
                Ok(json) => debug!("Event: {}", json),
                Err(e) => debug!("Event {} not serializable: {}", event.event_type(), e),
            },
            Err(RecvError::Lagged(skipped)) => debug!("Event monitor skipped {} events", skipped),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

fn print_banner() {
    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         p 4 k                             ║
║           🎬 Video player with GPU upscaling              ║
╚═══════════════════════════════════════════════════════════╝"#
    );
}

fn print_modes() {
    println!("\n🎬 Available quality modes:");
    println!("─────────────────────────────────────");
    for mode in presets::list_all() {
        println!("\n  {} {} ({})", mode.icon, mode.display_name, mode.id);
        println!("     📝 {}", mode.description);
        println!("     🎮 GPU: {}", mode.minimum_gpu);
    }
    println!("\n─────────────────────────────────────");
}

fn print_usage() {
    println!(
        r#"
📖 USAGE: p4k [options] <video file or URL>

🎛️  OPTIONS:
   --mode low|medium|high   Quality mode (default: medium)
   --anime                  Enable Anime4K shaders
   --title "Title"          Custom window title
   --sub <path or URL>      Load external subtitle
   --fs                     Start in fullscreen
   --volume 0-150           Initial volume
   --start SECONDS          Start position
   --list-modes             Show available modes
   --config FILE            Configuration file
   --shader-dir DIR         Shader directory
   --mpv PATH               mpv executable"#
    );
}

fn print_controls() {
    println!(
        r#"
⌨️  KEY BINDINGS:
   SPACE         Play/Pause
   ← →           Seek -5s/+5s
   ↑ ↓           Volume +/-
   I             Skip intro (85s)
   F             Fullscreen
   S             Screenshot
   M             Mute
   V             Show/hide subtitles
   J             Next subtitle
   A             Next audio track
   [ ]           Speed -/+
   Q             Quit"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title_uses_file_name() {
        assert_eq!(default_title("/videos/ep01.mkv"), "▶ ep01.mkv - p4k");
        assert_eq!(default_title("ep02.mkv"), "▶ ep02.mkv - p4k");
    }

    #[test]
    fn test_args_volume_range() {
        assert!(Args::try_parse_from(["p4k", "--volume", "150", "a.mkv"]).is_ok());
        assert!(Args::try_parse_from(["p4k", "--volume", "151", "a.mkv"]).is_err());
    }

    #[test]
    fn test_args_source_optional() {
        let args = Args::try_parse_from(["p4k", "--list-modes"]).unwrap();
        assert!(args.list_modes);
        assert!(args.source.is_none());
    }
}
