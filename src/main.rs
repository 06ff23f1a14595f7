use scrollplay::cli::Args;
use scrollplay::config::{self, PlayerConfig};
use scrollplay::core::player::{PlaybackState, Player, TickOutcome};
use scrollplay::core::preloader::Preloader;
use scrollplay::core::workers::{default_threads, Workers};
use scrollplay::effects;
use scrollplay::entities::geometry::{Offset, Rect};
use scrollplay::entities::loader::FileLoader;
use scrollplay::host::{Canvas, Host, NodeId, Surface};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Page stand-in: scroll is set by the replay loop, refresh requests are latched.
struct ReplayHost {
    scroll: f64,
    viewport: Rect,
    requested: bool,
}

impl ReplayHost {
    fn new(viewport: Rect) -> Self {
        Self { scroll: 0.0, viewport, requested: false }
    }

    /// Consume the pending refresh request, if any.
    fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

impl Host for ReplayHost {
    fn scroll_offset(&self) -> f64 {
        self.scroll
    }
    fn viewport(&self) -> Rect {
        self.viewport
    }
    fn request_frame(&mut self) {
        self.requested = true;
    }
}

/// Canvas that only logs what would be drawn.
struct LogCanvas;

impl Canvas for LogCanvas {
    fn resize(&mut self, size: Rect) {
        debug!("Canvas resized to {}x{}", size.x, size.y);
    }
    fn draw(&mut self, frame: usize, source: &str, offset: Offset, size: Rect) {
        debug!(
            "Draw {} ({}) at ({:.1}, {:.1}) size {:.1}x{:.1}",
            frame, source, offset.x, offset.y, size.x, size.y
        );
    }
}

/// Overlay surface that logs effect targets by their config name.
struct LogSurface {
    names: Vec<String>,
}

impl LogSurface {
    fn name(&self, node: NodeId) -> &str {
        self.names.get(node.0 as usize).map_or("?", String::as_str)
    }
}

impl Surface for LogSurface {
    fn mount(&mut self) {
        info!("Overlay mounted");
    }
    fn unmount(&mut self) {
        info!("Overlay unmounted");
    }
    fn append_child(&mut self, node: NodeId) {
        info!("Show {}", self.name(node));
    }
    fn remove_child(&mut self, node: NodeId) {
        info!("Hide {}", self.name(node));
    }
    fn set_opacity(&mut self, node: NodeId, opacity: f64) {
        debug!("{} opacity {:.3}", self.name(node), opacity);
    }
}

fn init_logging(args: &Args) -> Result<()> {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| PathBuf::from("scrollplay.log"));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(args: &Args) -> Result<PlayerConfig> {
    let mut config = match &args.config {
        Some(path) => config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PlayerConfig::default(),
    };
    if let Some(span) = args.scroll_span {
        config.scroll_span = span;
    }
    if let Some(viewport) = args.viewport {
        config.viewport = viewport;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    config.validate().context("Invalid player settings")?;
    Ok(config)
}

fn collect_sources(pattern: &str) -> Result<Vec<String>> {
    let mut sources: Vec<String> = glob::glob(pattern)
        .with_context(|| format!("Invalid glob pattern '{}'", pattern))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect();
    sources.sort();
    if sources.is_empty() {
        bail!("No images match '{}'", pattern);
    }
    Ok(sources)
}

fn print_state(state: &PlaybackState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(state).context("Failed to serialize state")?);
    } else {
        println!(
            "scroll {:>8.1}  frame {:>4}/{}  {}",
            state.scroll,
            state.frame,
            state.total_frames.saturating_sub(1),
            if state.in_viewport { "in view" } else { "out of view" }
        );
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let sources = collect_sources(&args.pattern)?;

    // Loader pool (75% of CPU cores unless configured)
    let threads = config.workers.unwrap_or_else(default_threads);
    let workers = Arc::new(Workers::new(threads).context("Failed to start loader workers")?);

    let mut preloader = Preloader::new(sources);
    preloader.on_progress(|p| info!("Loaded {}% ({} failed of {})", p.percent(), p.failed, p.total));
    preloader.start(&FileLoader::new(Arc::clone(&workers)));
    let frames = preloader
        .wait(Duration::from_secs(args.timeout))
        .context("Failed to preload frames")?;
    if frames.failed_count() > 0 {
        warn!("{} of {} frames failed to load and will be skipped", frames.failed_count(), frames.len());
    }

    let mut host = ReplayHost::new(config.viewport);
    let names: Vec<String> = config.ranges.keys().cloned().collect();
    let mut player = Player::new(frames, config.scroll_span, Box::new(LogCanvas), &host)
        .context("Failed to create player")?
        .with_surface(Box::new(LogSurface { names: names.clone() }));

    let overlay = player.overlay().clone();
    effects::register_named(player.ranges_mut(), &overlay, &config.ranges, |name| {
        names.iter().position(|n| n == name).map(|i| NodeId(i as u64))
    })
    .context("Failed to register effects")?;

    player.start(&mut host)?;
    for offset in args.offsets(config.scroll_span) {
        if !host.take_request() {
            break;
        }
        host.scroll = offset;
        match player.tick(&mut host)? {
            TickOutcome::Advanced(state) => print_state(&state, args.json)?,
            TickOutcome::Idle => debug!("Scroll {} unchanged", offset),
            TickOutcome::Halted => break,
        }
    }

    player.stop();
    if host.take_request() {
        player.tick(&mut host)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    info!("scrollplay starting...");
    debug!("Command-line args: {:?}", args);

    run(&args)
}
