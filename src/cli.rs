use clap::Parser;
use std::path::PathBuf;

use crate::entities::geometry::Rect;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (header-only)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Scroll-driven image sequence player (headless replay)
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Glob pattern of the frame images, e.g. "frames/*.jpg" (sorted by name)
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Scroll pixels mapped to the whole sequence (overrides config)
    #[arg(short = 's', long = "span", value_name = "PX")]
    pub scroll_span: Option<f64>,

    /// Scroll offsets to replay, comma-separated
    #[arg(long = "scroll", value_name = "PX,..", value_delimiter = ',', conflicts_with = "steps")]
    pub scroll: Vec<f64>,

    /// Replay N evenly spaced offsets across the span (default when --scroll is absent)
    #[arg(short = 'n', long = "steps", value_name = "N")]
    pub steps: Option<usize>,

    /// Viewport size (overrides config)
    #[arg(long = "viewport", value_name = "WxH", value_parser = parse_viewport)]
    pub viewport: Option<Rect>,

    /// Load player config (span, viewport, effect ranges) from JSON
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Loader threads (default: 3/4 of the cores)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Seconds to wait for a single image header before giving up
    #[arg(long = "timeout", value_name = "SEC", default_value = "10")]
    pub timeout: u64,

    /// Print each committed state as a JSON line
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Enable debug logging to file (default: scrollplay.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// Default replay step count.
pub const DEFAULT_STEPS: usize = 10;

impl Args {
    /// Offsets to replay: explicit `--scroll` values, or `steps` even stops over `[0, span]`.
    pub fn offsets(&self, scroll_span: f64) -> Vec<f64> {
        if !self.scroll.is_empty() {
            return self.scroll.clone();
        }
        let steps = self.steps.unwrap_or(DEFAULT_STEPS).max(1);
        if steps == 1 {
            return vec![0.0];
        }
        (0..steps)
            .map(|i| scroll_span * i as f64 / (steps - 1) as f64)
            .collect()
    }
}

fn parse_viewport(s: &str) -> Result<Rect, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w: f64 = w.trim().parse().map_err(|_| format!("bad width '{}'", w))?;
    let h: f64 = h.trim().parse().map_err(|_| format!("bad height '{}'", h))?;
    if !(w > 0.0 && h > 0.0) {
        return Err(format!("viewport must be positive, got {}x{}", w, h));
    }
    Ok(Rect::new(w, h))
}
