//! Error taxonomy for the scrubbing engine.
//!
//! Configuration errors are fatal to the playback instance that raised them.
//! Usage errors (cell access after teardown, runaway re-entrancy) are programmer
//! errors and are logged where they are detected. Per-image load failures are
//! NOT errors: they travel as `LoadOutcome::Failed` so the preload can complete.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("frame sequence is empty")]
    EmptyFrameSet,

    #[error("none of the {0} frames loaded")]
    NoLoadedFrames(usize),

    #[error("scroll span must be positive and finite, got {0}")]
    InvalidScrollSpan(f64),

    #[error("range [{start}, {end}] is zero-width or inverted")]
    InvalidRange { start: f64, end: f64 },

    #[error("frame {frame} is outside 0..{total}")]
    UnknownFrame { frame: usize, total: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("reactive cell used after unsubscribe")]
    CellReleased,

    #[error("reactive cell re-entered {0} levels deep (update cycle?)")]
    ReentrancyLimit(usize),

    #[error("no preload completion within {0:?}")]
    PreloadTimeout(Duration),

    #[error("preload channel disconnected with {pending} items pending")]
    PreloadDisconnected { pending: usize },

    #[error("media is not ready")]
    MediaNotReady,

    #[error("media has invalid duration {0}")]
    InvalidMedia(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
