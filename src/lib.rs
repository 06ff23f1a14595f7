//! SCROLLPLAY - Scroll-driven image sequence and video scrubbing engine
//!
//! Re-exports all modules for use by binary targets and host glue.

// Core engine (cell, mapper, ranges, scheduler, preloader, player)
pub mod core;

// Engine modules
pub mod cli;
pub mod config;
pub mod effects;
pub mod entities;
pub mod error;
pub mod host;
pub mod video;

// Re-export commonly used types from core
pub use core::cell::{ReactiveCell, Update};
pub use core::player::{PlaybackState, Player, TickOutcome};
pub use core::preloader::{ImageLoader, LoadProgress, Preloader};
pub use core::ranges::{Axis, RangeDispatcher, RangeSpec};

// Re-export entities
pub use entities::{FrameSet, LoadOutcome, Offset, Overlay, Rect};
pub use error::{Error, Result};
pub use video::VideoScrubber;
