//! Entities module - plain data and host-facing adapters
//!
//! - `geometry`: fit and center math on `Rect`
//! - `frame_set`: preloaded sequence with per-frame outcomes
//! - `loader`: image header reads on the worker pool
//! - `overlay`: per-player effect layer

pub mod frame_set;
pub mod geometry;
pub mod loader;
pub mod overlay;

pub use frame_set::{FrameSet, LoadOutcome};
pub use geometry::{Offset, Rect};
pub use loader::FileLoader;
pub use overlay::Overlay;
