//! Core engine modules - reactive state, mapping, ranges, scheduling, loading
//!
//! These modules form the playback engine, independent of any page or window.

pub mod cell;
pub mod listeners;
pub mod mapper;
pub mod player;
pub mod preloader;
pub mod ranges;
pub mod scheduler;
pub mod workers;

// Re-exports for convenience
pub use cell::ReactiveCell;
pub use listeners::{ListenerId, Listeners};
pub use player::Player;
pub use preloader::Preloader;
pub use scheduler::Scheduler;
pub use workers::Workers;
