//! Host-side collaborators the engine calls but does not implement.
//!
//! The engine never touches a page, a DOM or a drawing API directly. A host
//! (browser glue, a native window, the headless CLI) implements these traits
//! and drives `Player::tick()` from its display-refresh callback.

use crate::entities::geometry::{Offset, Rect};

/// Scroll, viewport and refresh scheduling provided by the page.
pub trait Host {
    /// Current vertical scroll offset of the page.
    fn scroll_offset(&self) -> f64;

    /// Current viewport size.
    fn viewport(&self) -> Rect;

    /// Schedule one more tick on the next display refresh.
    fn request_frame(&mut self);
}

/// 2D drawing surface for image frames.
pub trait Canvas {
    /// Match the surface size to the container.
    fn resize(&mut self, size: Rect);

    /// Draw frame `frame` (from `source`) at `offset`, scaled to `size`.
    fn draw(&mut self, frame: usize, source: &str, offset: Offset, size: Rect);
}

/// Host-assigned handle of an effect target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Fixed overlay layer that hosts effect targets above the animation.
pub trait Surface {
    /// Show the overlay layer.
    fn mount(&mut self);
    /// Hide the overlay layer.
    fn unmount(&mut self);
    fn append_child(&mut self, node: NodeId);
    fn remove_child(&mut self, node: NodeId);
    fn set_opacity(&mut self, node: NodeId, opacity: f64);
}

/// Off-screen preload markers that let the page defer un-rendered content.
pub trait MarkerSink {
    fn stage(&mut self, index: usize, source: &str);
    fn clear(&mut self);
}

/// Video-like media scrubbed by `VideoScrubber`.
pub trait MediaTarget {
    /// Total duration in seconds.
    fn duration(&self) -> f64;
    fn set_current_time(&mut self, time: f64);
    /// Begin (re)loading the media resource.
    fn load(&mut self);
    /// HTML-style ready state (0..=4). Above 2 means current data is available.
    fn ready_state(&self) -> u8;
}

/// Pins the media layer to the viewport while the animation plays.
pub trait PinTarget {
    /// Fix the media layer to the viewport.
    fn pin(&mut self);
    /// Release it back into page flow, placed at `top` (scroll px).
    fn release(&mut self, top: f64);
}
