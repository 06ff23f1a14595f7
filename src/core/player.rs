//! Scroll-driven image sequence player.
//!
//! **Architecture**: Player owns the canonical reactive state and borrows
//! nothing from the host between calls. The host drives it:
//! - `start(host)` once frames are preloaded
//! - `tick(host)` from every display-refresh callback it requested
//! - `resize(rect)` from its resize handler
//!
//! **Used by**: CLI (headless host), browser/native glue
//!
//! # Reactive Wiring
//!
//! - `container` cell (written by `resize`): resizes the canvas and redraws
//!   the current frame, frame index unchanged
//! - `frame` cell (written by `tick`): redraws when the frame index changes,
//!   so scrolling within one frame never redraws
//! - `state` cell (written by `tick`): notifies `on_state` listeners when the
//!   snapshot changes
//!
//! # Tick Order
//!
//! sample scroll → map to frame → write frame (draw) → write state (notify)
//! → sync overlay → dispatch ranges → request next tick.
//!
//! # Viewport Membership
//!
//! `in_viewport = scroll_span - scroll + intrinsic_height(frame) > 0`. While
//! in the viewport the overlay is mounted; leaving it unmounts the overlay.

use log::{debug, info, trace, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use super::cell::ReactiveCell;
use super::listeners::{ListenerId, Listeners};
use super::mapper::{frame_for_scroll, scroll_for_frame};
use super::ranges::{Position, RangeDispatcher, RangeId, RangeSpec};
use super::scheduler::{Scheduler, SchedulerState, Tick};
use crate::effects;
use crate::entities::frame_set::FrameSet;
use crate::entities::geometry::{center, fit, Rect};
use crate::entities::overlay::Overlay;
use crate::error::{Error, Result};
use crate::host::{Canvas, Host, NodeId, Surface};

/// Canonical playback snapshot, recomputed on every effective scroll change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub frame: usize,
    pub scroll: f64,
    pub scroll_span: f64,
    pub total_frames: usize,
    pub in_viewport: bool,
}

/// Result of one `tick()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Loop stopped, no further tick requested
    Halted,
    /// Scroll unchanged, next tick requested
    Idle,
    /// New state committed, next tick requested
    Advanced(PlaybackState),
}

/// Draws frames into the canvas using the current container size.
struct Renderer {
    canvas: Box<dyn Canvas>,
    frames: Rc<FrameSet>,
    container: Rect,
}

impl Renderer {
    fn draw(&mut self, frame: usize) {
        let (Some(rect), Some(source)) = (self.frames.rect(frame), self.frames.source(frame)) else {
            warn!("Frame {} has no loaded image, skipping draw", frame);
            return;
        };
        let size = fit(self.container, rect);
        let offset = center(self.container, size);
        trace!(
            "Draw frame {} at ({:.1}, {:.1}) size {:.1}x{:.1}",
            frame, offset.x, offset.y, size.x, size.y
        );
        self.canvas.draw(frame, source, offset, size);
    }

    fn resize(&mut self, container: Rect) {
        self.container = container;
        self.canvas.resize(container);
    }
}

pub struct Player {
    frames: Rc<FrameSet>,
    scroll_span: f64,
    /// Host scroll offset at construction; playback scroll is relative to it
    origin: f64,
    renderer: Rc<RefCell<Renderer>>,
    frame: ReactiveCell<usize>,
    container: ReactiveCell<Rect>,
    state: ReactiveCell<PlaybackState>,
    state_listeners: Listeners<PlaybackState>,
    scheduler: Scheduler,
    ranges: RangeDispatcher,
    overlay: Overlay,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("total_frames", &self.frames.len())
            .field("scroll_span", &self.scroll_span)
            .field("origin", &self.origin)
            .field("state", &self.state)
            .field("scheduler", &self.scheduler.state())
            .field("ranges", &self.ranges)
            .finish()
    }
}

impl Player {
    /// Build a player over preloaded `frames`.
    ///
    /// Reads the initial viewport and the scroll origin from `host`.
    pub fn new(frames: FrameSet, scroll_span: f64, mut canvas: Box<dyn Canvas>, host: &dyn Host) -> Result<Self> {
        if frames.is_empty() {
            return Err(Error::EmptyFrameSet);
        }
        if frames.failed_count() == frames.len() {
            return Err(Error::NoLoadedFrames(frames.len()));
        }
        if !(scroll_span.is_finite() && scroll_span > 0.0) {
            return Err(Error::InvalidScrollSpan(scroll_span));
        }

        let viewport = host.viewport();
        let origin = host.scroll_offset();
        let frames = Rc::new(frames);
        let total_frames = frames.len();

        canvas.resize(viewport);
        let renderer = Rc::new(RefCell::new(Renderer {
            canvas,
            frames: Rc::clone(&frames),
            container: viewport,
        }));

        let frame = {
            let renderer = Rc::clone(&renderer);
            ReactiveCell::new(0usize, move |frame: &usize| renderer.borrow_mut().draw(*frame))
        };

        let container = {
            let renderer = Rc::clone(&renderer);
            let frame = frame.clone();
            ReactiveCell::new(viewport, move |rect: &Rect| {
                debug!("Container resized to {}x{}", rect.x, rect.y);
                renderer.borrow_mut().resize(*rect);
                if let Ok(current) = frame.read() {
                    renderer.borrow_mut().draw(current);
                }
            })
        };

        let state_listeners = Listeners::new();
        let state = {
            let listeners = state_listeners.clone();
            ReactiveCell::new(
                PlaybackState {
                    frame: 0,
                    scroll: 0.0,
                    scroll_span,
                    total_frames,
                    in_viewport: false,
                },
                move |s: &PlaybackState| listeners.emit(s),
            )
        };

        info!(
            "Player created: {} frames over {}px scroll (origin {}, viewport {}x{})",
            total_frames, scroll_span, origin, viewport.x, viewport.y
        );

        Ok(Self {
            frames,
            scroll_span,
            origin,
            renderer,
            frame,
            container,
            state,
            state_listeners,
            scheduler: Scheduler::new(),
            ranges: RangeDispatcher::new(),
            overlay: Overlay::detached(),
        })
    }

    /// Host the overlay (effect targets) on `surface`.
    pub fn with_surface(self, surface: Box<dyn Surface>) -> Self {
        self.set_surface(surface);
        self
    }

    /// Move the overlay to `surface`; fades registered earlier follow it.
    pub fn set_surface(&self, surface: Box<dyn Surface>) {
        self.overlay.set_surface(surface);
    }

    // === Lifecycle ===

    /// Arm the loop and redraw the current frame immediately.
    pub fn start(&mut self, host: &mut dyn Host) -> Result<()> {
        self.redraw()?;
        if self.scheduler.arm() {
            info!("Player started");
            host.request_frame();
        }
        Ok(())
    }

    /// Stop after the next tick. That tick does no work.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.state() == SchedulerState::Running
    }

    /// One display-refresh step.
    pub fn tick(&mut self, host: &mut dyn Host) -> Result<TickOutcome> {
        let scroll = (host.scroll_offset() - self.origin).abs();
        let outcome = match self.scheduler.begin_tick(scroll) {
            Tick::Halt => {
                info!("Player stopped");
                return Ok(TickOutcome::Halted);
            }
            Tick::Unchanged => TickOutcome::Idle,
            Tick::Advance(scroll) => TickOutcome::Advanced(self.advance(scroll)?),
        };
        host.request_frame();
        Ok(outcome)
    }

    fn advance(&mut self, scroll: f64) -> Result<PlaybackState> {
        let total_frames = self.frames.len();
        let frame = frame_for_scroll(scroll, total_frames, self.scroll_span);
        self.frame.set(frame)?;

        let asset_height = self.frames.rect(frame).map_or(0.0, |r| r.y);
        let state = PlaybackState {
            frame,
            scroll,
            scroll_span: self.scroll_span,
            total_frames,
            in_viewport: self.scroll_span - scroll + asset_height > 0.0,
        };
        self.state.set(state)?;

        if state.in_viewport {
            self.overlay.mount();
        } else {
            self.overlay.unmount();
        }

        self.ranges.dispatch(&Position::scroll(scroll).with_frame(frame as f64));
        Ok(state)
    }

    /// Container size changed. Refits the current frame without moving it.
    pub fn resize(&mut self, container: Rect) -> Result<bool> {
        self.container.set(container)
    }

    /// Draw the current frame again.
    pub fn redraw(&self) -> Result<()> {
        let frame = self.frame.read()?;
        self.renderer.borrow_mut().draw(frame);
        Ok(())
    }

    /// Release reactive state and the overlay. Later use reports `CellReleased`.
    pub fn teardown(&mut self) {
        self.scheduler.stop();
        self.frame.unsubscribe();
        self.container.unsubscribe();
        self.state.unsubscribe();
        self.state_listeners.clear();
        self.overlay.clear();
        info!("Player torn down");
    }

    // === State ===

    pub fn state(&self) -> Result<PlaybackState> {
        self.state.read()
    }

    pub fn current_frame(&self) -> Result<usize> {
        self.frame.read()
    }

    pub fn container(&self) -> Result<Rect> {
        self.container.read()
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn scroll_span(&self) -> f64 {
        self.scroll_span
    }

    /// Host scroll offset at which `frame` first shows.
    pub fn scroll_offset_for(&self, frame: usize) -> Result<f64> {
        let total = self.frames.len();
        scroll_for_frame(frame, total, self.scroll_span)
            .map(|scroll| self.origin + scroll)
            .ok_or(Error::UnknownFrame { frame, total })
    }

    pub fn on_state<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&PlaybackState) + 'static,
    {
        self.state_listeners.add(callback)
    }

    pub fn remove_state_listener(&self, id: ListenerId) -> bool {
        self.state_listeners.remove(id)
    }

    // === Ranges & effects ===

    pub fn ranges_mut(&mut self) -> &mut RangeDispatcher {
        &mut self.ranges
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Fade `node` on this player's overlay across `spec`.
    pub fn register_fade(&mut self, node: NodeId, spec: RangeSpec) -> Result<RangeId> {
        effects::register_fade(&mut self.ranges, &self.overlay, node, spec)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::entities::geometry::Offset;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Draw {
        pub frame: usize,
        pub offset: Offset,
        pub size: Rect,
    }

    #[derive(Clone, Default)]
    pub struct RecordingCanvas {
        pub draws: Rc<RefCell<Vec<Draw>>>,
        pub sizes: Rc<RefCell<Vec<Rect>>>,
    }

    impl RecordingCanvas {
        pub fn frames(&self) -> Vec<usize> {
            self.draws.borrow().iter().map(|d| d.frame).collect()
        }
    }

    impl Canvas for RecordingCanvas {
        fn resize(&mut self, size: Rect) {
            self.sizes.borrow_mut().push(size);
        }
        fn draw(&mut self, frame: usize, _source: &str, offset: Offset, size: Rect) {
            self.draws.borrow_mut().push(Draw { frame, offset, size });
        }
    }

    pub struct TestHost {
        pub scroll: f64,
        pub viewport: Rect,
        pub requests: usize,
    }

    impl TestHost {
        pub fn new(viewport: Rect) -> Self {
            Self { scroll: 0.0, viewport, requests: 0 }
        }
    }

    impl Host for TestHost {
        fn scroll_offset(&self) -> f64 {
            self.scroll
        }
        fn viewport(&self) -> Rect {
            self.viewport
        }
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }
}
