//! Scroll-driven video scrubbing.
//!
//! **Why**: Same scroll-to-playback model as `Player`, but the frames come
//! from a seekable media element instead of a preloaded image sequence.
//!
//! **Used by**: browser/native glue owning a video element
//!
//! # Time Mapping
//!
//! The scrubbed area is `scroll_length = 2 * viewport.y + scroll_span`. The
//! last viewport-height of it is the release zone, so
//! `time = scrolled * duration / (scroll_length - viewport.y)`.
//!
//! # Pinning
//!
//! While `0 <= time < duration` the media layer is pinned to the viewport
//! and the overlay is mounted. Reaching `duration` releases the pin at the
//! current scroll position and unmounts the overlay. Both sides are
//! idempotent, so the host sees one call per transition.
//!
//! # Readiness
//!
//! Ready once `ready_state() > 2`, or once both `LoadedMetadata` and
//! `LoadedData` were reported through `on_media_event()`. A tick before that
//! returns `Error::MediaNotReady`, leaves the scheduler untouched and
//! requests another tick while the loop is armed, so a refresh-driven host
//! keeps polling until the media is ready.

use log::{debug, info, trace};

use crate::core::ranges::{Position, RangeDispatcher, RangeId, RangeSpec};
use crate::core::scheduler::{Scheduler, SchedulerState, Tick};
use crate::effects;
use crate::entities::geometry::{cover_width, Rect};
use crate::entities::overlay::Overlay;
use crate::error::{Error, Result};
use crate::host::{Host, MediaTarget, NodeId, PinTarget, Surface};

/// HTML `HAVE_CURRENT_DATA`; states above it can render the current time.
const READY_STATE_CURRENT_DATA: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    LoadedMetadata,
    LoadedData,
}

/// Result of one `VideoScrubber::tick()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VideoTick {
    Halted,
    Idle,
    /// Scrolled past the end; pin released
    Ended,
    /// Media seeked to this time (seconds)
    Scrubbed(f64),
}

pub struct VideoScrubber<M: MediaTarget> {
    media: M,
    pin: Box<dyn PinTarget>,
    overlay: Overlay,
    scroll_span: f64,
    viewport: Rect,
    got_metadata: bool,
    got_data: bool,
    pinned: bool,
    scheduler: Scheduler,
    ranges: RangeDispatcher,
}

impl<M: MediaTarget> std::fmt::Debug for VideoScrubber<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoScrubber")
            .field("scroll_span", &self.scroll_span)
            .field("viewport", &self.viewport)
            .field("ready", &self.is_ready())
            .field("pinned", &self.pinned)
            .field("scheduler", &self.scheduler.state())
            .finish()
    }
}

impl<M: MediaTarget> VideoScrubber<M> {
    /// Wrap `media` and start loading it.
    pub fn new(mut media: M, pin: Box<dyn PinTarget>, scroll_span: f64, viewport: Rect) -> Result<Self> {
        if !(scroll_span.is_finite() && scroll_span > 0.0) {
            return Err(Error::InvalidScrollSpan(scroll_span));
        }
        validate_viewport(viewport)?;
        media.load();
        info!("Video scrubber created: {}px scroll, viewport {}x{}", scroll_span, viewport.x, viewport.y);

        Ok(Self {
            media,
            pin,
            overlay: Overlay::detached(),
            scroll_span,
            viewport,
            got_metadata: false,
            got_data: false,
            pinned: false,
            scheduler: Scheduler::new(),
            ranges: RangeDispatcher::new(),
        })
    }

    pub fn with_surface(self, surface: Box<dyn Surface>) -> Self {
        self.set_surface(surface);
        self
    }

    /// Move the overlay to `surface`; fades registered earlier follow it.
    pub fn set_surface(&self, surface: Box<dyn Surface>) {
        self.overlay.set_surface(surface);
    }

    // === Readiness ===

    pub fn on_media_event(&mut self, event: MediaEvent) {
        debug!("Media event: {:?}", event);
        match event {
            MediaEvent::LoadedMetadata => self.got_metadata = true,
            MediaEvent::LoadedData => self.got_data = true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.media.ready_state() > READY_STATE_CURRENT_DATA || (self.got_metadata && self.got_data)
    }

    fn duration(&self) -> Result<f64> {
        let duration = self.media.duration();
        if duration.is_finite() && duration > 0.0 {
            Ok(duration)
        } else {
            Err(Error::InvalidMedia(duration))
        }
    }

    // === Geometry ===

    /// Total scrubbed scroll length in pixels.
    pub fn scroll_length(&self) -> f64 {
        self.viewport.y * 2.0 + self.scroll_span
    }

    /// Media time for a scroll offset. Needs a valid duration.
    pub fn time_for_scroll(&self, scrolled: f64) -> Result<f64> {
        let duration = self.duration()?;
        Ok(scrolled * duration / (self.scroll_length() - self.viewport.y))
    }

    /// Pinned layer width covering the viewport for media of `media_size`.
    pub fn cover_width(&self, media_size: Rect) -> f64 {
        cover_width(self.viewport, media_size)
    }

    /// Viewport changed; affects time mapping and cover width.
    pub fn resize(&mut self, viewport: Rect) -> Result<()> {
        validate_viewport(viewport)?;
        debug!("Video viewport resized to {}x{}", viewport.x, viewport.y);
        self.viewport = viewport;
        Ok(())
    }

    // === Lifecycle ===

    pub fn start(&mut self, host: &mut dyn Host) {
        if self.scheduler.arm() {
            info!("Video scrubber started");
            host.request_frame();
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn tick(&mut self, host: &mut dyn Host) -> Result<VideoTick> {
        if !self.is_ready() {
            // a live chain (running or stopping) must reach its next tick
            if self.scheduler.state() != SchedulerState::Idle {
                trace!("Media not ready, polling again next refresh");
                host.request_frame();
            }
            return Err(Error::MediaNotReady);
        }
        let duration = self.duration()?;

        let outcome = match self.scheduler.begin_tick(host.scroll_offset()) {
            Tick::Halt => {
                info!("Video scrubber stopped");
                return Ok(VideoTick::Halted);
            }
            Tick::Unchanged => VideoTick::Idle,
            Tick::Advance(scrolled) => self.advance(scrolled, duration)?,
        };
        host.request_frame();
        Ok(outcome)
    }

    fn advance(&mut self, scrolled: f64, duration: f64) -> Result<VideoTick> {
        let time = self.time_for_scroll(scrolled)?;
        if time >= duration {
            self.release(scrolled);
            return Ok(VideoTick::Ended);
        }
        if time < 0.0 {
            return Ok(VideoTick::Idle);
        }

        self.engage();
        trace!("Video seek to {:.3}s (scroll {})", time, scrolled);
        self.media.set_current_time(time);
        self.ranges.dispatch(&Position::scroll(scrolled).with_time(time));
        Ok(VideoTick::Scrubbed(time))
    }

    fn engage(&mut self) {
        if !self.pinned {
            debug!("Video pinned");
            self.pin.pin();
            self.pinned = true;
        }
        self.overlay.mount();
    }

    fn release(&mut self, top: f64) {
        if self.pinned {
            debug!("Video released at {}", top);
            self.pin.release(top);
            self.pinned = false;
        }
        self.overlay.unmount();
    }

    // === Accessors ===

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn ranges_mut(&mut self) -> &mut RangeDispatcher {
        &mut self.ranges
    }

    /// Fade `node` on this scrubber's overlay across `spec` (scroll or time axis).
    pub fn register_fade(&mut self, node: NodeId, spec: RangeSpec) -> Result<RangeId> {
        effects::register_fade(&mut self.ranges, &self.overlay, node, spec)
    }
}

fn validate_viewport(viewport: Rect) -> Result<()> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(viewport.x) && valid(viewport.y) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "viewport must be positive, got {}x{}",
            viewport.x, viewport.y
        )))
    }
}
