//! Image preloader with order-preserving slots and progress reporting.
//!
//! **Why**: Playback cannot start until every frame's intrinsic size is known
//! (fit geometry and viewport membership depend on it). Loads complete in any
//! order, on any thread, so each request carries its own slot index.
//!
//! **Used by**: CLI (with `FileLoader`), hosts that implement `ImageLoader`
//!
//! # Completion Policy
//!
//! The preload completes once every item has settled, successfully or not.
//! A failed image is recorded as `LoadOutcome::Failed` and counted in
//! `LoadProgress::failed`; it never stalls the aggregate. A `Completion`
//! dropped without reporting counts as a failure for the same reason.
//!
//! # Threading
//!
//! Completions travel over a crossbeam channel. All slot writes, progress
//! counters and listener callbacks happen on the thread that calls `poll()`
//! or `wait()`.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::time::Duration;

use super::listeners::{ListenerId, Listeners};
use crate::entities::frame_set::{FrameSet, LoadOutcome};
use crate::entities::geometry::Rect;
use crate::error::{Error, Result};
use crate::host::MarkerSink;

/// Aggregate preload progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadProgress {
    pub loaded: usize,
    pub failed: usize,
    pub total: usize,
}

impl LoadProgress {
    /// `round(loaded / total * 100)`, 100 for an empty set.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (self.loaded as f64 / self.total as f64 * 100.0).round() as u32
    }

    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.settled() >= self.total
    }
}

struct Settled {
    index: usize,
    outcome: LoadOutcome,
}

/// One-shot result handle for a single load request.
///
/// Consumed by `succeed()`/`fail()`. Dropping it unreported settles the slot
/// as failed.
pub struct Completion {
    index: usize,
    tx: Option<Sender<Settled>>,
}

impl Completion {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Report natural image dimensions.
    pub fn succeed(self, natural: Rect) {
        self.finish(LoadOutcome::Loaded(natural));
    }

    pub fn fail(self, reason: impl Into<String>) {
        self.finish(LoadOutcome::Failed(reason.into()));
    }

    fn finish(mut self, outcome: LoadOutcome) {
        if let Some(tx) = self.tx.take() {
            // receiver gone means the preloader was dropped, nothing to report to
            let _ = tx.send(Settled { index: self.index, outcome });
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Settled {
                index: self.index,
                outcome: LoadOutcome::Failed("load dropped without reporting".to_string()),
            });
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion").field("index", &self.index).finish()
    }
}

/// Issues load requests. Implementations may complete synchronously or later.
pub trait ImageLoader {
    fn request(&self, index: usize, source: &str, completion: Completion);
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreloadStatus {
    Pending(LoadProgress),
    Complete(FrameSet),
}

pub struct Preloader {
    sources: Vec<String>,
    slots: Vec<Option<LoadOutcome>>,
    progress: LoadProgress,
    listeners: Listeners<LoadProgress>,
    markers: Option<Box<dyn MarkerSink>>,
    /// Held until start(), then dropped so a leaked request shows up as a disconnect
    tx: Option<Sender<Settled>>,
    rx: Receiver<Settled>,
    started: bool,
    finished: bool,
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("progress", &self.progress)
            .field("started", &self.started)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Preloader {
    pub fn new(sources: Vec<String>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let total = sources.len();
        Self {
            slots: vec![None; total],
            sources,
            progress: LoadProgress { loaded: 0, failed: 0, total },
            listeners: Listeners::new(),
            markers: None,
            tx: Some(tx),
            rx,
            started: false,
            finished: false,
        }
    }

    /// Stage off-screen markers for each source while loading.
    pub fn with_markers(mut self, markers: Box<dyn MarkerSink>) -> Self {
        self.markers = Some(markers);
        self
    }

    pub fn on_progress<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&LoadProgress) + 'static,
    {
        self.listeners.add(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    /// Issue one request per source.
    pub fn start(&mut self, loader: &dyn ImageLoader) {
        if self.started {
            warn!("Preloader: start() called twice, ignoring");
            return;
        }
        self.started = true;
        let Some(tx) = self.tx.take() else {
            return;
        };

        info!("Preloading {} frames", self.sources.len());
        for (index, source) in self.sources.iter().enumerate() {
            if let Some(markers) = self.markers.as_mut() {
                markers.stage(index, source);
            }
            loader.request(index, source, Completion { index, tx: Some(tx.clone()) });
        }
        drop(tx);

        if self.progress.is_complete() {
            self.finish();
        }
    }

    /// Drain completions that have arrived so far.
    pub fn poll(&mut self) -> Result<PreloadStatus> {
        loop {
            if self.progress.is_complete() {
                return self.complete_status();
            }
            match self.rx.try_recv() {
                Ok(settled) => self.apply(settled),
                Err(TryRecvError::Empty) => return Ok(PreloadStatus::Pending(self.progress)),
                Err(TryRecvError::Disconnected) => {
                    return Err(Error::PreloadDisconnected { pending: self.pending() });
                }
            }
        }
    }

    /// Block until every item settles. Fails if no completion arrives within `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Result<FrameSet> {
        loop {
            if let PreloadStatus::Complete(frames) = self.poll()? {
                return Ok(frames);
            }
            match self.rx.recv_timeout(timeout) {
                Ok(settled) => self.apply(settled),
                Err(RecvTimeoutError::Timeout) => return Err(Error::PreloadTimeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::PreloadDisconnected { pending: self.pending() });
                }
            }
        }
    }

    fn pending(&self) -> usize {
        self.progress.total - self.progress.settled()
    }

    fn apply(&mut self, settled: Settled) {
        let Some(slot) = self.slots.get_mut(settled.index) else {
            warn!("Preloader: completion for unknown index {}", settled.index);
            return;
        };
        if slot.is_some() {
            warn!("Preloader: index {} settled twice, keeping first result", settled.index);
            return;
        }

        match &settled.outcome {
            LoadOutcome::Loaded(rect) => {
                trace!("Frame {} loaded: {}x{}", settled.index, rect.x, rect.y);
                self.progress.loaded += 1;
            }
            LoadOutcome::Failed(reason) => {
                warn!("Frame {} ({}) failed to load: {}", settled.index, self.sources[settled.index], reason);
                self.progress.failed += 1;
            }
        }
        *slot = Some(settled.outcome);

        let progress = self.progress;
        debug!("Preload progress: {}/{} ({}%)", progress.loaded, progress.total, progress.percent());
        self.listeners.emit(&progress);

        if progress.is_complete() {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(markers) = self.markers.as_mut() {
            markers.clear();
        }
        info!(
            "Preload complete: {} loaded, {} failed",
            self.progress.loaded, self.progress.failed
        );
    }

    fn complete_status(&self) -> Result<PreloadStatus> {
        let outcomes = self
            .slots
            .iter()
            .map(|s| s.clone().unwrap_or_else(|| LoadOutcome::Failed("never settled".to_string())))
            .collect();
        FrameSet::new(self.sources.clone(), outcomes).map(PreloadStatus::Complete)
    }
}
