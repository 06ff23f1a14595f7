//! Range event dispatcher: `[start, end]` windows evaluated against a position.
//!
//! **Why**: Secondary effects (fades, reveals) are pinned to a slice of the
//! scroll or frame axis. Each window needs enter/update/exit semantics, which
//! means remembering whether it was in range on the previous tick. That memory
//! lives here, per registration, not with the caller.
//!
//! **Used by**: Player (scroll + frame axes), VideoScrubber (scroll + time axes),
//! effects (fade targets)
//!
//! # Phases
//!
//! - not in range → in range: `on_enter_or_update(Entered)`
//! - in range → in range: `on_enter_or_update(Active)`
//! - in range → not in range: `on_exit`, once
//! - not in range → not in range: nothing
//!
//! Percentages use the 0-100 convention throughout (`traveled`,
//! `linear_gradient`, the input of `ease_out_expo`).

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// ===== Position math =====

pub fn in_range(start: f64, end: f64, current: f64) -> bool {
    current >= start && current <= end
}

/// Percentage of the window travelled. Unbounded outside the window.
pub fn traveled(start: f64, end: f64, current: f64) -> f64 {
    (current - start) / (end - start) * 100.0
}

/// Triangular ramp: 0 at `start`, 100 at the midpoint, back to 0 at `end`.
pub fn linear_gradient(start: f64, end: f64, current: f64) -> f64 {
    let vertex = (end - start) / 2.0 + start;
    let ascend = traveled(start, vertex, current);
    if ascend < 100.0 { ascend } else { 200.0 - ascend }
}

/// Exponential ease-out over a 0-100 scale. Exactly 0 at 0 and 1 at 100.
pub fn ease_out_expo(t: f64) -> f64 {
    const DURATION: f64 = 100.0;
    if t == DURATION {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * t / DURATION)
    }
}

// ===== Types =====

/// Position axis a window is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Scroll,
    Frame,
    Time,
}

/// Window bounds plus rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub axis: Axis,
    /// Eased opacity when true, fixed full opacity otherwise
    #[serde(default = "default_smooth")]
    pub smooth: bool,
}

fn default_smooth() -> bool {
    true
}

impl RangeSpec {
    pub fn new(start: f64, end: f64, axis: Axis) -> Self {
        Self { start, end, axis, smooth: true }
    }

    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }

    /// Zero-width, inverted and NaN windows are configuration errors.
    pub fn validate(&self) -> Result<()> {
        if self.end > self.start && self.start.is_finite() && self.end.is_finite() {
            Ok(())
        } else {
            Err(Error::InvalidRange { start: self.start, end: self.end })
        }
    }
}

/// Current value on each axis. Axes left `None` are not evaluated this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub scroll: Option<f64>,
    pub frame: Option<f64>,
    pub time: Option<f64>,
}

impl Position {
    pub fn scroll(scroll: f64) -> Self {
        Self { scroll: Some(scroll), ..Self::default() }
    }

    pub fn with_frame(mut self, frame: f64) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::Scroll => self.scroll,
            Axis::Frame => self.frame,
            Axis::Time => self.time,
        }
    }
}

/// Derived values for one window at one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeSample {
    pub start: f64,
    pub end: f64,
    pub current: f64,
    pub in_range: bool,
    pub traveled: f64,
    pub linear_gradient: f64,
    pub ease_out_expo: f64,
}

impl RangeSample {
    pub fn compute(start: f64, end: f64, current: f64) -> Self {
        let gradient = linear_gradient(start, end, current);
        Self {
            start,
            end,
            current,
            in_range: in_range(start, end, current),
            traveled: traveled(start, end, current),
            linear_gradient: gradient,
            ease_out_expo: ease_out_expo(gradient),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePhase {
    Entered,
    Active,
}

/// Payload of `on_enter_or_update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEvent {
    pub phase: RangePhase,
    pub sample: RangeSample,
    /// Resolved target opacity in 0..=1
    pub opacity: f64,
}

/// Handle to a registered window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeId(Uuid);

type EnterOrUpdate = Box<dyn FnMut(&RangeEvent)>;
type Exit = Box<dyn FnMut(&RangeSample)>;

struct Registration {
    spec: RangeSpec,
    on_enter_or_update: EnterOrUpdate,
    on_exit: Exit,
    was_in_range: bool,
}

/// Per-tick counts, mostly for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub entered: usize,
    pub active: usize,
    pub exited: usize,
}

// ===== Dispatcher =====

#[derive(Default)]
pub struct RangeDispatcher {
    registrations: IndexMap<RangeId, Registration>,
}

impl std::fmt::Debug for RangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeDispatcher")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

impl RangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window. Rejects zero-width and inverted windows.
    pub fn register<E, X>(&mut self, spec: RangeSpec, on_enter_or_update: E, on_exit: X) -> Result<RangeId>
    where
        E: FnMut(&RangeEvent) + 'static,
        X: FnMut(&RangeSample) + 'static,
    {
        spec.validate()?;
        let id = RangeId(Uuid::new_v4());
        self.registrations.insert(
            id,
            Registration {
                spec,
                on_enter_or_update: Box::new(on_enter_or_update),
                on_exit: Box::new(on_exit),
                was_in_range: false,
            },
        );
        debug!("Range registered: [{}, {}] on {:?}", spec.start, spec.end, spec.axis);
        Ok(id)
    }

    /// Drop a registration without firing its exit callback.
    pub fn unregister(&mut self, id: RangeId) -> bool {
        self.registrations.shift_remove(&id).is_some()
    }

    pub fn is_in_range(&self, id: RangeId) -> Option<bool> {
        self.registrations.get(&id).map(|r| r.was_in_range)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Evaluate every window whose axis has a value in `position`.
    pub fn dispatch(&mut self, position: &Position) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        for reg in self.registrations.values_mut() {
            let Some(current) = position.get(reg.spec.axis) else {
                continue;
            };
            let sample = RangeSample::compute(reg.spec.start, reg.spec.end, current);

            match (reg.was_in_range, sample.in_range) {
                (was_in_range, true) => {
                    let phase = if was_in_range { RangePhase::Active } else { RangePhase::Entered };
                    let opacity = if reg.spec.smooth { sample.ease_out_expo } else { 1.0 };
                    if phase == RangePhase::Entered {
                        debug!("Range [{}, {}] entered at {}", sample.start, sample.end, current);
                        summary.entered += 1;
                    } else {
                        summary.active += 1;
                    }
                    reg.was_in_range = true;
                    (reg.on_enter_or_update)(&RangeEvent { phase, sample, opacity });
                }
                (true, false) => {
                    debug!("Range [{}, {}] exited at {}", sample.start, sample.end, current);
                    reg.was_in_range = false;
                    summary.exited += 1;
                    (reg.on_exit)(&sample);
                }
                (false, false) => {}
            }
        }

        trace!("Ranges dispatched: {:?}", summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_ease_out_expo_endpoints() {
        assert_eq!(ease_out_expo(100.0), 1.0);
        assert_eq!(ease_out_expo(0.0), 0.0);
        assert!(ease_out_expo(50.0) > 0.95 && ease_out_expo(50.0) < 1.0);
    }

    #[test]
    fn test_linear_gradient_symmetric() {
        assert_eq!(linear_gradient(300.0, 800.0, 300.0), 0.0);
        assert_eq!(linear_gradient(300.0, 800.0, 550.0), 100.0);
        assert_eq!(linear_gradient(300.0, 800.0, 800.0), 0.0);
        let a = linear_gradient(0.0, 100.0, 20.0);
        let b = linear_gradient(0.0, 100.0, 80.0);
        assert!((a - b).abs() < 1e-9);
        assert!((a - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_traveled_and_in_range() {
        assert_eq!(traveled(100.0, 200.0, 150.0), 50.0);
        assert_eq!(traveled(100.0, 200.0, 250.0), 150.0);
        assert!(in_range(100.0, 200.0, 100.0));
        assert!(in_range(100.0, 200.0, 200.0));
        assert!(!in_range(100.0, 200.0, 200.5));
    }

    #[test]
    fn test_register_rejects_zero_width() {
        let mut d = RangeDispatcher::new();
        let err = d.register(RangeSpec::new(10.0, 10.0, Axis::Scroll), |_| {}, |_| {});
        assert_eq!(err, Err(Error::InvalidRange { start: 10.0, end: 10.0 }));
        assert!(d.register(RangeSpec::new(20.0, 10.0, Axis::Scroll), |_| {}, |_| {}).is_err());
        assert!(d.register(RangeSpec::new(f64::NAN, 10.0, Axis::Scroll), |_| {}, |_| {}).is_err());
        assert!(d.is_empty());
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Enter(RangePhase, f64),
        Exit,
    }

    fn recording(d: &mut RangeDispatcher, spec: RangeSpec) -> (RangeId, Rc<RefCell<Vec<Seen>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&log);
        let b = Rc::clone(&log);
        let id = d
            .register(
                spec,
                move |e| a.borrow_mut().push(Seen::Enter(e.phase, e.opacity)),
                move |_| b.borrow_mut().push(Seen::Exit),
            )
            .unwrap();
        (id, log)
    }

    #[test]
    fn test_enter_update_exit_once() {
        let mut d = RangeDispatcher::new();
        let (id, log) = recording(&mut d, RangeSpec::new(300.0, 800.0, Axis::Scroll).with_smooth(false));

        d.dispatch(&Position::scroll(100.0));
        assert!(log.borrow().is_empty());

        let s = d.dispatch(&Position::scroll(400.0));
        assert_eq!(s.entered, 1);
        d.dispatch(&Position::scroll(400.0));
        assert_eq!(d.is_in_range(id), Some(true));

        let s = d.dispatch(&Position::scroll(900.0));
        assert_eq!(s.exited, 1);
        let s = d.dispatch(&Position::scroll(950.0));
        assert_eq!(s, DispatchSummary::default());

        assert_eq!(
            *log.borrow(),
            vec![Seen::Enter(RangePhase::Entered, 1.0), Seen::Enter(RangePhase::Active, 1.0), Seen::Exit]
        );
    }

    #[test]
    fn test_smooth_opacity() {
        let mut d = RangeDispatcher::new();
        let (_, log) = recording(&mut d, RangeSpec::new(0.0, 100.0, Axis::Scroll));
        d.dispatch(&Position::scroll(50.0));
        d.dispatch(&Position::scroll(100.0));
        assert_eq!(
            *log.borrow(),
            vec![Seen::Enter(RangePhase::Entered, 1.0), Seen::Enter(RangePhase::Active, 0.0)]
        );
    }

    #[test]
    fn test_axis_filtering() {
        let mut d = RangeDispatcher::new();
        let (_, scroll_log) = recording(&mut d, RangeSpec::new(0.0, 100.0, Axis::Scroll));
        let (_, frame_log) = recording(&mut d, RangeSpec::new(10.0, 20.0, Axis::Frame));

        // frame axis absent: frame window untouched
        d.dispatch(&Position::scroll(50.0));
        assert_eq!(scroll_log.borrow().len(), 1);
        assert!(frame_log.borrow().is_empty());

        d.dispatch(&Position::scroll(60.0).with_frame(15.0));
        assert_eq!(frame_log.borrow().len(), 1);
    }

    #[test]
    fn test_unregister() {
        let mut d = RangeDispatcher::new();
        let (id, log) = recording(&mut d, RangeSpec::new(0.0, 100.0, Axis::Scroll));
        assert!(d.unregister(id));
        assert!(!d.unregister(id));
        d.dispatch(&Position::scroll(50.0));
        assert!(log.borrow().is_empty());
        assert_eq!(d.is_in_range(id), None);
    }
}
