//! Cooperative tick scheduler for scroll-driven playback.
//!
//! The host owns the real refresh loop (requestAnimationFrame, a vsync
//! callback, a test loop). The scheduler decides, per tick, whether work is
//! needed and whether the chain should continue.
//!
//! # States
//!
//! - `Idle`: no tick chain alive. `arm()` starts one.
//! - `Running`: each tick samples scroll and reschedules.
//! - `Stopping`: `stop()` was called. The next tick halts the chain without
//!   doing work, so stopping is eventual: one more (empty) tick may run.
//!
//! Steady state (page not scrolling) is an early exit on an unchanged scroll.

use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
}

/// What the current tick should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Chain ended, do not reschedule.
    Halt,
    /// Scroll unchanged, reschedule only.
    Unchanged,
    /// New scroll value to commit, then reschedule.
    Advance(f64),
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: SchedulerState,
    /// Last scroll value committed by a tick (unset until the first tick)
    last_scroll: Option<f64>,
    ticks: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            last_scroll: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Number of ticks seen (including halting ones).
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_scroll(&self) -> Option<f64> {
        self.last_scroll
    }

    /// Re-arm. Returns true if the caller must request the first tick.
    ///
    /// A chain that is still alive (`Running`, or `Stopping` with its last
    /// tick pending) is reused, so repeated starts never fork a second loop.
    pub fn arm(&mut self) -> bool {
        let needs_tick = self.state == SchedulerState::Idle;
        if self.state != SchedulerState::Running {
            debug!("Scheduler armed (from {:?})", self.state);
        }
        self.state = SchedulerState::Running;
        needs_tick
    }

    /// Request a stop. Observed at the top of the next tick.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Running {
            debug!("Scheduler stop requested");
            self.state = SchedulerState::Stopping;
        }
    }

    /// Decide the work for a tick that sampled `scroll`.
    pub fn begin_tick(&mut self, scroll: f64) -> Tick {
        self.ticks += 1;
        match self.state {
            SchedulerState::Idle => return Tick::Halt,
            SchedulerState::Stopping => {
                debug!("Scheduler halted after {} ticks", self.ticks);
                self.state = SchedulerState::Idle;
                return Tick::Halt;
            }
            SchedulerState::Running => {}
        }

        if self.last_scroll == Some(scroll) {
            return Tick::Unchanged;
        }
        trace!("Tick {}: scroll {:?} -> {}", self.ticks, self.last_scroll, scroll);
        self.last_scroll = Some(scroll);
        Tick::Advance(scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_halts() {
        let mut s = Scheduler::new();
        assert_eq!(s.begin_tick(0.0), Tick::Halt);
    }

    #[test]
    fn test_first_tick_always_advances() {
        let mut s = Scheduler::new();
        assert!(s.arm());
        assert_eq!(s.begin_tick(0.0), Tick::Advance(0.0));
        assert_eq!(s.begin_tick(0.0), Tick::Unchanged);
        assert_eq!(s.begin_tick(12.0), Tick::Advance(12.0));
        assert_eq!(s.last_scroll(), Some(12.0));
    }

    #[test]
    fn test_stop_is_eventual() {
        let mut s = Scheduler::new();
        s.arm();
        s.begin_tick(1.0);
        s.stop();
        assert_eq!(s.state(), SchedulerState::Stopping);
        // the pending tick runs but does nothing and ends the chain
        assert_eq!(s.begin_tick(50.0), Tick::Halt);
        assert_eq!(s.state(), SchedulerState::Idle);
        assert_eq!(s.last_scroll(), Some(1.0));
    }

    #[test]
    fn test_rearm_reuses_live_chain() {
        let mut s = Scheduler::new();
        assert!(s.arm());
        assert!(!s.arm());
        s.stop();
        // stop then start before the pending tick: same chain continues
        assert!(!s.arm());
        assert_eq!(s.begin_tick(5.0), Tick::Advance(5.0));
        s.stop();
        s.begin_tick(5.0);
        // chain ended: a fresh tick is needed
        assert!(s.arm());
    }
}
