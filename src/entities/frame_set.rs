//! Ordered frame sources with their per-frame load outcome.
//!
//! Index = frame number. Built once (usually by the preloader) and never
//! mutated afterwards, so the player can read it without synchronization.

use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::error::{Error, Result};

/// Result of loading one frame source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadOutcome {
    /// Natural width/height of the image
    Loaded(Rect),
    Failed(String),
}

impl LoadOutcome {
    pub fn rect(&self) -> Option<Rect> {
        match self {
            LoadOutcome::Loaded(rect) => Some(*rect),
            LoadOutcome::Failed(_) => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    sources: Vec<String>,
    outcomes: Vec<LoadOutcome>,
}

impl FrameSet {
    /// Pair sources with outcomes. Lengths must match and be non-zero.
    pub fn new(sources: Vec<String>, outcomes: Vec<LoadOutcome>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::EmptyFrameSet);
        }
        if sources.len() != outcomes.len() {
            return Err(Error::Config(format!(
                "{} sources but {} load outcomes",
                sources.len(),
                outcomes.len()
            )));
        }
        Ok(Self { sources, outcomes })
    }

    /// Frame set where every source shares one known size.
    pub fn uniform(sources: Vec<String>, size: Rect) -> Result<Self> {
        let outcomes = vec![LoadOutcome::Loaded(size); sources.len()];
        Self::new(sources, outcomes)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn source(&self, frame: usize) -> Option<&str> {
        self.sources.get(frame).map(String::as_str)
    }

    pub fn outcome(&self, frame: usize) -> Option<&LoadOutcome> {
        self.outcomes.get(frame)
    }

    /// Intrinsic size, `None` for failed or unknown frames.
    pub fn rect(&self, frame: usize) -> Option<Rect> {
        self.outcomes.get(frame).and_then(LoadOutcome::rect)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_loaded()).count()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("/images/{:03}.jpg", i)).collect()
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(FrameSet::new(vec![], vec![]), Err(Error::EmptyFrameSet));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = FrameSet::new(names(2), vec![LoadOutcome::Loaded(Rect::new(1.0, 1.0))]);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn test_lookup() {
        let set = FrameSet::new(
            names(2),
            vec![LoadOutcome::Loaded(Rect::new(640.0, 360.0)), LoadOutcome::Failed("404".into())],
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.source(0), Some("/images/001.jpg"));
        assert_eq!(set.rect(0), Some(Rect::new(640.0, 360.0)));
        assert_eq!(set.rect(1), None);
        assert_eq!(set.rect(7), None);
        assert_eq!(set.failed_count(), 1);
    }
}
