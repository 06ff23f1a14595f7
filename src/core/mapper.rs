//! Scroll offset → frame index.
//!
//! Pure and stateless: evaluated on every scheduler tick that sees a new
//! scroll value, so identical inputs must always give identical frames.

/// Map `scroll` (clamped to `[0, scroll_span]`) to a frame in `0..total_frames`.
///
/// Monotone non-decreasing in `scroll`. Returns 0 for an empty sequence or a
/// NaN scroll.
pub fn frame_for_scroll(scroll: f64, total_frames: usize, scroll_span: f64) -> usize {
    let last = total_frames.saturating_sub(1);
    if scroll.is_nan() || scroll <= 0.0 {
        return 0;
    }
    if scroll >= scroll_span {
        return last;
    }

    let frame = (scroll * last as f64 / scroll_span).round();
    (frame as usize).min(last)
}

/// Smallest scroll offset that shows `frame`, `None` if out of range.
///
/// Inverse of `frame_for_scroll` on the rounding boundary; a single-frame
/// sequence always maps to 0.
pub fn scroll_for_frame(frame: usize, total_frames: usize, scroll_span: f64) -> Option<f64> {
    if frame >= total_frames {
        return None;
    }
    if frame == 0 {
        return Some(0.0);
    }
    let last = (total_frames - 1) as f64;
    Some(((frame as f64 - 0.5) * scroll_span / last).max(0.0))
}
