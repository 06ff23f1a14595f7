//! Aspect-ratio-preserving fit and centering of one rectangle inside another.
//!
//! `Rect` is a size (width in `x`, height in `y`), never a position.
//! `center` returns an `Offset`, which is a position.

use serde::{Deserialize, Serialize};

/// Width (`x`) and height (`y`) of a container or media asset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Width / height. NaN or infinite for zero heights.
    pub fn ratio(&self) -> f64 {
        self.x / self.y
    }
}

/// Top-left position of a child inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

fn usable_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio != 0.0
}

/// Scale `asset` against `container` to the limiting dimension.
///
/// Landscape-or-square containers scale by width, portrait containers by height.
/// Degenerate input (a zero dimension on either side) returns `container`.
pub fn fit(container: Rect, asset: Rect) -> Rect {
    let container_ratio = container.ratio();
    let asset_ratio = asset.ratio();
    if !usable_ratio(container_ratio) || !usable_ratio(asset_ratio) {
        return container;
    }

    match (container_ratio >= 1.0, asset_ratio >= 1.0) {
        // horizontal
        (true, true) => Rect::new(container.x, container.x / asset_ratio),
        // vertical container, horizontal asset
        (false, true) => Rect::new(container.y / asset_ratio, container.y),
        // horizontal container, vertical asset
        (true, false) => Rect::new(container.x, container.x / asset_ratio),
        // vertical
        (false, false) => Rect::new(container.y / asset_ratio, container.y),
    }
}

/// Offset that centers `child` in `container` on both axes (negative on overflow).
pub fn center(container: Rect, child: Rect) -> Offset {
    Offset {
        x: center_line(container.x, child.x),
        y: center_line(container.y, child.y),
    }
}

fn center_line(container_line: f64, child_line: f64) -> f64 {
    (container_line - child_line) / 2.0
}

/// Width of a pinned video that covers the viewport.
///
/// Media wider than the viewport (relative to its ratio) is sized by viewport
/// height, anything else takes the full viewport width.
pub fn cover_width(viewport: Rect, media: Rect) -> f64 {
    let media_ratio = media.ratio();
    let viewport_ratio = viewport.ratio();
    if !usable_ratio(media_ratio) || !usable_ratio(viewport_ratio) {
        return viewport.x.floor();
    }
    let width = if media_ratio / viewport_ratio >= 1.0 {
        viewport.y * media_ratio
    } else {
        viewport.x
    };
    width.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_landscape_in_landscape() {
        let fitted = fit(Rect::new(1000.0, 500.0), Rect::new(200.0, 100.0));
        assert_eq!(fitted, Rect::new(1000.0, 500.0));

        let fitted = fit(Rect::new(1600.0, 900.0), Rect::new(400.0, 100.0));
        assert_eq!(fitted, Rect::new(1600.0, 400.0));
    }

    #[test]
    fn test_fit_orientation_table() {
        // portrait container, landscape asset: limited by height
        let fitted = fit(Rect::new(500.0, 1000.0), Rect::new(200.0, 100.0));
        assert_eq!(fitted, Rect::new(500.0, 1000.0));

        // landscape container, portrait asset: width drives the scale
        let fitted = fit(Rect::new(1000.0, 500.0), Rect::new(100.0, 200.0));
        assert_eq!(fitted, Rect::new(1000.0, 2000.0));

        // portrait in portrait
        let fitted = fit(Rect::new(400.0, 800.0), Rect::new(100.0, 400.0));
        assert_eq!(fitted, Rect::new(3200.0, 800.0));
    }

    #[test]
    fn test_fit_square_container_counts_as_landscape() {
        let fitted = fit(Rect::new(600.0, 600.0), Rect::new(300.0, 150.0));
        assert_eq!(fitted, Rect::new(600.0, 300.0));
    }

    #[test]
    fn test_fit_degenerate_returns_container() {
        let container = Rect::new(800.0, 600.0);
        assert_eq!(fit(container, Rect::new(200.0, 0.0)), container);
        assert_eq!(fit(container, Rect::new(0.0, 200.0)), container);
        assert_eq!(fit(container, Rect::new(0.0, 0.0)), container);
        assert_eq!(fit(Rect::new(800.0, 0.0), Rect::new(10.0, 10.0)), Rect::new(800.0, 0.0));
    }

    #[test]
    fn test_center() {
        let c = Rect::new(1000.0, 500.0);
        assert_eq!(center(c, c), Offset { x: 0.0, y: 0.0 });
        assert_eq!(center(c, Rect::new(600.0, 300.0)), Offset { x: 200.0, y: 100.0 });
        // overflow goes negative
        assert_eq!(center(c, Rect::new(1000.0, 2000.0)), Offset { x: 0.0, y: -750.0 });
    }

    #[test]
    fn test_cover_width() {
        let viewport = Rect::new(1280.0, 720.0);
        // ultra-wide media: sized by height
        assert_eq!(cover_width(viewport, Rect::new(2400.0, 800.0)), 2160.0);
        // narrower media: full width
        assert_eq!(cover_width(viewport, Rect::new(800.0, 800.0)), 1280.0);
        assert_eq!(cover_width(viewport, Rect::new(800.0, 0.0)), 1280.0);
    }
}
