//! Player configuration loaded from JSON.
//!
//! ```json
//! {
//!   "scroll_span": 3000,
//!   "viewport": { "x": 1280, "y": 720 },
//!   "ranges": {
//!     "#test": { "start": 300, "end": 800, "handle_opacity": false }
//!   }
//! }
//! ```
//!
//! Every field is optional. `ranges` keeps file order, which is also the
//! dispatch order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::ranges::{Axis, RangeSpec};
use crate::entities::geometry::Rect;
use crate::error::{Error, Result};

pub const DEFAULT_SCROLL_SPAN: f64 = 3000.0;
pub const DEFAULT_VIEWPORT: Rect = Rect::new(1280.0, 720.0);

/// One named effect window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    pub start: f64,
    pub end: f64,
    pub axis: Axis,
    /// Eased opacity when true, fixed full opacity otherwise
    #[serde(alias = "handleOpacity")]
    pub handle_opacity: bool,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 0.0,
            axis: Axis::Scroll,
            handle_opacity: true,
        }
    }
}

impl RangeConfig {
    pub fn spec(&self) -> RangeSpec {
        RangeSpec::new(self.start, self.end, self.axis).with_smooth(self.handle_opacity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Scroll pixels mapped to full playback
    #[serde(alias = "scrollSize")]
    pub scroll_span: f64,
    pub viewport: Rect,
    /// Loader threads, `None` = 3/4 of the cores
    pub workers: Option<usize>,
    pub ranges: IndexMap<String, RangeConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            scroll_span: DEFAULT_SCROLL_SPAN,
            viewport: DEFAULT_VIEWPORT,
            workers: None,
            ranges: IndexMap::new(),
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.scroll_span.is_finite() && self.scroll_span > 0.0) {
            return Err(Error::InvalidScrollSpan(self.scroll_span));
        }
        if !(self.viewport.x > 0.0 && self.viewport.y > 0.0) {
            return Err(Error::Config(format!(
                "viewport must be positive, got {}x{}",
                self.viewport.x, self.viewport.y
            )));
        }
        for range in self.ranges.values() {
            range.spec().validate()?;
        }
        Ok(())
    }
}

/// Parse and validate a JSON config.
pub fn from_str(json: &str) -> Result<PlayerConfig> {
    let config: PlayerConfig = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a JSON config file.
pub fn load(path: &Path) -> Result<PlayerConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    from_str(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = from_str("{}").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_ranges_keep_order_and_aliases() {
        let config = from_str(
            r##"{
                "scrollSize": 4000,
                "ranges": {
                    "#b": { "start": 300, "end": 800, "handleOpacity": false },
                    "#a": { "start": 5, "end": 20, "axis": "frame" }
                }
            }"##,
        )
        .unwrap();
        assert_eq!(config.scroll_span, 4000.0);
        let names: Vec<&str> = config.ranges.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["#b", "#a"]);
        assert!(!config.ranges["#b"].handle_opacity);
        assert_eq!(config.ranges["#a"].spec(), RangeSpec::new(5.0, 20.0, Axis::Frame));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(from_str(r#"{"scroll_span": 0}"#), Err(Error::InvalidScrollSpan(0.0)));
        assert!(matches!(
            from_str(r#"{"viewport": {"x": 0, "y": 10}}"#),
            Err(Error::Config(_))
        ));
        assert_eq!(
            from_str(r##"{"ranges": {"#x": {"start": 10, "end": 10}}}"##),
            Err(Error::InvalidRange { start: 10.0, end: 10.0 })
        );
        assert!(matches!(from_str("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(Path::new("/definitely/not/here.json"));
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
