//! Image header loader backed by the `image` crate.
//!
//! Only dimensions are read. Pixels are the host canvas's business; the
//! engine needs the natural size of every frame for fit geometry and
//! viewport membership. Reads run on the `Workers` pool and report through
//! the preloader's `Completion`.

use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::geometry::Rect;
use crate::core::preloader::{Completion, ImageLoader};
use crate::core::workers::Workers;

/// Read natural dimensions of an image file without decoding pixels.
pub fn header(path: &Path) -> Result<Rect, String> {
    let (width, height) = image::image_dimensions(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    debug!("Header {}: {}x{}", path.display(), width, height);
    Ok(Rect::new(width as f64, height as f64))
}

/// Treats sources as file paths, optionally relative to a root directory.
pub struct FileLoader {
    workers: Arc<Workers>,
    root: Option<PathBuf>,
}

impl FileLoader {
    pub fn new(workers: Arc<Workers>) -> Self {
        Self { workers, root: None }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, source: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source),
            None => PathBuf::from(source),
        }
    }
}

impl ImageLoader for FileLoader {
    fn request(&self, _index: usize, source: &str, completion: Completion) {
        let path = self.resolve(source);
        self.workers.execute(move || match header(&path) {
            Ok(rect) => completion.succeed(rect),
            Err(e) => completion.fail(e),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::preloader::Preloader;
    use std::time::Duration;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
        let img = image::RgbImage::new(w, h);
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_header_reads_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 64, 32);
        assert_eq!(header(&dir.path().join("a.png")), Ok(Rect::new(64.0, 32.0)));
        assert!(header(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn test_file_loader_preload() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "001.png", 40, 20);
        write_png(dir.path(), "002.png", 20, 40);

        let workers = Arc::new(Workers::new(2).unwrap());
        let loader = FileLoader::new(workers).with_root(dir.path());
        let sources = vec!["001.png".to_string(), "002.png".to_string(), "nope.png".to_string()];

        let mut pre = Preloader::new(sources);
        pre.start(&loader);
        let frames = pre.wait(Duration::from_secs(5)).unwrap();

        assert_eq!(frames.rect(0), Some(Rect::new(40.0, 20.0)));
        assert_eq!(frames.rect(1), Some(Rect::new(20.0, 40.0)));
        assert_eq!(frames.rect(2), None);
        assert_eq!(pre.progress().failed, 1);
    }
}
