/// Intermediate image dumps for tuning the preprocessing on real screenshots
use image::{DynamicImage, GrayImage};
use std::fs;
use std::path::{Path, PathBuf};

pub const ROI_FILE: &str = "roi.png";
pub const PROCESSED_FILE: &str = "processed.png";

/// Writes intermediate images into a directory. Write failures are logged
/// and otherwise ignored.
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_roi(&self, roi: &DynamicImage) {
        self.save(ROI_FILE, |path| roi.save(path));
    }

    pub fn save_processed(&self, bitmap: &GrayImage) {
        self.save(PROCESSED_FILE, |path| bitmap.save(path));
    }

    fn save(&self, file_name: &str, write: impl FnOnce(&Path) -> image::ImageResult<()>) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!("Failed to create debug directory {}: {}", self.dir.display(), e);
            return;
        }

        let path = self.dir.join(file_name);
        match write(&path) {
            Ok(()) => tracing::debug!("Saved {}", path.display()),
            Err(e) => tracing::warn!("Failed to save {}: {}", path.display(), e),
        }
    }
}
