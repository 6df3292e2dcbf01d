//! Filesystem adapter for loading sheet photos.

use anyhow::{Context, Result};
use bubblegrade_core::SheetImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported sheet photo extensions.
const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp"];

/// Filesystem sheet-photo source.
pub struct FsSheetSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsSheetSource {
    /// Creates a new filesystem sheet source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all sheet photo files from the configured paths.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_photo(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files.sort();
        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && is_supported_photo(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }

    /// Iterates over the decoded sheet photos.
    pub fn sheets(&self) -> impl Iterator<Item = Result<SheetImage>> + '_ {
        let files = self.collect_files();
        debug!("Found {} sheet photos", files.len());

        files.into_iter().map(|path| load_sheet(&path))
    }

    /// Number of photos that will be yielded, if cheaply known.
    #[must_use]
    pub fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported photo extension.
fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.as_str()))
}

/// Loads one sheet photo from the filesystem.
fn load_sheet(path: &Path) -> Result<SheetImage> {
    let image =
        image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))?;
    Ok(SheetImage::new(path.to_string_lossy(), image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_photo() {
        assert!(is_supported_photo(Path::new("sheet.jpg")));
        assert!(is_supported_photo(Path::new("sheet.JPEG")));
        assert!(is_supported_photo(Path::new("sheet.png")));
        assert!(is_supported_photo(Path::new("sheet.WEBP")));
        assert!(!is_supported_photo(Path::new("sheet.pdf")));
        assert!(!is_supported_photo(Path::new("sheet.txt")));
        assert!(!is_supported_photo(Path::new("sheet")));
    }
}
