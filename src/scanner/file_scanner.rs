//! Directory scanning into the ordered item sequence the layout consumes.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::models::{GalleryItem, ItemKind};
use crate::scanner::metadata::read_image_dimensions;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for a directory scan.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Walk into subdirectories instead of listing them as folder tiles.
    pub recursive: bool,
}

pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scans `path` into gallery items: folders first, then images, each
    /// sorted by path. Hidden entries are skipped. Broken image files stay
    /// in the listing with unknown (0x0) dimensions.
    pub fn scan_directory(&self, path: &Path) -> Result<Vec<GalleryItem>, ScanError> {
        if !path.is_dir() {
            return Err(ScanError::NotADirectory(path.to_path_buf()));
        }

        let mut folders: Vec<GalleryItem> = Vec::new();
        let mut images: Vec<GalleryItem> = Vec::new();

        if self.config.recursive {
            let walker = WalkDir::new(path).follow_links(false).into_iter();
            for entry in walker.filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !name.starts_with('.'))
                    .unwrap_or(true)
            }) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(_) => continue,
                };
                if entry.file_type().is_file() {
                    if let Some(item) = probe_image_item(entry.path().to_path_buf()) {
                        images.push(item);
                    }
                }
            }
        } else {
            let entries = std::fs::read_dir(path).map_err(|source| ScanError::ReadDir {
                path: path.to_path_buf(),
                source,
            })?;
            for entry in entries.flatten() {
                let file_path = entry.path();
                if file_path.is_dir() {
                    if !is_hidden(&file_path) {
                        folders.push(GalleryItem::new_folder(file_path));
                    }
                } else if !is_hidden(&file_path) {
                    if let Some(item) = probe_image_item(file_path) {
                        images.push(item);
                    }
                }
            }
        }

        folders.sort_by(|a, b| a.path.cmp(&b.path));
        images.sort_by(|a, b| a.path.cmp(&b.path));

        let mut items = Vec::with_capacity(folders.len() + images.len());
        items.extend(folders);
        items.extend(images);
        Ok(items)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Builds an image item for `path`, or None when the extension is not a
/// supported image format.
fn probe_image_item(path: PathBuf) -> Option<GalleryItem> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    if ItemKind::from_extension(ext) != Some(ItemKind::Image) {
        return None;
    }

    let (width, height) = match read_image_dimensions(&path) {
        Ok(dims) => dims,
        Err(err) => {
            warn!(error = ?err, "Failed to probe image header, using placeholder size");
            (0, 0)
        }
    };

    let mut item = GalleryItem::new(path, width, height);
    if let Ok(meta) = std::fs::metadata(&item.path) {
        item.size = meta.len() as i64;
        item.mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
    }
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_nonexistent_directory() {
        let scanner = FileScanner::new();
        let result = scanner.scan_directory(Path::new("/nonexistent/dir"));
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn test_folders_then_images_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 32, 16);
        write_png(&dir.path().join("a.png"), 16, 32);
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::create_dir(dir.path().join(".hidden")).unwrap();

        let scanner = FileScanner::new();
        let items = scanner.scan_directory(dir.path()).unwrap();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_folder());
        assert_eq!(items[0].path, dir.path().join("sub"));
        assert_eq!(items[1].path, dir.path().join("a.png"));
        assert_eq!(items[1].width, 16);
        assert_eq!(items[1].height, 32);
        assert_eq!(items[2].path, dir.path().join("b.png"));
    }

    #[test]
    fn test_broken_image_keeps_placeholder_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let scanner = FileScanner::new();
        let items = scanner.scan_directory(dir.path()).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!((items[0].width, items[0].height), (0, 0));
        // The layout sees the fallback ratio, not a degenerate zero.
        assert!(items[0].aspect_ratio() > 0.0);
    }

    #[test]
    fn test_recursive_scan_flattens_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        write_png(&dir.path().join("top.png"), 8, 8);
        write_png(&dir.path().join("nested/deep.png"), 8, 8);

        let scanner = FileScanner::with_config(ScanConfig { recursive: true });
        let items = scanner.scan_directory(dir.path()).unwrap();

        // No folder tiles in recursive mode; both files are listed.
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| !i.is_folder()));
    }

    #[test]
    fn test_scan_populates_file_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 4, 4);

        let scanner = FileScanner::new();
        let items = scanner.scan_directory(dir.path()).unwrap();

        assert_eq!(items.len(), 1);
        assert!(items[0].size > 0);
        assert!(items[0].mtime > 0);
    }
}
