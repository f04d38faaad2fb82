use std::path::PathBuf;

/// Substitute dimensions for items whose intrinsic size could not be read.
pub const FALLBACK_WIDTH: u32 = 800;
pub const FALLBACK_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Image,
    Folder,
}

impl ItemKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            _ => None,
        }
    }
}

/// One element of the gallery, in scan order.
///
/// `width`/`height` are the intrinsic pixel dimensions probed from the file
/// header; 0 means unknown and routes through the fallback ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub path: PathBuf,
    pub kind: ItemKind,
    pub width: u32,
    pub height: u32,
    pub mtime: i64,
    pub size: i64,
}

impl GalleryItem {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            path,
            kind: ItemKind::Image,
            width,
            height,
            mtime: 0,
            size: 0,
        }
    }

    /// Create a new folder item with fixed 1:1 aspect ratio
    pub fn new_folder(path: PathBuf) -> Self {
        Self {
            path,
            kind: ItemKind::Folder,
            width: 1,
            height: 1,
            mtime: 0,
            size: 0,
        }
    }

    /// Intrinsic width/height ratio, substituting 800x600 when either
    /// dimension is unknown.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            FALLBACK_WIDTH as f32 / FALLBACK_HEIGHT as f32
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}
