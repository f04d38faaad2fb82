//! Image header probing.
//!
//! The layout only needs aspect ratios, so this reads just enough of each
//! file for the format to state its size; pixel data is never decoded.

use std::path::Path;

use anyhow::{Context, Result};
use image::ImageReader;
use tracing::trace;

/// Probes an image's intrinsic dimensions from its header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32)> {
    let reader =
        ImageReader::open(path).with_context(|| format!("Failed to open image: {:?}", path))?;
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions: {:?}", path))?;
    trace!("Got dimensions {}x{} for {:?}", width, height, path);
    Ok((width, height))
}
