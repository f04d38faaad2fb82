use crate::models::{GalleryItem, RowItem, RowModel};

/// Justified row layout for a fixed-width gallery.
///
/// Items stream left-to-right into rows at a nominal target height. A row
/// closes as soon as the next item would overflow the container width, then
/// the whole row is scaled so content plus inter-item gaps fills the
/// container exactly. The trailing row keeps its natural scale.
///
/// All emitted pixel values are rounded with `f32::round` (nearest integer,
/// halves away from zero).
#[derive(Debug, Clone)]
pub struct JustifiedLayout {
    /// Nominal row height in pixels before justification (default: 220)
    pub target_height: f32,
    /// Gap between items in a row in pixels (default: 8)
    pub gap: f32,
    /// Optional cap on the justification scale factor. `None` leaves the
    /// scale unclamped, so a sparse non-last row can upscale well past the
    /// target height.
    pub max_scale: Option<f32>,
}

impl Default for JustifiedLayout {
    fn default() -> Self {
        Self {
            target_height: 220.0,
            gap: 8.0,
            max_scale: None,
        }
    }
}

impl JustifiedLayout {
    /// Creates a new JustifiedLayout with custom parameters.
    pub fn new(target_height: f32, gap: f32) -> Self {
        Self {
            target_height,
            gap,
            max_scale: None,
        }
    }

    /// Computes a justified layout for a list of gallery items.
    ///
    /// # Algorithm
    /// 1. Accumulate items into a provisional row, each contributing
    ///    `target_height * aspect_ratio` of width.
    /// 2. Before placing an item, check the accumulated width plus one
    ///    reserved gap per already-placed item against the container; on
    ///    overflow, close the provisional row as non-last.
    /// 3. Closing a row scales it so content plus internal gaps matches the
    ///    container width; the trailing row is emitted at scale 1.
    ///
    /// # Arguments
    /// * `items` - Slice of GalleryItems to lay out
    /// * `container_width` - The available width in pixels
    ///
    /// # Returns
    /// A vector of RowModels describing each row's height and item boxes.
    /// Empty input, or a non-positive container width, yields an empty
    /// layout.
    pub fn compute(&self, items: &[GalleryItem], container_width: f32) -> Vec<RowModel> {
        if items.is_empty() || container_width <= 0.0 {
            return Vec::new();
        }

        let mut rows: Vec<RowModel> = Vec::new();
        let mut pending: Vec<&GalleryItem> = Vec::new();
        let mut row_width = 0.0f32;

        for item in items {
            let contribution = self.target_height * item.aspect_ratio();
            let reserved_gaps = self.gap * pending.len() as f32;
            if row_width + contribution + reserved_gaps > container_width && !pending.is_empty() {
                rows.push(self.close_row(
                    &pending,
                    row_width,
                    container_width,
                    rows.len() as u32,
                    false,
                ));
                pending.clear();
                row_width = 0.0;
            }

            pending.push(item);
            row_width += contribution;
        }

        if !pending.is_empty() {
            rows.push(self.close_row(
                &pending,
                row_width,
                container_width,
                rows.len() as u32,
                true,
            ));
        }

        rows
    }

    /// Closes a provisional row into final geometry.
    ///
    /// Non-last rows scale by `(container - internal gaps) / content width`;
    /// the last row keeps scale 1. Item widths derive from the rounded row
    /// height so a row rebuilt from its break reproduces them exactly.
    fn close_row(
        &self,
        pending: &[&GalleryItem],
        row_width: f32,
        container_width: f32,
        row_index: u32,
        is_last: bool,
    ) -> RowModel {
        let total_gap = self.gap * (pending.len() - 1) as f32;
        let scale = if is_last {
            1.0
        } else {
            let fit = (container_width - total_gap) / row_width;
            match self.max_scale {
                Some(cap) => fit.min(cap),
                None => fit,
            }
        };

        let height_px = (self.target_height * scale).round() as i32;
        let items = pending
            .iter()
            .map(|item| RowItem {
                path: item.path.clone(),
                width_px: (height_px as f32 * item.aspect_ratio()).round() as i32,
                height_px,
                is_folder: item.is_folder(),
            })
            .collect();

        RowModel::new(row_index, height_px, items)
    }

    /// Computes row breaks (indices) for caching purposes.
    /// Returns a vector of (start_index, end_index, row_height) tuples.
    pub fn compute_breaks(&self, items: &[GalleryItem], container_width: f32) -> Vec<RowBreak> {
        let rows = self.compute(items, container_width);
        let mut start = 0usize;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let end = start + row.items.len();
            out.push(RowBreak {
                start_index: start,
                end_index: end,
                row_height: row.height_px,
            });
            start = end;
        }
        out
    }

    /// Reconstructs rows from cached breaks without re-running the packing.
    ///
    /// Item widths depend only on the stored row height and each item's
    /// aspect ratio, so the result is identical to the `compute` call the
    /// breaks came from.
    pub fn rows_from_breaks(&self, items: &[GalleryItem], breaks: &[RowBreak]) -> Vec<RowModel> {
        breaks
            .iter()
            .enumerate()
            .map(|(row_idx, brk)| {
                let row_items: Vec<RowItem> = items[brk.start_index..brk.end_index]
                    .iter()
                    .map(|item| RowItem {
                        path: item.path.clone(),
                        width_px: (brk.row_height as f32 * item.aspect_ratio()).round() as i32,
                        height_px: brk.row_height,
                        is_folder: item.is_folder(),
                    })
                    .collect();

                RowModel::new(row_idx as u32, brk.row_height, row_items)
            })
            .collect()
    }
}

/// Represents a row break for caching purposes.
/// Contains only the indices and height, not the actual items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBreak {
    /// Start index in the items array (inclusive)
    pub start_index: usize,
    /// End index in the items array (exclusive)
    pub end_index: usize,
    /// The computed height for this row
    pub row_height: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_item(path: &str, width: u32, height: u32) -> GalleryItem {
        GalleryItem::new(PathBuf::from(path), width, height)
    }

    #[test]
    fn test_empty_items() {
        let layout = JustifiedLayout::default();
        let rows = layout.compute(&[], 1000.0);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_non_positive_container_width() {
        let layout = JustifiedLayout::default();
        let items = vec![make_item("a.jpg", 1200, 800)];
        assert!(layout.compute(&items, 0.0).is_empty());
        assert!(layout.compute(&items, -50.0).is_empty());
    }

    #[test]
    fn test_single_item_keeps_natural_scale() {
        let layout = JustifiedLayout::default();
        let items = vec![make_item("a.jpg", 1200, 800)];
        let rows = layout.compute(&items, 1000.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].height_px, 220);
        assert_eq!(rows[0].items.len(), 1);
        // round(220 * 1.5)
        assert_eq!(rows[0].items[0].width_px, 330);
        assert_eq!(rows[0].items[0].height_px, 220);
    }

    #[test]
    fn test_row_that_fits_is_last_and_unscaled() {
        // Three 3:2 items contribute 330 each; 990 content + 16 reserved
        // gaps stays under 1100, so everything lands in one natural row.
        let layout = JustifiedLayout::default();
        let items: Vec<GalleryItem> = (0..3)
            .map(|i| make_item(&format!("{}.jpg", i), 1200, 800))
            .collect();

        let rows = layout.compute(&items, 1100.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].height_px, 220);
        for item in &rows[0].items {
            assert_eq!(item.width_px, 330);
        }
    }

    #[test]
    fn test_gap_reservation_triggers_break() {
        // Same three items at width 1000: the third item's check sees
        // 990 content + 2 reserved gaps = 1006 > 1000, so it wraps.
        let layout = JustifiedLayout::default();
        let items: Vec<GalleryItem> = (0..3)
            .map(|i| make_item(&format!("{}.jpg", i), 1200, 800))
            .collect();

        let rows = layout.compute(&items, 1000.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].items.len(), 2);
        assert_eq!(rows[1].items.len(), 1);
        // Justified first row: scale = (1000 - 8) / 660
        assert_eq!(rows[0].height_px, (220.0f32 * (992.0 / 660.0)).round() as i32);
        // Natural last row.
        assert_eq!(rows[1].height_px, 220);
    }

    #[test]
    fn test_five_squares_split_four_plus_one() {
        // Square items contribute 220 each. The fifth check sees
        // 880 + 220 + 4 gaps = 1132 > 1000, closing a row of four:
        // scale = (1000 - 24) / 880, height = round(220 * scale) = 244.
        let layout = JustifiedLayout::default();
        let items: Vec<GalleryItem> = (0..5)
            .map(|i| make_item(&format!("{}.jpg", i), 1000, 1000))
            .collect();

        let rows = layout.compute(&items, 1000.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].items.len(), 4);
        assert_eq!(rows[0].height_px, 244);
        for item in &rows[0].items {
            assert_eq!(item.width_px, 244);
        }

        assert_eq!(rows[1].items.len(), 1);
        assert_eq!(rows[1].height_px, 220);
        assert_eq!(rows[1].items[0].width_px, 220);
    }

    #[test]
    fn test_unknown_dimensions_use_fallback_ratio() {
        let layout = JustifiedLayout::default();
        let items = vec![make_item("broken.jpg", 0, 0)];
        let rows = layout.compute(&items, 1000.0);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].height_px, 220);
        // round(220 * 800/600)
        assert_eq!(rows[0].items[0].width_px, 293);
    }

    #[test]
    fn test_partition_preserves_order() {
        let layout = JustifiedLayout::default();
        let items = vec![
            make_item("wide.jpg", 1920, 1080),
            make_item("square.jpg", 1000, 1000),
            make_item("tall.jpg", 1080, 1920),
            make_item("wide2.jpg", 2560, 1080),
            make_item("pano.jpg", 12000, 1000),
            make_item("tall2.jpg", 900, 1600),
        ];

        let rows = layout.compute(&items, 900.0);

        let flattened: Vec<PathBuf> = rows
            .iter()
            .flat_map(|r| r.items.iter().map(|i| i.path.clone()))
            .collect();
        let original: Vec<PathBuf> = items.iter().map(|i| i.path.clone()).collect();
        assert_eq!(flattened, original);

        for (idx, row) in rows.iter().enumerate() {
            assert!(!row.items.is_empty());
            assert_eq!(row.row_index, idx as u32);
        }
    }

    #[test]
    fn test_non_last_rows_fill_container() {
        let layout = JustifiedLayout::default();
        let container = 1280.0;
        let items: Vec<GalleryItem> = [
            (1920, 1080),
            (800, 1200),
            (1000, 1000),
            (2560, 1080),
            (1080, 1920),
            (1600, 900),
            (640, 480),
            (3000, 2000),
            (1200, 1600),
            (1920, 1200),
        ]
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| make_item(&format!("{}.jpg", i), w, h))
        .collect();

        let rows = layout.compute(&items, container);
        assert!(rows.len() > 1);

        for row in &rows[..rows.len() - 1] {
            let content: i32 = row.items.iter().map(|i| i.width_px).sum();
            let gaps = layout.gap as i32 * (row.items.len() as i32 - 1);
            let total = content + gaps;
            // Independent per-item rounding can drift by a pixel per item.
            let tolerance = row.items.len() as i32;
            assert!(
                (total - container as i32).abs() <= tolerance,
                "row {} width {} not within {} of container {}",
                row.row_index,
                total,
                tolerance,
                container
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let layout = JustifiedLayout::default();
        let items: Vec<GalleryItem> = (0..17)
            .map(|i| make_item(&format!("{}.jpg", i), 1600 + 40 * i, 900))
            .collect();

        let first = layout.compute(&items, 1440.0);
        let second = layout.compute(&items, 1440.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unclamped_upscale_of_sparse_row() {
        // A lone near-square item forced to wrap leaves a one-item row that
        // stretches across the whole container when unclamped.
        let layout = JustifiedLayout::default();
        let items = vec![
            make_item("big.jpg", 1000, 1000),
            make_item("huge.jpg", 5000, 1000),
        ];

        let rows = layout.compute(&items, 900.0);

        assert_eq!(rows.len(), 2);
        // scale = 900 / 220 for the single square item
        assert_eq!(rows[0].height_px, 900);
        assert_eq!(rows[0].items[0].width_px, 900);
    }

    #[test]
    fn test_max_scale_caps_upscale() {
        let layout = JustifiedLayout {
            max_scale: Some(1.5),
            ..JustifiedLayout::default()
        };
        let items = vec![
            make_item("big.jpg", 1000, 1000),
            make_item("huge.jpg", 5000, 1000),
        ];

        let rows = layout.compute(&items, 900.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].height_px, 330);
        // The trailing row is unaffected by the cap.
        assert_eq!(rows[1].height_px, 220);
    }

    #[test]
    fn test_breaks_roundtrip_matches_compute() {
        let layout = JustifiedLayout::default();
        let items: Vec<GalleryItem> = (0..15)
            .map(|i| make_item(&format!("{}.jpg", i), 1920, 1080))
            .collect();

        let container = 1920.0;
        let direct = layout.compute(&items, container);
        let breaks = layout.compute_breaks(&items, container);
        let rebuilt = layout.rows_from_breaks(&items, &breaks);

        assert_eq!(direct, rebuilt);

        let total: usize = breaks.iter().map(|b| b.end_index - b.start_index).sum();
        assert_eq!(total, items.len());
    }
}
