use crate::layout::justified::RowBreak;
use crate::layout::JustifiedLayout;
use crate::models::{GalleryItem, RowModel};
use parking_lot::RwLock;
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64;

/// Width bucket size for cache keys.
/// Container widths are bucketed to avoid excessive cache invalidation on
/// small resizes.
const WIDTH_BUCKET_SIZE: u32 = 50;

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 8;

/// Key for the layout cache, combining width bucket and list hash.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    width_bucket: u32,
    list_hash: u64,
}

/// Cached layout data: the row breaks that can reconstruct the full layout.
#[derive(Debug, Clone)]
struct CacheEntry {
    breaks: Vec<RowBreak>,
    /// Number of items this layout was computed for (revalidated on reads)
    item_count: usize,
    /// Last access, for LRU eviction
    last_used: std::time::Instant,
}

/// Cache of row breaks keyed by (width bucket, item-list hash).
///
/// A hit skips the packing pass entirely: the stored breaks rebuild full
/// rows in O(n). The list hash covers (path, mtime) pairs in order, so any
/// file change or reordering invalidates the entry.
pub struct LayoutCache {
    cache: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::with_capacity(MAX_CACHE_ENTRIES)),
        }
    }

    /// Computes the width bucket for a container width, grouping nearby
    /// widths to reduce churn while a window is being dragged.
    pub fn width_bucket(container_width: f32) -> u32 {
        (container_width as u32) / WIDTH_BUCKET_SIZE
    }

    /// Fast hash of the ordered item list, from each item's path and mtime.
    pub fn compute_list_hash(items: &[GalleryItem]) -> u64 {
        let mut hasher_input = Vec::with_capacity(items.len() * 64);

        for item in items {
            hasher_input.extend_from_slice(item.path.as_os_str().as_encoded_bytes());
            hasher_input.extend_from_slice(&item.mtime.to_le_bytes());
        }

        xxh3_64(&hasher_input)
    }

    /// Retrieves cached row breaks, or None on a miss.
    pub fn get_breaks(&self, width_bucket: u32, list_hash: u64) -> Option<Vec<RowBreak>> {
        let key = CacheKey {
            width_bucket,
            list_hash,
        };

        let cache = self.cache.read();
        cache.get(&key).map(|entry| entry.breaks.clone())
    }

    /// Retrieves cached rows rebuilt from their breaks, or None on a miss.
    pub fn get(
        &self,
        width_bucket: u32,
        list_hash: u64,
        items: &[GalleryItem],
        layout: &JustifiedLayout,
    ) -> Option<Vec<RowModel>> {
        let key = CacheKey {
            width_bucket,
            list_hash,
        };

        let breaks = {
            let mut cache = self.cache.write();
            let entry = cache.get_mut(&key)?;
            if entry.item_count != items.len() {
                return None;
            }
            entry.last_used = std::time::Instant::now();
            entry.breaks.clone()
        };

        Some(layout.rows_from_breaks(items, &breaks))
    }

    /// Stores row breaks, evicting the least recently used entry when full.
    pub fn set(&self, width_bucket: u32, list_hash: u64, breaks: Vec<RowBreak>, item_count: usize) {
        let key = CacheKey {
            width_bucket,
            list_hash,
        };

        let entry = CacheEntry {
            breaks,
            item_count,
            last_used: std::time::Instant::now(),
        };

        let mut cache = self.cache.write();
        if cache.len() >= MAX_CACHE_ENTRIES && !cache.contains_key(&key) {
            Self::evict_oldest(&mut cache);
        }
        cache.insert(key, entry);
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    fn evict_oldest(cache: &mut HashMap<CacheKey, CacheEntry>) {
        let oldest_key = cache
            .iter()
            .min_by_key(|(_, v)| v.last_used)
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest_key {
            cache.remove(&key);
        }
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Couples a [`JustifiedLayout`] with a [`LayoutCache`] behind one call.
pub struct CachedLayoutComputer {
    layout: JustifiedLayout,
    pub cache: LayoutCache,
}

impl CachedLayoutComputer {
    pub fn new() -> Self {
        Self::with_layout(JustifiedLayout::default())
    }

    pub fn with_layout(layout: JustifiedLayout) -> Self {
        Self {
            layout,
            cache: LayoutCache::new(),
        }
    }

    pub fn layout(&self) -> &JustifiedLayout {
        &self.layout
    }

    /// Replaces the layout configuration. Cached breaks were computed under
    /// the old configuration, so this clears the cache.
    pub fn set_layout(&mut self, layout: JustifiedLayout) {
        self.layout = layout;
        self.cache.clear();
    }

    /// Computes the layout, O(1) on a cache hit and O(n) on a miss.
    pub fn compute(&self, items: &[GalleryItem], container_width: f32) -> Vec<RowModel> {
        if items.is_empty() {
            return Vec::new();
        }

        let width_bucket = LayoutCache::width_bucket(container_width);
        let list_hash = LayoutCache::compute_list_hash(items);

        if let Some(rows) = self.cache.get(width_bucket, list_hash, items, &self.layout) {
            return rows;
        }

        let breaks = self.layout.compute_breaks(items, container_width);
        let rows = self.layout.rows_from_breaks(items, &breaks);
        self.cache.set(width_bucket, list_hash, breaks, items.len());

        rows
    }

    /// Invalidates the cache, forcing recomputation on the next call.
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

impl Default for CachedLayoutComputer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_item(path: &str, width: u32, height: u32, mtime: i64) -> GalleryItem {
        let mut item = GalleryItem::new(PathBuf::from(path), width, height);
        item.mtime = mtime;
        item
    }

    #[test]
    fn test_width_bucket() {
        assert_eq!(LayoutCache::width_bucket(1920.0), 38);
        assert_eq!(LayoutCache::width_bucket(1900.0), 38);
        assert_eq!(LayoutCache::width_bucket(1950.0), 39);
        assert_eq!(LayoutCache::width_bucket(100.0), 2);
    }

    #[test]
    fn test_list_hash_consistency() {
        let items = vec![
            make_item("a.jpg", 100, 100, 1000),
            make_item("b.jpg", 200, 200, 2000),
        ];

        assert_eq!(
            LayoutCache::compute_list_hash(&items),
            LayoutCache::compute_list_hash(&items)
        );
    }

    #[test]
    fn test_list_hash_changes_on_mtime() {
        let items1 = vec![make_item("a.jpg", 100, 100, 1000)];
        let items2 = vec![make_item("a.jpg", 100, 100, 2000)];

        assert_ne!(
            LayoutCache::compute_list_hash(&items1),
            LayoutCache::compute_list_hash(&items2)
        );
    }

    #[test]
    fn test_list_hash_changes_on_order() {
        let items1 = vec![
            make_item("a.jpg", 100, 100, 1000),
            make_item("b.jpg", 200, 200, 2000),
        ];
        let items2 = vec![
            make_item("b.jpg", 200, 200, 2000),
            make_item("a.jpg", 100, 100, 1000),
        ];

        assert_ne!(
            LayoutCache::compute_list_hash(&items1),
            LayoutCache::compute_list_hash(&items2)
        );
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let cache = LayoutCache::new();
        let width_bucket = 38;
        let list_hash = 12345u64;

        assert!(cache.get_breaks(width_bucket, list_hash).is_none());

        let breaks = vec![
            RowBreak {
                start_index: 0,
                end_index: 3,
                row_height: 244,
            },
            RowBreak {
                start_index: 3,
                end_index: 5,
                row_height: 220,
            },
        ];
        cache.set(width_bucket, list_hash, breaks, 5);

        let retrieved = cache.get_breaks(width_bucket, list_hash);
        assert_eq!(retrieved.map(|b| b.len()), Some(2));
    }

    #[test]
    fn test_stale_item_count_misses() {
        let cache = LayoutCache::new();
        let layout = JustifiedLayout::default();
        let items = vec![make_item("a.jpg", 1920, 1080, 1)];

        let breaks = vec![RowBreak {
            start_index: 0,
            end_index: 2,
            row_height: 220,
        }];
        cache.set(38, 7, breaks, 2);

        assert!(cache.get(38, 7, &items, &layout).is_none());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = LayoutCache::new();
        let breaks = vec![RowBreak {
            start_index: 0,
            end_index: 1,
            row_height: 220,
        }];

        for i in 0..(MAX_CACHE_ENTRIES + 5) {
            cache.set(i as u32, i as u64, breaks.clone(), 1);
        }

        assert!(cache.len() <= MAX_CACHE_ENTRIES);
    }

    #[test]
    fn test_cached_layout_computer() {
        let computer = CachedLayoutComputer::new();

        let items: Vec<GalleryItem> = (0..10)
            .map(|i| make_item(&format!("{}.jpg", i), 1920, 1080, i as i64))
            .collect();

        let rows1 = computer.compute(&items, 1920.0);
        assert!(!rows1.is_empty());

        // Second compute is a hit and must reproduce the layout exactly.
        let rows2 = computer.compute(&items, 1920.0);
        assert_eq!(rows1, rows2);
        assert!(!computer.cache.is_empty());
    }

    #[test]
    fn test_set_layout_invalidates() {
        let mut computer = CachedLayoutComputer::new();
        let items: Vec<GalleryItem> = (0..6)
            .map(|i| make_item(&format!("{}.jpg", i), 1920, 1080, i as i64))
            .collect();

        let before = computer.compute(&items, 1920.0);
        assert!(!computer.cache.is_empty());

        computer.set_layout(JustifiedLayout::new(160.0, 4.0));
        assert!(computer.cache.is_empty());

        let after = computer.compute(&items, 1920.0);
        assert_ne!(before, after);
    }

    #[test]
    fn test_empty_items() {
        let computer = CachedLayoutComputer::new();
        let rows = computer.compute(&[], 1920.0);
        assert!(rows.is_empty());
        assert!(computer.cache.is_empty());
    }
}
