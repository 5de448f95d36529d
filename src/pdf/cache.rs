//! LRU cache for rendered pages and thumbnails

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::request::{PageBitmap, RenderKind};

/// Cache key for rendered pages
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Page number (1-based)
    pub page: usize,
    /// Scale factor (stored as millionths for stable hashing)
    pub scale_millionths: u32,
    pub kind: RenderKind,
}

impl CacheKey {
    #[must_use]
    pub fn new(page: usize, scale: f32, kind: RenderKind) -> Self {
        Self {
            page,
            scale_millionths: (scale * 1_000_000.0).round() as u32,
            kind,
        }
    }
}

/// LRU cache for rendered page bitmaps
pub struct PageCache {
    cache: LruCache<CacheKey, Arc<PageBitmap>>,
}

impl PageCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached page, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<PageBitmap>> {
        self.cache.get(key).cloned()
    }

    /// Check if a key is in the cache without promoting it
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a page into the cache, returning an Arc to the data
    pub fn insert(&mut self, key: CacheKey, data: PageBitmap) -> Arc<PageBitmap> {
        let arc = Arc::new(data);
        self.cache.put(key, Arc::clone(&arc));
        arc
    }

    /// Number of cached pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
