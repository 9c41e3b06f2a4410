// SPDX-License-Identifier: MPL-2.0
//! In-memory cache of decoded images for the HTTP loader.
//!
//! LRU-evicted and bounded both by entry count and by total pixel bytes.
//! Keyed by the resource's cache key, not its URL, so signed URLs with
//! rotating query parameters can share one entry.

use crate::image_data::ImageData;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Default cache size in bytes (32 MB).
pub const DEFAULT_CACHE_BYTES: usize = 32 * 1024 * 1024;

/// Default maximum number of images to cache.
pub const DEFAULT_MAX_IMAGES: usize = 64;

/// Configuration for the memory cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum cache size in bytes.
    pub max_bytes: usize,

    /// Maximum number of images to cache.
    pub max_images: usize,

    /// Whether caching is enabled.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_CACHE_BYTES,
            max_images: DEFAULT_MAX_IMAGES,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Creates a disabled cache configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub image_count: usize,
    pub total_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub insertions: u64,
}

impl CacheStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// LRU cache mapping cache keys to decoded images.
pub struct ImageMemoryCache {
    cache: LruCache<String, ImageData>,
    config: CacheConfig,
    current_bytes: usize,
    stats: CacheStats,
}

impl ImageMemoryCache {
    /// Creates a new cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_images)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_MAX_IMAGES).expect("non-zero default"));
        Self {
            cache: LruCache::new(capacity),
            config,
            current_bytes: 0,
            stats: CacheStats::default(),
        }
    }

    /// Creates a new cache with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Inserts an image under `key`.
    ///
    /// Returns `true` if the image was inserted, `false` if caching is
    /// disabled or the image is larger than half the byte budget.
    pub fn insert(&mut self, key: String, image: ImageData) -> bool {
        if !self.config.enabled {
            return false;
        }

        let image_bytes = image.byte_len();
        if image_bytes > self.config.max_bytes / 2 {
            return false;
        }

        while self.current_bytes + image_bytes > self.config.max_bytes && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_bytes = self.current_bytes.saturating_sub(evicted.byte_len());
                self.stats.evictions += 1;
            }
        }

        if let Some(existing) = self.cache.pop(&key) {
            self.current_bytes = self.current_bytes.saturating_sub(existing.byte_len());
        }

        self.current_bytes += image_bytes;
        self.cache.put(key, image);
        self.stats.insertions += 1;
        self.stats.image_count = self.cache.len();
        self.stats.total_bytes = self.current_bytes;

        true
    }

    /// Gets an image by key, updating LRU order on a hit.
    pub fn get(&mut self, key: &str) -> Option<ImageData> {
        if !self.config.enabled {
            return None;
        }

        if let Some(image) = self.cache.get(key) {
            self.stats.hits += 1;
            Some(image.clone())
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Checks for a key without updating LRU order.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.config.enabled && self.cache.contains(key)
    }

    /// Clears all cached images.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.current_bytes = 0;
        self.stats.image_count = 0;
        self.stats.total_bytes = 0;
    }

    /// Returns the current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns the current memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.current_bytes
    }
}

impl std::fmt::Debug for ImageMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageMemoryCache")
            .field("enabled", &self.config.enabled)
            .field("image_count", &self.cache.len())
            .field("memory_usage", &self.current_bytes)
            .field("max_bytes", &self.config.max_bytes)
            .field("max_images", &self.config.max_images)
            .field("stats", &self.stats)
            .finish()
    }
}
