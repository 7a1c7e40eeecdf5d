use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use common::image_cache::DecodedImage;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejected: u64,
}

struct LruState {
    entries: LruCache<String, Arc<DecodedImage>>,
    bytes_used: usize,
}

/// Size-bounded LRU of decoded images keyed by URL.
///
/// Downloads complete on worker threads while lookups come from the UI
/// task, so every operation goes through the internal mutex. The sum of
/// `byte_size()` over all entries never exceeds `capacity`.
pub struct MemoryCache {
    capacity: usize,
    state: Mutex<LruState>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    rejected: AtomicU64,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(LruState {
                entries: LruCache::unbounded(),
                bytes_used: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn get(&self, url: &str) -> Option<Arc<DecodedImage>> {
        let image = self.state.lock().entries.get(url).cloned();

        match image {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };

        image
    }

    /// Stores an image and evicts least recently used entries until the
    /// cache fits its capacity again. An image bigger than the capacity is
    /// dropped and leaves the cache untouched.
    pub fn put(&self, url: &str, image: Arc<DecodedImage>) {
        let size = image.byte_size();

        if size > self.capacity {
            debug!(
                "Not caching {} ({} bytes), capacity is {} bytes",
                url, size, self.capacity
            );
            self.rejected.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut state = self.state.lock();

        if let Some(previous) = state.entries.put(url.to_string(), image) {
            state.bytes_used -= previous.byte_size();
        }
        state.bytes_used += size;

        while state.bytes_used > self.capacity {
            let Some((evicted_url, evicted)) = state.entries.pop_lru() else {
                break;
            };

            state.bytes_used -= evicted.byte_size();
            self.evictions.fetch_add(1, Ordering::Relaxed);

            debug!("Evicted {} ({} bytes)", evicted_url, evicted.byte_size());
        }
    }

    /// Presence check that does not touch recency or statistics
    pub fn contains(&self, url: &str) -> bool {
        self.state.lock().entries.contains(url)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bytes_used(&self) -> usize {
        self.state.lock().bytes_used
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
