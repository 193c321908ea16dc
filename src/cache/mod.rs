//! Kernel row cache
//!
//! SMO touches whole kernel rows when it updates the gradient, so rows
//! K(i, ·) are cached rather than single entries. Least recently used rows
//! are evicted once the byte budget is exhausted.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// LRU cache of kernel matrix rows
pub struct KernelCache {
    rows: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a kernel cache for rows of `row_len` entries within a byte budget
    ///
    /// At least two rows are always kept, since every SMO step needs a pair.
    pub fn with_memory_limit(memory_bytes: usize, row_len: usize) -> Self {
        let row_bytes = (row_len * std::mem::size_of::<f64>()).max(1);
        Self::new((memory_bytes / row_bytes).max(2))
    }

    /// Get row `i`, computing and caching it on a miss
    pub fn row<F>(&mut self, i: usize, compute: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.rows.get(&i) {
            self.hits += 1;
            return Arc::clone(row);
        }
        self.misses += 1;
        let row: Arc<[f64]> = compute().into();
        self.rows.put(i, Arc::clone(&row));
        row
    }

    /// Whether row `i` is currently cached (does not touch LRU order)
    pub fn contains(&self, i: usize) -> bool {
        self.rows.contains(&i)
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
