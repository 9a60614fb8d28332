pub mod cache;
pub mod codec;
pub mod source;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::error::Result;
use crate::types::{PolygonRing, RingKey};

pub use cache::{CacheEntry, PolygonCache, RingStatus};
pub use source::{FsRingSource, MemoryRingSource, RingSource};

/// Result of asking the store for a ring.
#[derive(Debug, Clone)]
pub enum RingLoad {
    Loaded(Arc<PolygonRing>),
    /// The ring could not be read or decoded. The failure was logged.
    Unavailable,
}

impl RingLoad {
    pub fn into_ring(self) -> Option<Arc<PolygonRing>> {
        match self {
            RingLoad::Loaded(ring) => Some(ring),
            RingLoad::Unavailable => None,
        }
    }
}

/// Lazy, memoizing ring loader.
///
/// Consults the shared [`PolygonCache`] first and only touches the
/// [`RingSource`] on a miss. Read and decode failures never surface as
/// errors: they are logged, recorded as `Unavailable` and retried on the
/// next load of the same key.
pub struct PolygonStore<S> {
    source: S,
    cache: Arc<PolygonCache>,
    reads: AtomicU64,
}

impl<S: RingSource> PolygonStore<S> {
    /// Store with its own fresh cache.
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(PolygonCache::new()))
    }

    /// Store that shares an existing cache.
    pub fn with_cache(source: S, cache: Arc<PolygonCache>) -> Self {
        Self {
            source,
            cache,
            reads: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &Arc<PolygonCache> {
        &self.cache
    }

    /// Number of reads issued against the backing source so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn status(&self, key: &RingKey) -> RingStatus {
        self.cache.status(key)
    }

    /// Load a ring, from cache when possible.
    ///
    /// Concurrent misses on the same key may each read and decode; the
    /// first stored result wins and all callers get identical data.
    pub fn load(&self, key: &RingKey) -> RingLoad {
        if let Some(ring) = self.cache.loaded(key) {
            trace!(ring = %key, "Ring cache hit");
            return RingLoad::Loaded(ring);
        }

        match self.fetch(key) {
            Ok(ring) => {
                trace!(ring = %key, vertices = ring.vertex_count(), "Ring loaded");
                let ring = self.cache.insert_loaded(key.clone(), Arc::new(ring));
                RingLoad::Loaded(ring)
            }
            Err(e) => {
                warn!(ring = %key, error = %e, "Ring unavailable, dropping candidate");
                self.cache.mark_unavailable(key.clone(), e.to_string());
                RingLoad::Unavailable
            }
        }
    }

    fn fetch(&self, key: &RingKey) -> Result<PolygonRing> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let bytes = self.source.read(key)?;
        let vertices = codec::decode_ring(&bytes)?;
        Ok(PolygonRing::new(vertices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::codec::encode_ring;

    fn square_bytes() -> Vec<u8> {
        encode_ring(&[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]])
    }

    fn store_with(entries: &[(&str, u32, Vec<u8>)]) -> PolygonStore<MemoryRingSource> {
        let mut src = MemoryRingSource::new();
        for (tz, i, bytes) in entries {
            src.insert(RingKey::new(*tz, *i), bytes.clone());
        }
        PolygonStore::new(src)
    }

    #[test]
    fn second_load_hits_cache_without_io() {
        let store = store_with(&[("Europe/Madrid", 0, square_bytes())]);
        let key = RingKey::new("Europe/Madrid", 0);

        let first = store.load(&key).into_ring().unwrap();
        assert_eq!(store.reads(), 1);
        let second = store.load(&key).into_ring().unwrap();
        assert_eq!(store.reads(), 1, "second load must not touch the source");

        assert!(Arc::ptr_eq(&first, &second));
        let a: Vec<_> = first.vertices().collect();
        let b: Vec<_> = second.vertices().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_ring_is_unavailable_not_error() {
        let store = store_with(&[]);
        let key = RingKey::new("Europe/Madrid", 7);
        assert_eq!(store.status(&key), RingStatus::NotAttempted);

        assert!(matches!(store.load(&key), RingLoad::Unavailable));
        assert_eq!(store.status(&key), RingStatus::Unavailable);
    }

    #[test]
    fn unavailable_ring_is_retried() {
        let store = store_with(&[]);
        let key = RingKey::new("Europe/Madrid", 7);
        store.load(&key);
        store.load(&key);
        assert_eq!(store.reads(), 2);
    }

    #[test]
    fn truncated_ring_is_unavailable() {
        let mut bytes = square_bytes();
        bytes.truncate(bytes.len() - 3);
        let store = store_with(&[("Africa/Cairo", 0, bytes)]);
        let key = RingKey::new("Africa/Cairo", 0);

        assert!(store.load(&key).into_ring().is_none());
        match store.cache().entry(&key) {
            Some(CacheEntry::Unavailable(reason)) => assert!(reason.contains("truncated")),
            other => panic!("expected unavailable entry, got {other:?}"),
        }
    }

    #[test]
    fn stores_can_share_a_cache() {
        let cache = Arc::new(PolygonCache::new());
        let mut src = MemoryRingSource::new();
        src.insert(RingKey::new("UTC", 0), square_bytes());

        let a = PolygonStore::with_cache(src.clone(), Arc::clone(&cache));
        let b = PolygonStore::with_cache(src, Arc::clone(&cache));

        a.load(&RingKey::new("UTC", 0));
        b.load(&RingKey::new("UTC", 0));
        assert_eq!(a.reads(), 1);
        assert_eq!(b.reads(), 0);
    }

    #[test]
    fn concurrent_cold_loads_agree() {
        let store = store_with(&[("Asia/Kolkata", 0, square_bytes())]);
        let key = RingKey::new("Asia/Kolkata", 0);

        let rings: Vec<Arc<PolygonRing>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.load(&key).into_ring().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let cached = store.cache().loaded(&key).unwrap();
        for ring in &rings {
            assert!(Arc::ptr_eq(ring, &cached));
        }
        assert!(store.reads() >= 1 && store.reads() <= 8);
    }

    #[test]
    fn load_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("Europe%2FOslo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0.bin"), square_bytes()).unwrap();

        let store = PolygonStore::new(FsRingSource::new(tmp.path()));
        let ring = store.load(&RingKey::new("Europe/Oslo", 0)).into_ring().unwrap();
        assert_eq!(ring.vertex_count(), 4);
        assert!(store.load(&RingKey::new("Europe/Oslo", 1)).into_ring().is_none());
    }
}
