use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::types::{PolygonRing, RingKey};

/// Outcome recorded for a ring after a load attempt.
#[derive(Debug, Clone)]
pub enum CacheEntry {
    Loaded(Arc<PolygonRing>),
    /// The last attempt failed; carries the failure text.
    Unavailable(String),
}

/// Where a ring stands in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingStatus {
    NotAttempted,
    Unavailable,
    Loaded,
}

/// Decoded rings keyed by (timezone id, ring index).
///
/// One instance is shared by every resolver of a process (hand it around
/// as `Arc<PolygonCache>`). Entries live until the cache is dropped: no
/// eviction, no TTL, no size bound. The dataset is static and holds a few
/// thousand rings.
///
/// # Thread Safety
///
/// Backed by `DashMap` (concurrent reads, per-shard write locks). Writes
/// for one key are idempotent: the first `Loaded` value stored wins and
/// later racers receive that same `Arc`.
#[derive(Debug, Default)]
pub struct PolygonCache {
    entries: DashMap<RingKey, CacheEntry>,
}

impl PolygonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached ring for `key`, if it has been loaded.
    pub fn loaded(&self, key: &RingKey) -> Option<Arc<PolygonRing>> {
        match self.entries.get(key)?.value() {
            CacheEntry::Loaded(ring) => Some(Arc::clone(ring)),
            CacheEntry::Unavailable(_) => None,
        }
    }

    /// Cloned entry for `key`, if any attempt was recorded.
    pub fn entry(&self, key: &RingKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn status(&self, key: &RingKey) -> RingStatus {
        match self.entries.get(key).as_deref() {
            None => RingStatus::NotAttempted,
            Some(CacheEntry::Unavailable(_)) => RingStatus::Unavailable,
            Some(CacheEntry::Loaded(_)) => RingStatus::Loaded,
        }
    }

    /// Store a decoded ring and return the cached value for `key`.
    ///
    /// When another caller stored the ring first, its `Arc` is returned and
    /// `ring` is dropped.
    pub fn insert_loaded(&self, key: RingKey, ring: Arc<PolygonRing>) -> Arc<PolygonRing> {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if let CacheEntry::Loaded(existing) = occupied.get() {
                    return Arc::clone(existing);
                }
                occupied.insert(CacheEntry::Loaded(Arc::clone(&ring)));
                ring
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::Loaded(Arc::clone(&ring)));
                ring
            }
        }
    }

    /// Record a failed attempt. A ring that is already loaded stays loaded.
    pub fn mark_unavailable(&self, key: RingKey, reason: String) {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if matches!(occupied.get(), CacheEntry::Unavailable(_)) {
                    occupied.insert(CacheEntry::Unavailable(reason));
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry::Unavailable(reason));
            }
        }
    }

    /// Number of keys with any recorded outcome.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of successfully loaded rings.
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.value(), CacheEntry::Loaded(_)))
            .count()
    }
}
