//! Loader result cache and revalidation bookkeeping.
//!
//! # Responsibilities
//! - Remember the last resolved loader result per (node, params) pair
//! - Serve fresh results without re-invoking loaders
//! - Mark everything stale after a successful action
//!
//! # Design Decisions
//! - Stale entries keep their value; hosts can show the previous data
//!   while the revalidation pass runs
//! - Writes are stamped with the generation of the navigation that
//!   produced them; invalidation raises a floor that stales every older
//!   generation, so a superseded navigation's late write is never served
//!   fresh
//! - Session-scoped only; nothing survives a process reload

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::observability::metrics;
use crate::routing::params::RouteParams;
use crate::routing::tree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    node: NodeId,
    params: RouteParams,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    /// Generation of the navigation that stored this entry.
    generation: u64,
}

/// What the cache knows about a (node, params) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Last result is current; the loader can be skipped.
    Fresh(Value),
    /// A result exists but must be re-fetched before serving.
    Stale(Value),
    /// Never loaded.
    Miss,
}

/// In-memory loader result cache keyed by route node and parameters.
#[derive(Debug, Default)]
pub struct DataCache {
    entries: DashMap<CacheKey, CacheEntry>,
    /// Entries stored by a generation below this floor are stale.
    stale_floor: AtomicU64,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, node: NodeId, params: &RouteParams) -> CacheLookup {
        let key = CacheKey {
            node,
            params: params.clone(),
        };
        let floor = self.stale_floor.load(Ordering::SeqCst);
        match self.entries.get(&key) {
            Some(entry) if entry.generation < floor => CacheLookup::Stale(entry.value.clone()),
            Some(entry) => CacheLookup::Fresh(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Record a resolved loader result, stamped with the generation of
    /// the navigation that produced it. A write from an older generation
    /// never clobbers one from a newer generation.
    pub fn store(&self, node: NodeId, params: &RouteParams, value: Value, generation: u64) {
        let key = CacheKey {
            node,
            params: params.clone(),
        };
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().generation <= generation {
                    occupied.insert(CacheEntry { value, generation });
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry { value, generation });
            }
        }
    }

    /// Raise the staleness floor to `generation`: every entry stored by
    /// an older navigation becomes stale, including writes that land
    /// after this call. Called after each successful action so the next
    /// loader pass re-fetches instead of serving cached data.
    pub fn invalidate_all(&self, generation: u64) {
        self.stale_floor.fetch_max(generation, Ordering::SeqCst);
        metrics::cache_invalidated();
        tracing::debug!(
            entries = self.entries.len(),
            floor = generation,
            "cache invalidated"
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
