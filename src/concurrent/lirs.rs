//! Concurrent LIRS Cache Implementation
//!
//! A thread-safe LIRS cache using lock striping (segmented storage). This is the
//! multi-threaded counterpart to [`LirsCache`](crate::LirsCache).
//!
//! # How It Works
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      ConcurrentLirsCache                             │
//! │                                                                      │
//! │  (spread(hash(key)) >> 32) & (N - 1)  ──▶  Segment Selection         │
//! │                                                                      │
//! │  ┌──────────────┐ ┌──────────────┐     ┌──────────────┐              │
//! │  │  Segment 0   │ │  Segment 1   │ ... │  Segment N-1 │              │
//! │  │  ┌────────┐  │ │  ┌────────┐  │     │  ┌────────┐  │              │
//! │  │  │ RwLock │  │ │  │ RwLock │  │     │  │ RwLock │  │              │
//! │  │  └────┬───┘  │ │  └────┬───┘  │     │  └────┬───┘  │              │
//! │  │  ┌────▼────┐ │ │  ┌────▼────┐ │     │  ┌────▼────┐ │              │
//! │  │  │  LIRS   │ │ │  │  LIRS   │ │     │  │  LIRS   │ │              │
//! │  │  └─────────┘ │ │  └─────────┘ │     │  └─────────┘ │              │
//! │  └──────────────┘ └──────────────┘     └──────────────┘              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The segment count is a power of two. The key's hash is mixed once more
//! before its upper bits pick the segment, so hashers with weak high bits
//! still spread keys evenly.
//!
//! ## Locking
//!
//! - `peek`, `contains_key`, `get_memory`: read lock only.
//! - `get`: looks the key up under the read lock and copies the value out.
//!   Most hits on hot entries end there, because hot entries are only moved
//!   on the stack after `stack_move_distance` other moves. Otherwise the read
//!   lock is released, the write lock taken, and the promotion re-checked.
//! - `put`, `remove`, `clear`: write lock.
//!
//! Whole-cache queries (`len`, `used_memory`, `keys`, ...) lock one segment at
//! a time and are not a consistent snapshot under concurrent writes.
//!
//! # Example
//!
//! ```
//! use lirs_cache::ConcurrentLirsCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache: Arc<ConcurrentLirsCache<String, usize>> =
//!     Arc::new(ConcurrentLirsCache::new(10_000).unwrap());
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|i| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for j in 0..1000 {
//!                 cache.put(format!("key-{i}-{j}"), j);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 4000);
//! ```

extern crate alloc;

use crate::config::lirs::{validate_average_memory, validate_max_memory};
use crate::config::{ConcurrentCacheConfig, ConcurrentLirsCacheConfig, LirsCacheConfig};
use crate::error::Result;
use crate::lirs::{segment_budget, LirsSegment, SegmentLimits};
use crate::metrics::{hit_rate, CacheMetrics};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::RwLock;
use tracing::debug;

use hashbrown::DefaultHashBuilder;

/// Bits of the mixed hash below the ones used for segment selection.
const SEGMENT_SHIFT: u32 = 32;

/// 64-bit finalizer (MurmurHash3 `fmix64`).
#[inline]
fn spread(hash: u64) -> u64 {
    let mut h = hash;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// A thread-safe LIRS cache with segmented storage for high concurrency.
///
/// `max_memory` is split evenly over the segments and each segment evicts on
/// its own, so the policy is LIRS per segment rather than globally.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Must implement `Clone` for the owned-value accessors.
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`.
///
/// # Example
///
/// ```
/// use lirs_cache::ConcurrentLirsCache;
///
/// // 1MB budget, 1KB average entries, 16 segments, stack move distance 10
/// let cache = ConcurrentLirsCache::with_limits(1 << 20, 1024, 16, 10).unwrap();
///
/// cache.put_with_memory("config".to_string(), vec![0u8; 2048], 2048);
/// assert_eq!(cache.get_with("config", |v: &Vec<u8>| v.len()), Some(2048));
/// assert_eq!(cache.used_memory(), 2048);
/// ```
pub struct ConcurrentLirsCache<K, V, S = DefaultHashBuilder> {
    segments: Box<[RwLock<LirsSegment<K, V, S>>]>,
    hash_builder: S,
    segment_mask: usize,
    max_memory: AtomicU64,
    average_memory: AtomicU64,
}

impl<K: Hash + Eq, V> ConcurrentLirsCache<K, V, DefaultHashBuilder> {
    /// Creates a count-bounded cache with 16 segments: every entry costs 1 and
    /// the stack move distance is `max_entries / 100`.
    ///
    /// # Errors
    ///
    /// Fails if `max_entries` is 0.
    pub fn new(max_entries: u64) -> Result<Self> {
        let config = ConcurrentCacheConfig::new(LirsCacheConfig::with_max_entries(max_entries));
        Self::init(config, None)
    }

    /// Creates a cache from explicit limits.
    ///
    /// # Errors
    ///
    /// Fails if `max_memory` or `average_memory` is 0, or if `segment_count`
    /// is not a power of two.
    pub fn with_limits(
        max_memory: u64,
        average_memory: u64,
        segment_count: usize,
        stack_move_distance: u64,
    ) -> Result<Self> {
        let base = LirsCacheConfig::new(max_memory)
            .with_average_memory(average_memory)
            .with_stack_move_distance(stack_move_distance);
        Self::init(ConcurrentCacheConfig::new(base).with_segments(segment_count), None)
    }

    /// Creates a cache from `config`, with `hasher` or the default hasher.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::InvalidConfiguration`](crate::LirsError) if the
    /// configuration is invalid. Nothing is allocated in that case.
    pub fn init(
        config: ConcurrentLirsCacheConfig,
        hasher: Option<DefaultHashBuilder>,
    ) -> Result<Self> {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<K, V, S> ConcurrentLirsCache<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates a cache from `config` using `hash_builder` for routing and for
    /// every segment's index.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::InvalidConfiguration`](crate::LirsError) if the
    /// configuration is invalid.
    pub fn init_with_hasher(config: ConcurrentLirsCacheConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        let limits = SegmentLimits::for_segment(&config.base, config.segments);
        let segments: Vec<_> = (0..config.segments)
            .map(|_| RwLock::new(LirsSegment::with_hasher(limits, hash_builder.clone())))
            .collect();

        Ok(ConcurrentLirsCache {
            segments: segments.into_boxed_slice(),
            hash_builder,
            segment_mask: config.segments - 1,
            max_memory: AtomicU64::new(config.base.max_memory),
            average_memory: AtomicU64::new(config.base.average_memory),
        })
    }

    #[inline]
    fn segment_index<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let hash = spread(self.hash_builder.hash_one(key));
        (hash >> SEGMENT_SHIFT) as usize & self.segment_mask
    }

    #[inline]
    fn segment_for<Q>(&self, key: &Q) -> &RwLock<LirsSegment<K, V, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        &self.segments[self.segment_index(key)]
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns a clone of the value for `key` and records the reference.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    /// Applies `f` to the value for `key` under the segment's read lock and
    /// records the reference.
    ///
    /// # Example
    ///
    /// ```
    /// use lirs_cache::ConcurrentLirsCache;
    ///
    /// let cache = ConcurrentLirsCache::new(100).unwrap();
    /// cache.put("greeting".to_string(), "hello world".to_string());
    /// let len = cache.get_with("greeting", |v: &String| v.len());
    /// assert_eq!(len, Some(11));
    /// ```
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        let segment = self.segment_for(key);
        let (result, promote) = {
            let guard = segment.read();
            let (value, promote) = guard.lookup(key)?;
            (f(value), promote)
        };
        if promote {
            segment.write().touch(key);
        }
        Some(result)
    }

    /// Returns a clone of the value for `key` without recording a reference.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.peek_with(key, V::clone)
    }

    /// Applies `f` to the value for `key` without recording a reference.
    pub fn peek_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.segment_for(key).read().peek(key).map(f)
    }

    /// Whether a resident value exists for `key`. Does not record a reference.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment_for(key).read().contains_key(key)
    }

    /// Declared memory of `key`'s entry, 0 if it is not resident.
    pub fn get_memory<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment_for(key).read().get_memory(key)
    }

    /// Inserts `key` with the average memory cost, returning the previous
    /// resident value.
    pub fn put(&self, key: K, value: V) -> Option<V>
    where
        K: Clone,
    {
        let memory = self.average_memory();
        self.put_with_memory(key, value, memory)
    }

    /// Inserts `key` with an explicit memory cost, returning the previous
    /// resident value. May evict cold entries of the same segment.
    pub fn put_with_memory(&self, key: K, value: V, memory: u64) -> Option<V>
    where
        K: Clone,
    {
        self.segment_for(&key).write().put(key, value, memory)
    }

    /// Removes `key`, returning its value if it was resident.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment_for(key).write().remove(key)
    }

    /// Removes every entry and re-sizes each segment's index from the current
    /// limits. Metrics are kept.
    pub fn clear(&self) {
        debug!(segments = self.segments.len(), "clearing cache");
        for segment in self.segments.iter() {
            segment.write().clear();
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.fold(|s| s.len())
    }

    /// Whether no entry is resident.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.read().len() == 0)
    }

    /// Number of hot entries.
    pub fn size_hot(&self) -> usize {
        self.fold(|s| s.size_hot())
    }

    /// Number of non-resident history entries.
    pub fn size_non_resident(&self) -> usize {
        self.fold(|s| s.size_non_resident())
    }

    /// Total capacity of the segment indexes.
    pub fn size_map_array(&self) -> usize {
        self.fold(|s| s.size_map_array())
    }

    /// Total declared memory of resident entries, saturating at `u64::MAX`.
    pub fn used_memory(&self) -> u64 {
        self.segments
            .iter()
            .fold(0_u64, |acc, s| acc.saturating_add(s.read().used_memory()))
    }

    /// The configured memory budget.
    pub fn max_memory(&self) -> u64 {
        self.max_memory.load(Ordering::Relaxed)
    }

    /// Memory assumed by [`put`](Self::put).
    pub fn average_memory(&self) -> u64 {
        self.average_memory.load(Ordering::Relaxed)
    }

    /// Changes the memory budget and splits it over the segments. Segments
    /// over their new share shrink on their next insertion.
    ///
    /// # Errors
    ///
    /// Fails if `max_memory` is 0; the cache is left unchanged.
    pub fn set_max_memory(&self, max_memory: u64) -> Result<()> {
        validate_max_memory(max_memory)?;
        let share = segment_budget(max_memory, self.segments.len());
        debug!(max_memory, segment_max_memory = share, "set max memory");
        self.max_memory.store(max_memory, Ordering::Relaxed);
        for segment in self.segments.iter() {
            segment.write().set_max_memory(share);
        }
        Ok(())
    }

    /// Changes the memory assumed by [`put`](Self::put). Indexes are re-sized
    /// for it on the next [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Fails if `average_memory` is 0; the cache is left unchanged.
    pub fn set_average_memory(&self, average_memory: u64) -> Result<()> {
        validate_average_memory(average_memory)?;
        debug!(average_memory, "set average memory");
        self.average_memory.store(average_memory, Ordering::Relaxed);
        for segment in self.segments.iter() {
            segment.write().set_average_memory(average_memory);
        }
        Ok(())
    }

    /// Keys in per-segment recency order; see [`LirsCache::keys`](crate::LirsCache::keys).
    pub fn keys(&self, cold: bool, non_resident: bool) -> Vec<K>
    where
        K: Clone,
    {
        self.collect(|s| s.keys(cold, non_resident))
    }

    /// All resident keys.
    pub fn key_set(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.collect(|s| s.key_set())
    }

    /// All resident entries as owned pairs.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.collect(|s| s.entries())
    }

    /// Verifies every segment's bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::Invariant`](crate::LirsError) describing the first
    /// inconsistency found.
    pub fn check_invariants(&self) -> Result<()> {
        self.segments
            .iter()
            .try_for_each(|s| s.read().check_invariants())
    }

    fn fold(&self, f: impl Fn(&LirsSegment<K, V, S>) -> usize) -> usize {
        self.segments.iter().map(|s| f(&s.read())).sum()
    }

    fn collect<T>(&self, f: impl Fn(&LirsSegment<K, V, S>) -> Vec<T>) -> Vec<T> {
        let mut out = Vec::new();
        for segment in self.segments.iter() {
            out.extend(f(&segment.read()));
        }
        out
    }
}

impl<K, V, S> CacheMetrics for ConcurrentLirsCache<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut aggregated = BTreeMap::new();
        for segment in self.segments.iter() {
            for (key, value) in segment.read().metrics_map() {
                *aggregated.entry(key).or_insert(0.0) += value;
            }
        }

        // Rates do not add up across segments.
        let requests = aggregated.get("requests").copied().unwrap_or(0.0);
        let hits = aggregated.get("cache_hits").copied().unwrap_or(0.0);
        aggregated.insert(
            "hit_rate".to_string(),
            hit_rate(hits as u64, requests as u64),
        );
        aggregated.insert("segments".to_string(), self.segments.len() as f64);
        aggregated
    }

    fn algorithm_name(&self) -> &'static str {
        "ConcurrentLIRS"
    }
}

impl<K, V, S> core::fmt::Debug for ConcurrentLirsCache<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConcurrentLirsCache")
            .field("segment_count", &self.segments.len())
            .field("max_memory", &self.max_memory())
            .field("used_memory", &self.used_memory())
            .field("len", &self.len())
            .finish()
    }
}
