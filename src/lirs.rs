//! Low Inter-reference Recency Set (LIRS) Cache Implementation
//!
//! LIRS ranks entries by how recently they were referenced *twice*, not once.
//! Entries with a short reuse distance are "hot" and are never evicted
//! directly; everything else is "cold" and competes for a small slice of the
//! budget. A one-time scan therefore only churns through the cold slice and
//! leaves the hot working set alone.
//!
//! # Algorithm
//!
//! Each segment keeps three intrusive lists over its entries:
//!
//! ```text
//!   stack  (recency, head = most recent)
//!   ┌────┬────┬────┬────┬────┬────┐
//!   │ c1 │ H3 │ n2 │ H1 │ c2 │ H2 │   bottom is always hot
//!   └────┴────┴────┴────┴────┴────┘
//!
//!   queue  (resident cold)          queue2 (non-resident cold, history)
//!   ┌────┬────┐                     ┌────┐
//!   │ c1 │ c2 │ ──evict tail──▶     │ n2 │ ──drop tail when too long──▶ ∅
//!   └────┴────┘                     └────┘
//! ```
//!
//! - A cold entry referenced while it is still on the stack has a reuse
//!   distance shorter than the oldest hot entry's, so it becomes hot and the
//!   stack bottom is demoted to cold.
//! - Eviction takes the tail of the resident cold queue. The entry's value is
//!   dropped but its key stays as history, so a quick return can be recognised.
//! - History is bounded: the non-resident queue is kept at most half the
//!   stack length.
//!
//! This is an approximation of LIRS: the cold fraction is a lower bound
//! enforced during eviction (1/32 by default), and hot entries are only moved
//! on the stack when they have drifted far enough from its head.
//!
//! # Performance Characteristics
//!
//! - `get`, `peek`, `put`, `remove`: O(1) expected; `put` may demote or evict
//!   several entries but each entry is demoted/evicted at most once per insertion.
//! - Memory: one arena slot per known key (resident or history) plus the index.
//!
//! # Thread Safety
//!
//! [`LirsCache`] is not thread-safe. Use `ConcurrentLirsCache` (feature
//! `concurrent`) for shared access.

extern crate alloc;

use crate::config::LirsCacheConfig;
use crate::entry::LirsEntry;
use crate::error::{LirsError, Result};
use crate::list::{Arena, Chain, List, NodeId};
use crate::metrics::{CacheMetrics, LirsCacheMetrics};
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

use hashbrown::DefaultHashBuilder;
use hashbrown::HashMap;
use tracing::{debug, trace};

/// Upper bound on the number of keys an index is pre-sized for.
const MAX_PREALLOCATED_KEYS: u64 = 1 << 16;

/// Limits and tuning values of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentLimits {
    pub(crate) max_memory: u64,
    pub(crate) average_memory: u64,
    pub(crate) stack_move_distance: u64,
    pub(crate) cold_ratio_shift: u32,
}

impl SegmentLimits {
    /// Limits for one of `segments` equal shares of `config`.
    pub(crate) fn for_segment(config: &LirsCacheConfig, segments: usize) -> Self {
        SegmentLimits {
            max_memory: segment_budget(config.max_memory, segments),
            average_memory: config.average_memory,
            stack_move_distance: config.resolved_stack_move_distance(),
            cold_ratio_shift: config.cold_ratio_shift,
        }
    }

    fn index_capacity(&self) -> usize {
        let expected = (self.max_memory / self.average_memory.max(1))
            .clamp(8, MAX_PREALLOCATED_KEYS)
            .next_power_of_two();
        usize::try_from(expected).unwrap_or(8)
    }
}

/// Share of `max_memory` given to each of `segments` segments, at least 1.
pub(crate) fn segment_budget(max_memory: u64, segments: usize) -> u64 {
    let segments = u64::try_from(segments).unwrap_or(u64::MAX).max(1);
    (max_memory / segments).max(1)
}

/// Internal LIRS segment containing the actual cache algorithm.
///
/// Shared by `LirsCache` (single-threaded) and `ConcurrentLirsCache`
/// (one segment per lock). All policy logic lives here.
pub(crate) struct LirsSegment<K, V, S = DefaultHashBuilder> {
    map: HashMap<K, NodeId, S>,
    entries: Arena<LirsEntry<K, V>>,
    /// Recency stack: hot entries plus recently referenced cold ones.
    stack: List,
    /// Resident cold entries; the tail is evicted first.
    queue: List,
    /// Non-resident cold entries (history); the tail is dropped first.
    queue2: List,
    limits: SegmentLimits,
    /// Sum of resident costs. Wider than a single cost so it cannot wrap.
    used_memory: u128,
    stack_move_counter: u64,
    metrics: LirsCacheMetrics,
}

impl<K, V, S> LirsSegment<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub(crate) fn with_hasher(limits: SegmentLimits, hash_builder: S) -> Self {
        let capacity = limits.index_capacity();
        LirsSegment {
            map: HashMap::with_capacity_and_hasher(capacity, hash_builder),
            entries: Arena::with_capacity(capacity),
            stack: List::new(Chain::Stack),
            queue: List::new(Chain::Queue),
            queue2: List::new(Chain::Queue),
            limits,
            used_memory: 0,
            stack_move_counter: 0,
            metrics: LirsCacheMetrics::default(),
        }
    }

    /// Number of resident entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len() - self.queue2.len()
    }

    #[inline]
    pub(crate) fn size_hot(&self) -> usize {
        self.map.len() - self.queue.len() - self.queue2.len()
    }

    #[inline]
    pub(crate) fn size_non_resident(&self) -> usize {
        self.queue2.len()
    }

    /// Capacity of the key index, including room for history entries.
    #[inline]
    pub(crate) fn size_map_array(&self) -> usize {
        self.map.capacity()
    }

    #[inline]
    pub(crate) fn used_memory(&self) -> u64 {
        u64::try_from(self.used_memory).unwrap_or(u64::MAX)
    }

    #[inline]
    pub(crate) fn limits(&self) -> SegmentLimits {
        self.limits
    }

    #[inline]
    pub(crate) fn lirs_metrics(&self) -> &LirsCacheMetrics {
        &self.metrics
    }

    /// Applies a new memory budget. Takes effect on the next insertion.
    pub(crate) fn set_max_memory(&mut self, max_memory: u64) {
        self.limits.max_memory = max_memory;
    }

    pub(crate) fn set_average_memory(&mut self, average_memory: u64) {
        self.limits.average_memory = average_memory;
    }

    #[inline]
    fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.get(key).copied()
    }

    /// The resident value for `key`, without touching recency state.
    pub(crate) fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find(key)?;
        self.entries[id].value.as_ref()
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.peek(key).is_some()
    }

    /// Declared memory of the entry, 0 if the key is unknown or non-resident.
    pub(crate) fn get_memory<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).map_or(0, |id| self.entries[id].memory)
    }

    /// Finds the resident entry for `key`, recording a miss if there is none.
    fn resident_node<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.find(key) {
            Some(id) if self.entries[id].is_resident() => Some(id),
            Some(_) => {
                self.metrics.record_non_resident_hit();
                None
            }
            None => {
                self.metrics.core.record_miss();
                None
            }
        }
    }

    /// Read-only half of `get`: the resident value and whether a follow-up
    /// [`touch`](Self::touch) would change recency state. Records the request.
    pub(crate) fn lookup<Q>(&self, key: &Q) -> Option<(&V, bool)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.resident_node(key)?;
        let entry = &self.entries[id];
        self.metrics.core.record_hit(entry.memory);
        let promote = self.needs_access(id);
        entry.value.as_ref().map(|value| (value, promote))
    }

    /// Mutating half of `get`. Re-checks everything, so a stale decision from
    /// [`lookup`](Self::lookup) is harmless.
    pub(crate) fn touch<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if let Some(id) = self.find(key) {
            self.access(id);
        }
    }

    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.resident_node(key)?;
        if self.needs_access(id) {
            self.access(id);
        }
        let entry = &self.entries[id];
        self.metrics.core.record_hit(entry.memory);
        entry.value.as_ref()
    }

    fn needs_access(&self, id: NodeId) -> bool {
        let entry = &self.entries[id];
        if !entry.is_resident() {
            return false;
        }
        if entry.is_hot() {
            self.stack.front() != Some(id) && self.moved_long_ago(entry.last_stack_move)
        } else {
            true
        }
    }

    #[inline]
    fn moved_long_ago(&self, last_stack_move: u64) -> bool {
        let distance = self.limits.stack_move_distance;
        distance == 0 || self.stack_move_counter.saturating_sub(last_stack_move) > distance
    }

    /// Records a reference to a resident entry.
    fn access(&mut self, id: NodeId) {
        let entry = &self.entries[id];
        if !entry.is_resident() {
            return;
        }
        if entry.is_hot() {
            if self.stack.front() != Some(id) && self.moved_long_ago(entry.last_stack_move) {
                let was_bottom = self.stack.back() == Some(id);
                self.remove_from_stack(id);
                if was_bottom {
                    self.prune_stack();
                }
                self.add_to_stack(id);
            }
            return;
        }

        self.remove_from_queue(id);
        if self.entries[id].on_stack() {
            // Referenced again within the stack: reuse distance beats the
            // oldest hot entry, which takes its place in the cold queue.
            self.remove_from_stack(id);
            self.convert_oldest_hot_to_cold();
            self.metrics.hot_promotions += 1;
        } else {
            self.queue.push_front(&mut self.entries, id);
        }
        self.add_to_stack(id);
    }

    /// Inserts `key`, returning the previous resident value.
    ///
    /// An existing entry for `key` is removed first, so the new entry starts
    /// without any recency history.
    pub(crate) fn put(&mut self, key: K, value: V, memory: u64) -> Option<V>
    where
        K: Clone,
    {
        let old = if self.map.contains_key(&key) {
            self.remove(&key)
        } else {
            None
        };

        if memory > self.limits.max_memory {
            debug!(
                memory,
                max_memory = self.limits.max_memory,
                "entry exceeds the segment memory budget"
            );
        }

        let id = self.entries.insert(LirsEntry::new(key.clone(), value, memory));
        self.used_memory += u128::from(memory);
        if self.used_memory > u128::from(self.limits.max_memory) && !self.map.is_empty() {
            self.evict(id);
        }
        self.map.insert(key, id);
        self.add_to_stack(id);
        self.metrics.core.record_insertion(memory);
        old
    }

    /// Removes `key`. Returns the value if it was resident.
    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.map.remove(key)?;
        self.release(id)
    }

    /// Unlinks an entry that is no longer indexed and frees its slot.
    fn release(&mut self, id: NodeId) -> Option<V> {
        if self.entries[id].on_stack() {
            self.remove_from_stack(id);
        }
        if self.entries[id].is_hot() {
            // Keep the hot count: the newest resident cold entry takes over.
            if let Some(newest) = self.queue.front() {
                self.remove_from_queue(newest);
                if !self.entries[newest].on_stack() {
                    self.stack.push_back(&mut self.entries, newest);
                }
            }
        } else {
            self.remove_from_queue(id);
        }
        self.prune_stack();

        let entry = self.entries.remove(id)?;
        self.used_memory -= u128::from(entry.memory);
        entry.value
    }

    /// Makes room for `new_cold`, which is not yet indexed.
    fn evict(&mut self, new_cold: NodeId) {
        let shift = self.limits.cold_ratio_shift;
        while (self.queue.len() << shift) < self.map.len() && !self.stack.is_empty() {
            self.convert_oldest_hot_to_cold();
        }
        if !self.stack.is_empty() {
            self.queue.push_front(&mut self.entries, new_cold);
        }

        let mut evicted = 0_u64;
        let mut dropped = 0_u64;
        while self.used_memory > u128::from(self.limits.max_memory) && self.queue.len() > 1 {
            let Some(oldest) = self.queue.back() else {
                break;
            };
            self.queue.unlink(&mut self.entries, oldest);
            let entry = &mut self.entries[oldest];
            let memory = entry.memory;
            self.used_memory -= u128::from(memory);
            entry.make_non_resident();
            self.queue2.push_front(&mut self.entries, oldest);
            self.metrics.core.record_eviction(memory);
            evicted += 1;

            while self.queue2.len() * 2 > self.stack.len() {
                let Some(stale) = self.queue2.back() else {
                    break;
                };
                self.map.remove(&self.entries[stale].key);
                self.release(stale);
                self.metrics.history_drops += 1;
                dropped += 1;
            }
        }

        trace!(
            evicted,
            dropped,
            used_memory = self.used_memory(),
            max_memory = self.limits.max_memory,
            "eviction pass"
        );
    }

    fn convert_oldest_hot_to_cold(&mut self) {
        let Some(oldest) = self.stack.back() else {
            return;
        };
        self.remove_from_stack(oldest);
        self.queue.push_front(&mut self.entries, oldest);
        self.prune_stack();
        self.metrics.hot_demotions += 1;
    }

    /// Drops cold entries from the stack bottom until it is hot (or empty).
    fn prune_stack(&mut self) {
        while let Some(last) = self.stack.back() {
            if self.entries[last].is_hot() {
                break;
            }
            self.remove_from_stack(last);
        }
    }

    fn add_to_stack(&mut self, id: NodeId) {
        self.stack.push_front(&mut self.entries, id);
        self.entries[id].last_stack_move = self.stack_move_counter;
        self.stack_move_counter += 1;
    }

    #[inline]
    fn remove_from_stack(&mut self, id: NodeId) {
        self.stack.unlink(&mut self.entries, id);
    }

    /// Unlinks a cold entry from whichever queue holds it.
    fn remove_from_queue(&mut self, id: NodeId) {
        if self.entries[id].is_resident() {
            self.queue.unlink(&mut self.entries, id);
        } else {
            self.queue2.unlink(&mut self.entries, id);
        }
    }

    /// Keys in recency order, most recent first.
    ///
    /// With `cold` unset, the keys on the stack (hot entries and recently
    /// referenced cold ones). Otherwise the resident cold keys, or the
    /// non-resident ones if `non_resident` is set.
    pub(crate) fn keys(&self, cold: bool, non_resident: bool) -> Vec<K>
    where
        K: Clone,
    {
        let list = match (cold, non_resident) {
            (false, _) => &self.stack,
            (true, false) => &self.queue,
            (true, true) => &self.queue2,
        };
        list.iter(&self.entries)
            .map(|id| self.entries[id].key.clone())
            .collect()
    }

    /// Resident entries in recency order: the stack first, then cold entries
    /// that have left the stack.
    fn resident_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let on_stack = self
            .stack
            .iter(&self.entries)
            .filter(|&id| self.entries[id].is_resident());
        let off_stack = self
            .queue
            .iter(&self.entries)
            .filter(|&id| !self.entries[id].on_stack());
        on_stack.chain(off_stack)
    }

    pub(crate) fn key_set(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.resident_ids()
            .map(|id| self.entries[id].key.clone())
            .collect()
    }

    pub(crate) fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.resident_ids()
            .filter_map(|id| {
                let entry = &self.entries[id];
                entry
                    .value
                    .as_ref()
                    .map(|value| (entry.key.clone(), value.clone()))
            })
            .collect()
    }

    /// Drops every entry and re-sizes the index from the current limits.
    /// Metrics are kept.
    pub(crate) fn clear(&mut self) {
        let capacity = self.limits.index_capacity();
        self.map.clear();
        self.map.shrink_to(capacity);
        self.map.reserve(capacity);
        self.entries = Arena::with_capacity(capacity);
        self.stack = List::new(Chain::Stack);
        self.queue = List::new(Chain::Queue);
        self.queue2 = List::new(Chain::Queue);
        self.used_memory = 0;
        self.stack_move_counter = 0;
    }

    /// Metrics of this segment including current gauges.
    pub(crate) fn metrics_map(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.to_btreemap();
        let gauges = [
            ("used_memory", self.used_memory() as f64),
            ("max_memory", self.limits.max_memory as f64),
            ("resident_entries", self.len() as f64),
            ("hot_entries", self.size_hot() as f64),
            ("cold_entries", self.queue.len() as f64),
            ("non_resident_entries", self.queue2.len() as f64),
        ];
        for (name, value) in gauges {
            metrics.insert(name.to_string(), value);
        }
        metrics
    }

    /// Verifies the bookkeeping against the list structure.
    pub(crate) fn check_invariants(&self) -> Result<()> {
        let mut used = 0_u128;
        let mut hot = 0_usize;
        for (_, &id) in self.map.iter() {
            let Some(entry) = self.entries.get(id) else {
                return Err(LirsError::invariant("index points at a vacant slot"));
            };
            if entry.is_resident() {
                used += u128::from(entry.memory);
            } else if entry.is_hot() || entry.memory != 0 {
                return Err(LirsError::invariant(
                    "non-resident entry must be cold with no memory",
                ));
            }
            if entry.is_hot() {
                hot += 1;
                if !entry.on_stack() {
                    return Err(LirsError::invariant("hot entry missing from the stack"));
                }
            }
        }
        if used != self.used_memory {
            return Err(LirsError::invariant(format!(
                "used_memory is {} but resident entries add up to {used}",
                self.used_memory
            )));
        }
        if hot != self.size_hot() {
            return Err(LirsError::invariant(format!(
                "{hot} hot entries but size_hot() is {}",
                self.size_hot()
            )));
        }
        if self.entries.len() != self.map.len() {
            return Err(LirsError::invariant(format!(
                "{} arena slots in use for {} indexed keys",
                self.entries.len(),
                self.map.len()
            )));
        }
        if self.stack.back().is_some_and(|id| !self.entries[id].is_hot()) {
            return Err(LirsError::invariant("stack bottom is cold"));
        }
        if self.queue.iter(&self.entries).any(|id| !self.entries[id].is_resident()) {
            return Err(LirsError::invariant("non-resident entry in the resident queue"));
        }
        if self.queue2.iter(&self.entries).any(|id| self.entries[id].is_resident()) {
            return Err(LirsError::invariant("resident entry in the history queue"));
        }
        for (name, list) in [("stack", &self.stack), ("queue", &self.queue), ("queue2", &self.queue2)]
        {
            let walked = list.iter(&self.entries).count();
            if walked != list.len() {
                return Err(LirsError::invariant(format!(
                    "{name} holds {walked} nodes but reports {}",
                    list.len()
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, S> core::fmt::Debug for LirsSegment<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LirsSegment")
            .field("limits", &self.limits)
            .field("used_memory", &self.used_memory)
            .field("keys", &self.map.len())
            .field("stack", &self.stack.len())
            .field("queue", &self.queue.len())
            .field("queue2", &self.queue2.len())
            .finish()
    }
}

/// A memory-bounded, scan-resistant LIRS cache.
///
/// Every entry carries a caller-declared memory cost; `put` without a cost
/// uses the configured average. When the resident total exceeds the budget,
/// cold entries are evicted and kept as history.
///
/// # Examples
///
/// ```
/// use lirs_cache::config::LirsCacheConfig;
/// use lirs_cache::LirsCache;
///
/// let mut cache = LirsCache::init(LirsCacheConfig::new(3), None).unwrap();
///
/// cache.put(1, "a");
/// cache.put(2, "b");
/// cache.put(3, "c");
/// cache.put(4, "d");
///
/// // The oldest entry made room for the newest one
/// assert_eq!(cache.get(&1), None);
/// assert_eq!(cache.get(&4), Some(&"d"));
/// assert_eq!(cache.used_memory(), 3);
/// ```
#[derive(Debug)]
pub struct LirsCache<K, V, S = DefaultHashBuilder> {
    segment: LirsSegment<K, V, S>,
}

impl<K: Hash + Eq, V> LirsCache<K, V> {
    /// Creates a count-bounded cache; see [`LirsCacheConfig::with_max_entries`].
    ///
    /// # Errors
    ///
    /// Fails if `max_entries` is 0.
    pub fn new(max_entries: u64) -> Result<Self> {
        Self::init(LirsCacheConfig::with_max_entries(max_entries), None)
    }

    /// Creates a cache from `config`, with `hasher` or the default hasher.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::InvalidConfiguration`] if `config` is invalid.
    pub fn init(config: LirsCacheConfig, hasher: Option<DefaultHashBuilder>) -> Result<Self> {
        Self::with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LirsCache<K, V, S> {
    /// Creates a cache from `config` using `hash_builder`.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::InvalidConfiguration`] if `config` is invalid.
    pub fn with_hasher(config: LirsCacheConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(LirsCache {
            segment: LirsSegment::with_hasher(SegmentLimits::for_segment(&config, 1), hash_builder),
        })
    }

    /// Returns the value for `key` and records the reference.
    #[inline]
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get(key)
    }

    /// Returns the value for `key` without recording a reference.
    #[inline]
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.peek(key)
    }

    /// Whether a resident value exists for `key`. Does not record a reference.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.contains_key(key)
    }

    /// Declared memory of `key`'s entry, 0 if it is not resident.
    #[inline]
    pub fn get_memory<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.get_memory(key)
    }

    /// Removes `key`, returning its value if it was resident. Also forgets a
    /// non-resident history entry for `key`.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.remove(key)
    }

    /// Number of resident entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    /// Whether no entry is resident.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of hot entries.
    #[inline]
    pub fn size_hot(&self) -> usize {
        self.segment.size_hot()
    }

    /// Number of non-resident history entries.
    #[inline]
    pub fn size_non_resident(&self) -> usize {
        self.segment.size_non_resident()
    }

    /// Capacity of the key index.
    #[inline]
    pub fn size_map_array(&self) -> usize {
        self.segment.size_map_array()
    }

    /// Total declared memory of resident entries.
    #[inline]
    pub fn used_memory(&self) -> u64 {
        self.segment.used_memory()
    }

    /// The memory budget.
    #[inline]
    pub fn max_memory(&self) -> u64 {
        self.segment.limits().max_memory
    }

    /// Memory assumed by [`put`](Self::put).
    #[inline]
    pub fn average_memory(&self) -> u64 {
        self.segment.limits().average_memory
    }

    /// Changes the memory budget. Entries are only evicted by later inserts.
    ///
    /// # Errors
    ///
    /// Fails if `max_memory` is 0; the cache is left unchanged.
    pub fn set_max_memory(&mut self, max_memory: u64) -> Result<()> {
        crate::config::lirs::validate_max_memory(max_memory)?;
        debug!(max_memory, "set max memory");
        self.segment.set_max_memory(max_memory);
        Ok(())
    }

    /// Changes the memory assumed by [`put`](Self::put). The index is re-sized
    /// for it on the next [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Fails if `average_memory` is 0; the cache is left unchanged.
    pub fn set_average_memory(&mut self, average_memory: u64) -> Result<()> {
        crate::config::lirs::validate_average_memory(average_memory)?;
        debug!(average_memory, "set average memory");
        self.segment.set_average_memory(average_memory);
        Ok(())
    }

    /// Removes every entry, including history. Metrics are kept.
    pub fn clear(&mut self) {
        debug!(entries = self.len(), "clearing cache");
        self.segment.clear();
    }

    /// Verifies internal bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`LirsError::Invariant`] describing the first inconsistency.
    pub fn check_invariants(&self) -> Result<()> {
        self.segment.check_invariants()
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> LirsCache<K, V, S> {
    /// Inserts `key` with the average memory cost, returning the previous
    /// resident value.
    #[inline]
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let memory = self.average_memory();
        self.segment.put(key, value, memory)
    }

    /// Inserts `key` with an explicit memory cost, returning the previous
    /// resident value. An entry larger than the whole budget is still kept.
    #[inline]
    pub fn put_with_memory(&mut self, key: K, value: V, memory: u64) -> Option<V> {
        self.segment.put(key, value, memory)
    }

    /// Keys in recency order, most recent first.
    ///
    /// - `keys(false, _)`: keys on the recency stack, hot or cold.
    /// - `keys(true, false)`: resident cold keys.
    /// - `keys(true, true)`: non-resident history keys.
    pub fn keys(&self, cold: bool, non_resident: bool) -> Vec<K> {
        self.segment.keys(cold, non_resident)
    }

    /// All resident keys.
    pub fn key_set(&self) -> Vec<K> {
        self.segment.key_set()
    }

    /// All resident entries as owned pairs.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.segment.entries()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for LirsCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.metrics_map()
    }

    fn algorithm_name(&self) -> &'static str {
        self.segment.lirs_metrics().algorithm_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn cache(max_memory: u64) -> LirsCache<u32, u32> {
        let config = LirsCacheConfig::new(max_memory).with_stack_move_distance(0);
        LirsCache::init(config, None).unwrap()
    }

    fn is_hot(cache: &LirsCache<u32, u32>, key: u32) -> bool {
        cache.contains_key(&key) && !cache.keys(true, false).contains(&key)
    }

    #[test]
    fn test_put_get_within_budget() {
        let mut cache = cache(4);
        for k in 1..=4 {
            assert_eq!(cache.put(k, k * 10), None);
        }
        for k in 1..=4 {
            assert_eq!(cache.get(&k), Some(&(k * 10)));
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.size_hot(), 4);
        assert_eq!(cache.used_memory(), 4);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_oldest_is_evicted_first() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&4), Some(&4));
        assert_eq!(cache.size_non_resident(), 1);
        assert_eq!(cache.keys(true, true), vec![1]);
        assert_eq!(cache.get_memory(&1), 0);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_put_replaces_value() {
        let mut cache = cache(3);
        cache.put(1, 10);
        assert_eq!(cache.put(1, 11), Some(10));
        assert_eq!(cache.peek(&1), Some(&11));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_memory(), 1);
    }

    #[test]
    fn test_put_over_non_resident_returns_none() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        assert!(!cache.contains_key(&1));
        assert_eq!(cache.put(1, 100), None);
        assert_eq!(cache.peek(&1), Some(&100));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let mut cache = cache(3);
        for k in 1..=3 {
            cache.put(k, k);
        }
        let before = cache.keys(false, false);
        assert_eq!(cache.peek(&1), Some(&1));
        assert!(cache.contains_key(&2));
        assert_eq!(cache.keys(false, false), before);
        assert_eq!(cache.metrics()["requests"], 0.0);
    }

    #[test]
    fn test_get_promotes_hot_entry() {
        let mut cache = cache(8);
        for k in 1..=3 {
            cache.put(k, k);
        }
        assert_eq!(cache.keys(false, false), vec![3, 2, 1]);
        cache.get(&1);
        assert_eq!(cache.keys(false, false), vec![1, 3, 2]);
    }

    #[test]
    fn test_stack_move_distance_throttles_hot_promotion() {
        let config = LirsCacheConfig::new(100).with_stack_move_distance(3);
        let mut cache: LirsCache<u32, u32> = LirsCache::init(config, None).unwrap();
        for k in 1..=3 {
            cache.put(k, k);
        }
        // Only two moves since key 1 was pushed.
        cache.get(&1);
        assert_eq!(cache.keys(false, false), vec![3, 2, 1]);

        for k in 4..=5 {
            cache.put(k, k);
        }
        cache.get(&1);
        assert_eq!(cache.keys(false, false)[0], 1);
    }

    #[test]
    fn test_cold_on_stack_becomes_hot() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        // 2 was demoted to make room, 4 came in cold
        assert_eq!(cache.keys(true, false), vec![4]);
        assert!(!is_hot(&cache, 4));

        cache.get(&4);
        assert!(is_hot(&cache, 4));
        assert!(!is_hot(&cache, 2));
        assert_eq!(cache.keys(true, false), vec![2]);
        assert_eq!(cache.size_hot(), 2);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_hot_promotes_newest_cold() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        cache.get(&4);
        let hot_before = cache.size_hot();

        assert_eq!(cache.remove(&3), Some(3));
        assert!(is_hot(&cache, 2));
        assert_eq!(cache.size_hot(), hot_before);
        assert_eq!(cache.used_memory(), 2);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_non_resident_is_silent() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        assert_eq!(cache.remove(&1), None);
        assert_eq!(cache.size_non_resident(), 0);
        assert_eq!(cache.remove(&1), None);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_oversized_entry_is_kept() {
        let mut cache = cache(10);
        cache.put_with_memory(1, 1, 50);
        assert_eq!(cache.get(&1), Some(&1));
        assert_eq!(cache.used_memory(), 50);

        // 1 is demoted, but the resident queue never drops its last entry
        cache.put_with_memory(2, 2, 1);
        assert!(cache.contains_key(&1));
        assert_eq!(cache.used_memory(), 51);
        cache.check_invariants().unwrap();

        cache.put_with_memory(3, 3, 1);
        assert!(!cache.contains_key(&1));
        assert_eq!(cache.used_memory(), 2);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_huge_costs_keep_accounting_exact() {
        let mut cache = cache(10);
        cache.put_with_memory(1, 1, u64::MAX);
        cache.put_with_memory(2, 2, u64::MAX);
        assert_eq!(cache.used_memory(), u64::MAX);
        cache.check_invariants().unwrap();

        cache.remove(&1);
        cache.remove(&2);
        assert_eq!(cache.used_memory(), 0);
        cache.check_invariants().unwrap();

        // The budget still applies once the large entries are gone
        for k in 3..20 {
            cache.put_with_memory(k, k, 1);
        }
        assert!(cache.used_memory() <= 10);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_variable_memory_accounting() {
        let mut cache = cache(10);
        cache.put_with_memory(1, 1, 4);
        cache.put_with_memory(2, 2, 4);
        cache.put_with_memory(3, 3, 4);
        assert!(cache.used_memory() <= 10);
        assert_eq!(cache.get_memory(&2), 4);
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_clear_keeps_metrics() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        cache.get(&4);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.size_non_resident(), 0);
        assert_eq!(cache.used_memory(), 0);
        assert_eq!(cache.metrics()["cache_hits"], 1.0);
        cache.put(1, 1);
        assert_eq!(cache.get(&1), Some(&1));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn test_setters_validate() {
        let mut cache = cache(3);
        assert!(matches!(
            cache.set_max_memory(0),
            Err(LirsError::InvalidConfiguration(_))
        ));
        assert!(cache.set_average_memory(0).is_err());
        assert_eq!(cache.max_memory(), 3);

        cache.set_average_memory(2).unwrap();
        cache.put(1, 1);
        assert_eq!(cache.get_memory(&1), 2);
    }

    #[test]
    fn test_lower_max_memory_applies_on_next_put() {
        let mut cache = cache(10);
        for k in 1..=10 {
            cache.put(k, k);
        }
        cache.set_max_memory(5).unwrap();
        assert_eq!(cache.len(), 10);
        cache.put(11, 11);
        cache.check_invariants().unwrap();
        assert!(cache.len() < 11);
    }

    #[test]
    fn test_key_set_and_entries() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k * 2);
        }
        let mut keys = cache.key_set();
        keys.sort_unstable();
        assert_eq!(keys, vec![2, 3, 4]);

        let mut entries = cache.entries();
        entries.sort_unstable();
        assert_eq!(entries, vec![(2, 4), (3, 6), (4, 8)]);
    }

    #[test]
    fn test_metrics() {
        let mut cache = cache(3);
        for k in 1..=4 {
            cache.put(k, k);
        }
        cache.get(&1);
        cache.get(&4);
        cache.get(&99);

        let metrics = cache.metrics();
        assert_eq!(metrics["requests"], 3.0);
        assert_eq!(metrics["cache_hits"], 1.0);
        assert_eq!(metrics["non_resident_hits"], 1.0);
        assert_eq!(metrics["insertions"], 4.0);
        assert_eq!(metrics["evictions"], 1.0);
        assert_eq!(metrics["hot_promotions"], 1.0);
        assert_eq!(metrics["used_memory"], 3.0);
        assert_eq!(cache.algorithm_name(), "LIRS");
    }

    #[test]
    fn test_new_with_zero_entries_fails() {
        assert!(LirsCache::<u32, u32>::new(0).is_err());
        let cache = LirsCache::<u32, u32>::new(1000).unwrap();
        assert_eq!(cache.max_memory(), 1000);
        assert!(cache.size_map_array() >= 1000);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut cache = cache(16);
        for k in 0..1000 {
            cache.put(k, k);
            assert!(cache.size_non_resident() * 2 <= cache.keys(false, false).len());
        }
        cache.check_invariants().unwrap();
    }
}
