#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Entry Classes
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                      Lifecycle of a LIRS entry                           │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │   put (cache has room) ──▶ ┌──────────┐                                  │
//! │                            │   HOT    │◀──────────────────┐              │
//! │                            └────┬─────┘                   │              │
//! │          stack bottom demoted   │            re-referenced while         │
//! │                                 ▼            still on the stack          │
//! │   put (cache is full)  ──▶ ┌──────────────┐               │              │
//! │                            │ COLD resident├───────────────┘              │
//! │                            └────┬─────────┘                              │
//! │                 evicted from    │                                        │
//! │                 the queue tail  ▼                                        │
//! │                            ┌──────────────────┐                          │
//! │                            │ COLD non-resident│── history too long ──▶ ∅ │
//! │                            └──────────────────┘                          │
//! │                                                                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LirsCache`] | Single-threaded LIRS cache, `&mut self` access |
//! | [`ConcurrentLirsCache`] | Segmented, `RwLock`-protected LIRS cache (feature `concurrent`) |
//! | [`config::LirsCacheConfig`] | Memory budget and tuning values |
//! | [`LirsError`] | Rejected configuration values |
//!
//! ## Performance Characteristics
//!
//! | Operation | Cost | Lock (concurrent) |
//! |-----------|------|-------------------|
//! | `get` | O(1) | read, write only when a promotion is due |
//! | `peek` / `contains_key` / `get_memory` | O(1) | read |
//! | `put` | O(1) amortized | write |
//! | `remove` | O(1) | write |
//! | `len` / `used_memory` / `keys` | O(segments) / O(n) | read, one segment at a time |
//!
//! ## Code Examples
//!
//! ```
//! use lirs_cache::config::LirsCacheConfig;
//! use lirs_cache::LirsCache;
//!
//! // Budget of 3 units, 1 unit per entry
//! let mut cache = LirsCache::init(LirsCacheConfig::new(3), None).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.put("c", 3);
//! cache.put("d", 4);
//!
//! assert_eq!(cache.get(&"a"), None);
//! assert_eq!(cache.get(&"d"), Some(&4));
//! // "a" is remembered as history
//! assert_eq!(cache.size_non_resident(), 1);
//! ```
//!
//! ```
//! use lirs_cache::ConcurrentLirsCache;
//!
//! let cache = ConcurrentLirsCache::with_limits(64 * 1024, 1024, 4, 16).unwrap();
//! cache.put_with_memory("blob".to_string(), vec![0u8; 4096], 4096);
//! assert_eq!(cache.get_memory("blob"), 4096);
//! assert!(cache.contains_key("blob"));
//! ```

#![no_std]

#[cfg(test)]
extern crate scoped_threadpool;

/// LIRS entry type.
///
/// One entry per known key; whether it is hot, cold or only history is
/// derived from its list membership.
pub(crate) mod entry;

/// Index-linked lists over a node arena.
///
/// Internal infrastructure for the recency stack and the cold queues.
pub(crate) mod list;

/// Error type.
pub mod error;

/// Cache configuration structures.
pub mod config;

/// Low Inter-reference Recency Set (LIRS) cache implementation.
///
/// Provides the single-threaded [`LirsCache`] and the segment type the
/// concurrent cache is built from.
pub mod lirs;

/// Cache metrics system.
///
/// Counters and gauges reported through the [`metrics::CacheMetrics`] trait.
pub mod metrics;

/// Concurrent cache implementations.
///
/// Available when the `concurrent` feature is enabled.
#[cfg(feature = "concurrent")]
pub mod concurrent;

pub use error::LirsError;
pub use lirs::LirsCache;

#[cfg(feature = "concurrent")]
pub use concurrent::ConcurrentLirsCache;
