//! Concurrent Cache Implementations
//!
//! Thread-safe caches built from independently locked segments.
//!
//! # Architecture
//!
//! - The key space is partitioned across a power-of-two number of segments
//!   using hash-based sharding.
//! - Each segment is a complete LIRS cache protected by its own
//!   `parking_lot::RwLock`.
//! - Operations only lock the segment that owns the key, so different keys
//!   proceed in parallel as long as they land in different segments.
//!
//! ## Why RwLock?
//!
//! Unlike LRU, a LIRS hit on a hot entry usually changes nothing: hot entries
//! are only moved on the recency stack once they have drifted
//! `stack_move_distance` moves away from its head. `get` therefore starts
//! under a shared lock and only upgrades (by re-locking exclusively) when a
//! promotion is actually due, which lets read-heavy workloads on a hot working
//! set share a segment.
//!
//! # Available Concurrent Caches
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConcurrentLirsCache`] | Thread-safe LIRS cache with segmented storage |
//!
//! # Thread Safety
//!
//! `ConcurrentLirsCache` is `Send + Sync` whenever its keys, values and hasher
//! are, and can be shared through an `Arc`.

mod lirs;

pub use self::lirs::ConcurrentLirsCache;
