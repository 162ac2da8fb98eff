//! Configuration for the LIRS (Low Inter-reference Recency Set) cache.
//!
//! # Sizing Guidelines
//!
//! ## Understanding `max_memory` and `average_memory`
//!
//! - **`max_memory`**: Budget for the *declared* cost of resident entries. The
//!   unit is whatever the caller passes to `put_with_memory` (bytes, pages, or
//!   simply `1` per entry to get a count-bounded cache).
//! - **`average_memory`**: Cost assumed by `put` when no explicit cost is given.
//!   It also sizes the key index up front: the index starts with room for about
//!   `max_memory / average_memory` keys.
//!
//! Non-resident history entries cost nothing against `max_memory` but still
//! occupy an index slot and a few words of bookkeeping each. Their number is
//! bounded by half the recency stack.
//!
//! ## Tuning Values
//!
//! - **`stack_move_distance`**: A hot entry is only moved to the stack head on
//!   a hit if at least this many other stack moves happened since its last
//!   move. Larger values make hits on hot entries cheaper at the cost of a
//!   coarser recency order. `None` picks `max_entries / 100`, `0` disables the
//!   throttle.
//! - **`cold_ratio_shift`**: Eviction converts hot entries to cold until
//!   `cold_entries << cold_ratio_shift >= entries`. The default of 5 keeps at
//!   least 1/32 of the entries cold.
//!
//! # Examples
//!
//! ```
//! use lirs_cache::config::LirsCacheConfig;
//! use lirs_cache::LirsCache;
//!
//! // 64MB budget for values averaging ~4KB
//! let config = LirsCacheConfig::new(64 * 1024 * 1024).with_average_memory(4096);
//! let cache: LirsCache<String, Vec<u8>> = LirsCache::init(config, None).unwrap();
//!
//! // Count-bounded cache of 1000 entries
//! let config = LirsCacheConfig::with_max_entries(1000);
//! let cache: LirsCache<u64, u64> = LirsCache::init(config, None).unwrap();
//! ```

extern crate alloc;

use crate::error::{LirsError, Result};
use core::fmt;

/// Cost assumed for a `put` without an explicit memory value.
pub const DEFAULT_AVERAGE_MEMORY: u64 = 1;

/// Default shift for the minimum cold fraction (at least 1/32 cold).
pub const DEFAULT_COLD_RATIO_SHIFT: u32 = 5;

/// Largest accepted `cold_ratio_shift`.
pub const MAX_COLD_RATIO_SHIFT: u32 = 16;

/// Configuration for a LIRS cache.
///
/// The limits apply to the whole cache. A concurrent cache splits
/// `max_memory` evenly over its segments.
///
/// # Examples
///
/// ```
/// use lirs_cache::config::LirsCacheConfig;
///
/// let config = LirsCacheConfig {
///     max_memory: 10 * 1024 * 1024,
///     average_memory: 1024,
///     stack_move_distance: Some(32),
///     cold_ratio_shift: 5,
/// };
/// assert!(config.validate().is_ok());
/// assert_eq!(config.resolved_stack_move_distance(), 32);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LirsCacheConfig {
    /// Maximum total memory of resident entries. Must be larger than 0.
    pub max_memory: u64,
    /// Memory assumed for entries inserted without an explicit cost.
    /// Must be larger than 0.
    pub average_memory: u64,
    /// Minimum number of stack moves between two promotions of the same hot
    /// entry. `None` resolves to `max_memory / average_memory / 100`.
    pub stack_move_distance: Option<u64>,
    /// Minimum cold fraction, expressed as a power of two (`1 / 2^shift`).
    pub cold_ratio_shift: u32,
}

impl LirsCacheConfig {
    /// Creates a configuration with the given memory budget and defaults for
    /// everything else.
    #[must_use]
    pub fn new(max_memory: u64) -> Self {
        LirsCacheConfig {
            max_memory,
            average_memory: DEFAULT_AVERAGE_MEMORY,
            stack_move_distance: None,
            cold_ratio_shift: DEFAULT_COLD_RATIO_SHIFT,
        }
    }

    /// Creates a count-bounded configuration: every entry costs 1 and the
    /// stack move distance is `max_entries / 100`.
    #[must_use]
    pub fn with_max_entries(max_entries: u64) -> Self {
        LirsCacheConfig {
            stack_move_distance: Some(max_entries / 100),
            ..Self::new(max_entries)
        }
    }

    /// Sets the memory assumed for `put` without an explicit cost.
    #[must_use]
    pub fn with_average_memory(mut self, average_memory: u64) -> Self {
        self.average_memory = average_memory;
        self
    }

    /// Sets the stack move distance. `0` promotes hot entries on every hit.
    #[must_use]
    pub fn with_stack_move_distance(mut self, distance: u64) -> Self {
        self.stack_move_distance = Some(distance);
        self
    }

    /// Sets the minimum cold fraction shift.
    #[must_use]
    pub fn with_cold_ratio_shift(mut self, shift: u32) -> Self {
        self.cold_ratio_shift = shift;
        self
    }

    /// The effective stack move distance.
    pub fn resolved_stack_move_distance(&self) -> u64 {
        match self.stack_move_distance {
            Some(distance) => distance,
            None => match self.max_memory.checked_div(self.average_memory) {
                Some(max_entries) => max_entries / 100,
                None => 0,
            },
        }
    }

    /// Checks every field, reporting the first invalid one.
    pub fn validate(&self) -> Result<()> {
        validate_max_memory(self.max_memory)?;
        validate_average_memory(self.average_memory)?;
        if self.cold_ratio_shift > MAX_COLD_RATIO_SHIFT {
            return Err(LirsError::invalid(alloc::format!(
                "cold_ratio_shift must be at most {MAX_COLD_RATIO_SHIFT}, is {}",
                self.cold_ratio_shift
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_max_memory(max_memory: u64) -> Result<()> {
    if max_memory == 0 {
        return Err(LirsError::invalid("max_memory must be larger than 0"));
    }
    Ok(())
}

pub(crate) fn validate_average_memory(average_memory: u64) -> Result<()> {
    if average_memory == 0 {
        return Err(LirsError::invalid("average_memory must be larger than 0"));
    }
    Ok(())
}

impl fmt::Debug for LirsCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LirsCacheConfig")
            .field("max_memory", &self.max_memory)
            .field("average_memory", &self.average_memory)
            .field("stack_move_distance", &self.stack_move_distance)
            .field("cold_ratio_shift", &self.cold_ratio_shift)
            .finish()
    }
}
