//! Cache Configuration Module
//!
//! Configuration structures for the LIRS caches. Config structs have public
//! fields, so they can be written out in full, plus a few `with_*` builders for
//! the common case of overriding one default.
//!
//! | Config | Cache | Description |
//! |--------|-------|-------------|
//! | `LirsCacheConfig` | [`LirsCache`](crate::LirsCache) | Single-threaded LIRS |
//! | `ConcurrentLirsCacheConfig` | `ConcurrentLirsCache` | Segmented, thread-safe LIRS (requires `concurrent`) |
//!
//! Every config is validated when a cache is built from it; invalid values
//! are reported as [`LirsError::InvalidConfiguration`](crate::LirsError).
//!
//! # Examples
//!
//! ```
//! use lirs_cache::config::LirsCacheConfig;
//! use lirs_cache::LirsCache;
//!
//! // 10MB in-memory cache for ~1KB average values
//! let config = LirsCacheConfig {
//!     max_memory: 10 * 1024 * 1024,
//!     average_memory: 1024,
//!     stack_move_distance: None,
//!     cold_ratio_shift: 5,
//! };
//! let cache: LirsCache<String, Vec<u8>> = LirsCache::init(config, None).unwrap();
//! ```

extern crate alloc;

pub mod lirs;

pub use lirs::{
    LirsCacheConfig, DEFAULT_AVERAGE_MEMORY, DEFAULT_COLD_RATIO_SHIFT, MAX_COLD_RATIO_SHIFT,
};

#[cfg(feature = "concurrent")]
use crate::error::{LirsError, Result};

/// Default number of segments of a concurrent cache.
pub const DEFAULT_SEGMENT_COUNT: usize = 16;

/// Upper bound on the number of segments of a concurrent cache.
pub const MAX_SEGMENT_COUNT: usize = 1 << 16;

/// Generic configuration wrapper for concurrent caches.
///
/// Wraps a base cache configuration and adds the `segments` field
/// for controlling the number of independent segments used for sharding.
///
/// # Sizing Note
///
/// `max_memory` in the base config applies to the **entire cache**; every
/// segment receives an equal share of it.
///
/// # Example
///
/// ```
/// use lirs_cache::config::{ConcurrentCacheConfig, ConcurrentLirsCacheConfig, LirsCacheConfig};
///
/// // 100MB concurrent cache with 32 segments
/// let config: ConcurrentLirsCacheConfig = ConcurrentCacheConfig {
///     base: LirsCacheConfig::new(100 * 1024 * 1024).with_average_memory(4096),
///     segments: 32,
/// };
/// assert!(config.validate().is_ok());
/// ```
#[cfg(feature = "concurrent")]
#[derive(Clone, Copy)]
pub struct ConcurrentCacheConfig<C> {
    /// Base configuration for the underlying cache algorithm.
    pub base: C,
    /// Number of segments for sharding. Must be a power of two.
    pub segments: usize,
}

#[cfg(feature = "concurrent")]
impl<C> ConcurrentCacheConfig<C> {
    /// Wraps `base` with [`DEFAULT_SEGMENT_COUNT`] segments.
    #[must_use]
    pub fn new(base: C) -> Self {
        ConcurrentCacheConfig {
            base,
            segments: DEFAULT_SEGMENT_COUNT,
        }
    }

    /// Sets the number of segments.
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }
}

#[cfg(feature = "concurrent")]
impl ConcurrentCacheConfig<LirsCacheConfig> {
    /// Checks the base config and the segment count.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        validate_segment_count(self.segments)
    }
}

#[cfg(feature = "concurrent")]
pub(crate) fn validate_segment_count(segments: usize) -> Result<()> {
    if !segments.is_power_of_two() || segments > MAX_SEGMENT_COUNT {
        return Err(LirsError::invalid(alloc::format!(
            "segment count must be a power of 2 no larger than {MAX_SEGMENT_COUNT}, is {segments}"
        )));
    }
    Ok(())
}

#[cfg(feature = "concurrent")]
impl<C: core::fmt::Debug> core::fmt::Debug for ConcurrentCacheConfig<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConcurrentCacheConfig")
            .field("base", &self.base)
            .field("segments", &self.segments)
            .finish()
    }
}

#[cfg(feature = "concurrent")]
/// Configuration for a concurrent LIRS cache.
/// Type alias for `ConcurrentCacheConfig<LirsCacheConfig>`.
pub type ConcurrentLirsCacheConfig = ConcurrentCacheConfig<LirsCacheConfig>;
