//! Sequence tag generation.
//!
//! Each request carries a `tag` that the daemon echoes back, so a response
//! can be matched to the call that produced it on a shared channel.

use std::sync::atomic::{AtomicU64, Ordering};

/// Largest tag that still fits a signed 64-bit JSON integer.
pub const DEFAULT_MAX_TAG: u64 = u64::MAX >> 1;

/// Value the counter starts from and wraps back to.
const INITIAL_TAG: u64 = 1;

/// Source of request tags.
///
/// Implementations must never return the same value twice in a row.
pub trait TagSource: Send + Sync {
    /// Returns the tag for the next request.
    fn next_tag(&self) -> u64;
}

/// Monotonic tag counter that wraps back to 1 once it reaches its bound.
///
/// The counter starts at 1 and is incremented before each value is handed
/// out, so the first tag is 2. Increments are atomic, so concurrent callers
/// never observe the same tag between two wraps.
#[derive(Debug)]
pub struct TagGenerator {
    current: AtomicU64,
    max: u64,
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TagGenerator {
    /// Creates a generator bounded by [`DEFAULT_MAX_TAG`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_max(DEFAULT_MAX_TAG)
    }

    /// Creates a generator that wraps after reaching `max`.
    ///
    /// `max` is raised to 2 if lower, since a bound of 1 would repeat values.
    #[must_use]
    pub fn with_max(max: u64) -> Self {
        Self {
            current: AtomicU64::new(INITIAL_TAG),
            max: max.max(INITIAL_TAG + 1),
        }
    }

    /// Upper bound of generated tags.
    #[must_use]
    pub fn max(&self) -> u64 {
        self.max
    }

    fn successor(&self, current: u64) -> u64 {
        if current >= self.max {
            INITIAL_TAG
        } else {
            current + 1
        }
    }
}

impl TagSource for TagGenerator {
    fn next_tag(&self) -> u64 {
        let previous = self
            .current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(self.successor(current))
            })
            .unwrap_or_else(|current| current);
        self.successor(previous)
    }
}
