//! Error types for the lrukit library.
//!
//! ## Key Components
//!
//! - [`InvalidCapacity`]: Returned by cache constructors when the requested
//!   capacity is zero. Capacity is validated, never clamped.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (debug-only `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use lrukit::error::InvalidCapacity;
//! use lrukit::policy::lru::LruCache;
//!
//! // Fallible constructor for user-configurable capacity
//! let cache: Result<LruCache<u64, String>, InvalidCapacity> = LruCache::new(100);
//! assert!(cache.is_ok());
//!
//! // Zero capacity is rejected without panicking
//! let bad = LruCache::<u64, String>::new(0);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvalidCapacity
// ---------------------------------------------------------------------------

/// Error returned when a cache is constructed with an invalid capacity.
///
/// Produced by [`LruCache::new`](crate::policy::lru::LruCache::new) when the
/// requested capacity is zero. Carries the rejected value so callers can
/// report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCapacity {
    requested: usize,
}

impl InvalidCapacity {
    /// Creates a new `InvalidCapacity` for the rejected value.
    #[inline]
    pub fn new(requested: usize) -> Self {
        Self { requested }
    }

    /// Returns the capacity that was rejected.
    #[inline]
    pub fn requested(&self) -> usize {
        self.requested
    }
}

impl fmt::Display for InvalidCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache capacity must be at least 1, got {}",
            self.requested
        )
    }
}

impl std::error::Error for InvalidCapacity {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by debug-only `check_invariants` methods on cache types
/// (e.g. [`LruCache::check_invariants`](crate::policy::lru::LruCache::check_invariants)).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
