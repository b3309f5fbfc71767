//! # Least Recently Used (LRU) Cache Implementation
//!
//! Fixed-capacity key-value cache with LRU eviction. All operations are O(1)
//! amortized; eviction removes at most one entry per insert.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                           LruCache<K, V>                             │
//!   │                                                                      │
//!   │   ┌────────────────────────────────────────────────────────────────┐ │
//!   │   │  FxHashMap<K, Handle> (index into RecencyList)                 │ │
//!   │   │                                                                │ │
//!   │   │  ┌─────────┬──────────────────────────────────────────┐       │ │
//!   │   │  │   Key   │  Handle                                  │       │ │
//!   │   │  ├─────────┼──────────────────────────────────────────┤       │ │
//!   │   │  │  key_1  │  ────────────────────────────────────┐   │       │ │
//!   │   │  │  key_2  │  ──────────────────────────────┐     │   │       │ │
//!   │   │  │  key_3  │  ────────────────────────┐     │     │   │       │ │
//!   │   │  └─────────┴──────────────────────────┼─────┼─────┼───┘       │ │
//!   │   └─────────────────────────────────────────────────────────────── ┘ │
//!   │                                           │     │     │              │
//!   │   ┌───────────────────────────────────────┼─────┼─────┼────────────┐ │
//!   │   │  RecencyList<Entry<K, V>>             ▼     ▼     ▼            │ │
//!   │   │                                                                │ │
//!   │   │  [head]* ◄──► [h_3] ◄──► [h_2] ◄──► [h_1] ◄──► [tail]*         │ │
//!   │   │          MRU                          LRU       (* sentinel)   │ │
//!   │   └────────────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The index and the recency list are two views over the same entry set and
//! are always mutated together; `check_invariants` verifies they agree.
//!
//! ## Key Components
//!
//! | Component              | Description                                      |
//! |------------------------|--------------------------------------------------|
//! | `LruCache<K, V>`       | Single-threaded core with index + recency list   |
//! | `Entry<K, V>`          | Key + `Arc<V>` value stored in the list nodes    |
//! | `RecencyList`          | Sentinel-bounded MRU→LRU list over an `Arena`    |
//! | `ConcurrentLruCache`   | Thread-safe wrapper with `parking_lot::RwLock`   |
//!
//! ## Operations Flow
//!
//! ```text
//!   INSERT new key (cache full, capacity = 3)
//!   ═══════════════════════════════════════════════════════════════════════
//!   Before:  head ──► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   insert(D):
//!     1. Attach [D] at the front
//!     2. Count exceeds capacity: evict [C] from the back
//!   After:   head ──► [D] ◄──► [A] ◄──► [B] ◄── tail
//!
//!   ACCESS existing key
//!   ═══════════════════════════════════════════════════════════════════════
//!   Before:  head ──► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   get(B):
//!     1. Index lookup: O(1)
//!     2. Splice [B] to the front: O(1)
//!   After:   head ──► [B] ◄──► [A] ◄──► [C] ◄── tail
//!
//!   PEEK (no reordering)
//!   ═══════════════════════════════════════════════════════════════════════
//!   peek(C): index lookup + Arc::clone of the value; order unchanged.
//! ```
//!
//! ## LruCache Methods (CoreCache + MutableCache + LruCacheTrait)
//!
//! | Method           | Complexity | Description                               |
//! |------------------|------------|-------------------------------------------|
//! | `new(capacity)`  | O(1)       | Fallible; rejects capacity 0              |
//! | `insert(k, v)`   | O(1)*      | Insert or update, may evict LRU           |
//! | `get(&k)`        | O(1)       | Value snapshot, moves entry to MRU        |
//! | `peek(&k)`       | O(1)       | Value snapshot without recency touch      |
//! | `contains(&k)`   | O(1)       | Check if key exists                       |
//! | `remove(&k)`     | O(1)       | Remove entry by key                       |
//! | `pop_lru()`      | O(1)       | Remove and return least recently used     |
//! | `peek_lru()`     | O(1)       | Snapshot of LRU entry without removing    |
//! | `touch(&k)`      | O(1)       | Move to MRU without returning the value   |
//! | `recency_rank()` | O(n)       | Position in recency order (0 = MRU)       |
//! | `len()`          | O(1)       | Current number of entries                 |
//! | `capacity()`     | O(1)       | Maximum capacity                          |
//! | `clear()`        | O(n)       | Remove all entries                        |
//!
//! ## Design Rationale
//!
//! The recency list is an arena of nodes addressed by stable integer
//! handles; "prev"/"next" are handle fields rather than owning references,
//! so the policy core contains no raw pointers and no `unsafe`. Sentinel
//! head/tail nodes eliminate empty-structure special cases from the splice
//! paths. Values are held as `Arc<V>`, so callers receive snapshots that
//! stay valid after the entry is evicted (e.g. during writeback).
//!
//! ## Thread Safety
//!
//! - `LruCache`: **NOT thread-safe**; single-threaded, synchronous, no
//!   suspension points.
//! - `ConcurrentLruCache`: thread-safe via `parking_lot::RwLock`, one lock
//!   guarding index and ordering together. `get` takes the write lock (it
//!   reorders); `peek`/`len`/`contains` take the read lock.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::{Handle, RecencyList};
use crate::error::InvalidCapacity;
#[cfg(debug_assertions)]
use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::LruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::LruMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CoreMetricsRecorder, LruMetricsReadRecorder, LruMetricsRecorder, MetricsSnapshotProvider,
};
#[cfg(feature = "concurrency")]
use crate::traits::ConcurrentCache;
use crate::traits::{CoreCache, LruCacheTrait, MutableCache};

/// One stored key-value pair.
///
/// The key is duplicated here so eviction can remove the index entry; the
/// value is `Arc`-wrapped so snapshots handed to callers survive eviction.
#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: Arc<V>,
}

/// Fixed-capacity LRU cache core: hash index + handle-linked recency list.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lrukit::policy::lru::LruCache;
/// use lrukit::traits::CoreCache;
///
/// let mut cache: LruCache<u32, String> = LruCache::new(2).unwrap();
/// cache.insert(1, Arc::new("one".to_string()));
/// cache.insert(2, Arc::new("two".to_string()));
///
/// // get() marks key 1 most recently used...
/// assert_eq!(*cache.get(&1).unwrap(), "one");
///
/// // ...so inserting a third entry evicts key 2
/// cache.insert(3, Arc::new("three".to_string()));
/// assert!(!cache.contains(&2));
/// assert!(cache.contains(&1));
/// ```
pub struct LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    index: FxHashMap<K, Handle>,
    order: RecencyList<Entry<K, V>>,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: LruMetrics,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache that holds at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapacity`] if `capacity` is 0. The value is never
    /// silently clamped.
    ///
    /// # Example
    ///
    /// ```
    /// use lrukit::policy::lru::LruCache;
    ///
    /// let cache: LruCache<u32, String> = LruCache::new(100).unwrap();
    /// assert!(LruCache::<u32, String>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity < 1 {
            return Err(InvalidCapacity::new(capacity));
        }
        Ok(Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: RecencyList::with_capacity(capacity),
            capacity,
            #[cfg(feature = "metrics")]
            metrics: LruMetrics::default(),
        })
    }

    /// Value snapshot without a recency touch.
    ///
    /// Unlike [`get`](CoreCache::get), the entry keeps its position in the
    /// eviction order.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use lrukit::policy::lru::LruCache;
    /// use lrukit::traits::CoreCache;
    ///
    /// let mut cache = LruCache::new(2).unwrap();
    /// cache.insert(1, Arc::new("first"));
    /// cache.insert(2, Arc::new("second"));
    ///
    /// assert_eq!(*cache.peek(&1).unwrap(), "first");
    ///
    /// // Key 1 is still LRU and goes first
    /// cache.insert(3, Arc::new("third"));
    /// assert!(!cache.contains(&1));
    /// ```
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_call();

        let &handle = self.index.get(key)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_hit();
        self.order
            .get(handle)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Iterates `(key, value)` snapshots from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (K, Arc<V>)> + '_ {
        self.order
            .iter()
            .map(|entry| (entry.key.clone(), Arc::clone(&entry.value)))
    }

    /// Validates that the index and the recency ordering agree (debug-only).
    ///
    /// Checks: index and ordering hold the same key set, every indexed
    /// handle resolves to the entry for its key, and the entry count is
    /// within capacity.
    #[cfg(debug_assertions)]
    pub fn check_invariants(&self) -> Result<(), InvariantError>
    where
        K: fmt::Debug,
    {
        if self.index.len() != self.order.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but ordering holds {} entries",
                self.index.len(),
                self.order.len()
            )));
        }
        if self.order.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.order.len(),
                self.capacity
            )));
        }

        let mut walked = 0usize;
        for handle in self.order.iter_handles() {
            let entry = self
                .order
                .get(handle)
                .ok_or_else(|| InvariantError::new(format!("stale handle {:?} in ordering", handle)))?;
            match self.index.get(&entry.key) {
                Some(&indexed) if indexed == handle => {},
                Some(&indexed) => {
                    return Err(InvariantError::new(format!(
                        "key {:?} indexed at {:?} but ordered at {:?}",
                        entry.key, indexed, handle
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "key {:?} present in ordering but missing from index",
                        entry.key
                    )));
                },
            }
            walked += 1;
        }
        if walked != self.index.len() {
            return Err(InvariantError::new(format!(
                "ordering walk visited {} entries, index holds {}",
                walked,
                self.index.len()
            )));
        }
        Ok(())
    }

    fn debug_validate(&self) {
        #[cfg(debug_assertions)]
        self.order.debug_validate_invariants();
    }
}

impl<K, V> CoreCache<K, Arc<V>> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Inserts or updates, returning the previous value on update.
    ///
    /// A new key is placed at the MRU position; if that pushes the entry
    /// count past capacity, the entry at the LRU position is evicted from
    /// both the ordering and the index. An update never changes the entry
    /// count and never evicts.
    #[inline]
    fn insert(&mut self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_call();

        if let Some(&handle) = self.index.get(&key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();

            let previous = self
                .order
                .get_mut(handle)
                .map(|entry| std::mem::replace(&mut entry.value, value));
            self.order.move_to_front(handle);

            self.debug_validate();
            return previous;
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        let handle = self.order.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, handle);

        // Capacity is >= 1 and grows by at most one per call, so a single
        // back-eviction restores the bound.
        if self.index.len() > self.capacity {
            #[cfg(feature = "metrics")]
            self.metrics.record_evict_call();

            if let Some(evicted) = self.order.pop_back() {
                self.index.remove(&evicted.key);
                #[cfg(feature = "metrics")]
                self.metrics.record_evicted_entry();
            }
        }

        self.debug_validate();
        None
    }

    /// Value snapshot; the entry becomes most recently used.
    ///
    /// A miss returns `None` and leaves both the index and the ordering
    /// untouched.
    #[inline]
    fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let handle = match self.index.get(key) {
            Some(&handle) => handle,
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_get_miss();
                return None;
            },
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.order.move_to_front(handle);

        self.debug_validate();
        self.order
            .get(handle)
            .map(|entry| Arc::clone(&entry.value))
    }

    #[inline]
    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        self.order.clear();
        self.index.clear();

        self.debug_validate();
    }
}

impl<K, V> MutableCache<K, Arc<V>> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    #[inline]
    fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let handle = self.index.remove(key)?;
        let entry = self.order.remove(handle);

        self.debug_validate();
        entry.map(|entry| entry.value)
    }
}

impl<K, V> LruCacheTrait<K, Arc<V>> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    #[inline]
    fn pop_lru(&mut self) -> Option<(K, Arc<V>)> {
        #[cfg(feature = "metrics")]
        self.metrics.record_pop_lru_call();

        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);

        #[cfg(feature = "metrics")]
        self.metrics.record_pop_lru_found();

        self.debug_validate();
        Some((entry.key, entry.value))
    }

    #[inline]
    fn peek_lru(&self) -> Option<(K, Arc<V>)> {
        #[cfg(feature = "metrics")]
        self.metrics.record_peek_lru_call();

        self.order.back().map(|entry| {
            #[cfg(feature = "metrics")]
            self.metrics.record_peek_lru_found();
            (entry.key.clone(), Arc::clone(&entry.value))
        })
    }

    #[inline]
    fn touch(&mut self, key: &K) -> bool {
        #[cfg(feature = "metrics")]
        self.metrics.record_touch_call();

        if let Some(&handle) = self.index.get(key) {
            self.order.move_to_front(handle);

            #[cfg(feature = "metrics")]
            self.metrics.record_touch_found();

            self.debug_validate();
            true
        } else {
            false
        }
    }

    fn recency_rank(&self, key: &K) -> Option<usize> {
        #[cfg(feature = "metrics")]
        self.metrics.record_recency_rank_call();

        let &target = self.index.get(key)?;
        for (rank, handle) in self.order.iter_handles().enumerate() {
            #[cfg(feature = "metrics")]
            self.metrics.record_recency_rank_scan_step();

            if handle == target {
                #[cfg(feature = "metrics")]
                self.metrics.record_recency_rank_found();
                return Some(rank);
            }
        }
        None
    }
}

#[cfg(feature = "metrics")]
impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        LruMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            insert_calls: self.metrics.insert_calls,
            insert_updates: self.metrics.insert_updates,
            insert_new: self.metrics.insert_new,
            evict_calls: self.metrics.evict_calls,
            evicted_entries: self.metrics.evicted_entries,
            peek_calls: self.metrics.peek_calls.get(),
            peek_hits: self.metrics.peek_hits.get(),
            pop_lru_calls: self.metrics.pop_lru_calls,
            pop_lru_found: self.metrics.pop_lru_found,
            peek_lru_calls: self.metrics.peek_lru_calls.get(),
            peek_lru_found: self.metrics.peek_lru_found.get(),
            touch_calls: self.metrics.touch_calls,
            touch_found: self.metrics.touch_found,
            recency_rank_calls: self.metrics.recency_rank_calls.get(),
            recency_rank_found: self.metrics.recency_rank_found.get(),
            recency_rank_scan_steps: self.metrics.recency_rank_scan_steps.get(),
            cache_len: self.index.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider<LruMetricsSnapshot> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> LruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

impl<K, V> Extend<(K, Arc<V>)> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn extend<T: IntoIterator<Item = (K, Arc<V>)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Thread-safe LRU cache wrapper using `parking_lot::RwLock`.
///
/// The core mutates the index and the ordering together, so one lock guards
/// both. Reads that reorder (`get`, `touch`) take the write lock; pure reads
/// (`peek`, `contains`, `len`) take the read lock and may run concurrently.
#[cfg(feature = "concurrency")]
#[derive(Clone)]
pub struct ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Arc<RwLock<LruCache<K, V>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Creates a thread-safe cache that holds at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapacity`] if `capacity` is 0.
    ///
    /// # Example
    ///
    /// ```
    /// use lrukit::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(100).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        Ok(Self {
            inner: Arc::new(RwLock::new(LruCache::new(capacity)?)),
        })
    }

    /// Inserts a value, wrapping it in `Arc<V>` internally.
    ///
    /// Returns the previous `Arc<V>` if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<Arc<V>> {
        let value_arc = Arc::new(value);
        let mut cache = self.inner.write();
        cache.insert(key, value_arc)
    }

    /// Inserts an `Arc<V>` directly (no re-wrapping if already shared).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use lrukit::policy::lru::ConcurrentLruCache;
    ///
    /// let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(10).unwrap();
    /// let shared = Arc::new("shared".to_string());
    /// cache.insert_arc(1, Arc::clone(&shared));
    ///
    /// let retrieved = cache.get(&1).unwrap();
    /// assert!(Arc::ptr_eq(&shared, &retrieved));
    /// ```
    pub fn insert_arc(&self, key: K, value: Arc<V>) -> Option<Arc<V>> {
        let mut cache = self.inner.write();
        cache.insert(key, value)
    }

    /// Gets a value snapshot, moving the entry to the MRU position.
    ///
    /// Takes the write lock because it reorders.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut cache = self.inner.write();
        cache.get(key)
    }

    /// Value snapshot without a recency touch; read lock only.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let cache = self.inner.read();
        cache.peek(key)
    }

    /// Removes an entry and returns its value.
    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        let mut cache = self.inner.write();
        cache.remove(key)
    }

    /// Marks an entry as recently used without retrieving the value.
    pub fn touch(&self, key: &K) -> bool {
        let mut cache = self.inner.write();
        cache.touch(key)
    }

    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        let cache = self.inner.read();
        cache.len()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        let cache = self.inner.read();
        cache.is_empty()
    }

    /// Returns the maximum capacity.
    pub fn capacity(&self) -> usize {
        let cache = self.inner.read();
        cache.capacity()
    }

    /// Returns `true` if the key exists; does not affect recency order.
    pub fn contains(&self, key: &K) -> bool {
        let cache = self.inner.read();
        cache.contains(key)
    }

    /// Clears all entries.
    pub fn clear(&self) {
        let mut cache = self.inner.write();
        cache.clear()
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&self) -> Option<(K, Arc<V>)> {
        let mut cache = self.inner.write();
        cache.pop_lru()
    }

    /// Snapshot of the least recently used entry without removing it.
    pub fn peek_lru(&self) -> Option<(K, Arc<V>)> {
        let cache = self.inner.read();
        cache.peek_lru()
    }
}

#[cfg(all(feature = "metrics", feature = "concurrency"))]
impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    pub fn metrics_snapshot(&self) -> LruMetricsSnapshot {
        let cache = self.inner.read();
        cache.metrics_snapshot()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> ConcurrentCache for ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.read();
        f.debug_struct("ConcurrentLruCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(all(feature = "metrics", feature = "concurrency"))]
impl<K, V> MetricsSnapshotProvider<LruMetricsSnapshot> for ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn snapshot(&self) -> LruMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<u32, i32> {
        LruCache::new(capacity).unwrap()
    }

    fn keys_mru_to_lru(cache: &LruCache<u32, i32>) -> Vec<u32> {
        cache.iter().map(|(k, _)| k).collect()
    }

    mod construction {
        use super::*;

        #[test]
        fn rejects_zero_capacity() {
            let err = LruCache::<u32, i32>::new(0).unwrap_err();
            assert_eq!(err.requested(), 0);
            assert!(err.to_string().contains("at least 1"));
        }

        #[test]
        fn accepts_capacity_one_and_up() {
            for capacity in [1usize, 2, 100, 10_000] {
                let cache = LruCache::<u32, i32>::new(capacity).unwrap();
                assert_eq!(cache.capacity(), capacity);
                assert_eq!(cache.len(), 0);
                assert!(cache.is_empty());
            }
        }
    }

    mod basic_behavior {
        use super::*;

        #[test]
        fn insert_single_item() {
            let mut cache = cache(5);
            assert!(cache.insert(1, Arc::new(100)).is_none());
            assert_eq!(cache.len(), 1);
            assert!(cache.contains(&1));
        }

        #[test]
        fn get_existing_item() {
            let mut cache = cache(5);
            cache.insert(1, Arc::new(100));
            assert_eq!(*cache.get(&1).unwrap(), 100);
        }

        #[test]
        fn get_missing_key_is_none() {
            let mut cache = cache(5);
            cache.insert(1, Arc::new(100));
            assert!(cache.get(&2).is_none());
        }

        #[test]
        fn insert_duplicate_key_updates_value() {
            let mut cache = cache(5);
            assert!(cache.insert(1, Arc::new(100)).is_none());

            let previous = cache.insert(1, Arc::new(200)).unwrap();
            assert_eq!(*previous, 100);
            assert_eq!(cache.len(), 1);
            assert_eq!(*cache.get(&1).unwrap(), 200);
        }

        #[test]
        fn peek_does_not_reorder() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            assert_eq!(*cache.peek(&1).unwrap(), 10);
            assert_eq!(keys_mru_to_lru(&cache), vec![3, 2, 1]);

            cache.insert(4, Arc::new(40));
            assert!(!cache.contains(&1));
        }

        #[test]
        fn remove_existing_item() {
            let mut cache = cache(5);
            cache.insert(1, Arc::new(100));

            let removed = cache.remove(&1).unwrap();
            assert_eq!(*removed, 100);
            assert_eq!(cache.len(), 0);
            assert!(!cache.contains(&1));
            assert!(cache.remove(&1).is_none());
        }

        #[test]
        fn clear_empties_both_structures() {
            let mut cache = cache(5);
            for i in 1..=3 {
                cache.insert(i, Arc::new(i as i32 * 10));
            }
            cache.clear();
            assert_eq!(cache.len(), 0);
            for i in 1..=3 {
                assert!(!cache.contains(&i));
            }
            // Reusable after clear
            cache.insert(7, Arc::new(70));
            assert_eq!(*cache.get(&7).unwrap(), 70);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn empty_cache_operations() {
            let mut cache = cache(5);
            assert!(cache.get(&1).is_none());
            assert!(cache.peek(&1).is_none());
            assert!(!cache.contains(&1));
            assert!(cache.remove(&1).is_none());
            assert!(cache.pop_lru().is_none());
            assert!(cache.peek_lru().is_none());
            assert!(!cache.touch(&1));
            assert!(cache.recency_rank(&1).is_none());
        }

        #[test]
        fn extend_inserts_in_order() {
            let mut cache = cache(10);
            cache.extend((1..=3).map(|i| (i, Arc::new(i as i32))));
            assert_eq!(cache.len(), 3);
            assert_eq!(keys_mru_to_lru(&cache), vec![3, 2, 1]);
        }

        #[test]
        fn debug_output_reports_len_and_capacity() {
            let mut cache = cache(5);
            cache.insert(1, Arc::new(1));
            let dbg = format!("{:?}", cache);
            assert!(dbg.contains("LruCache"));
            assert!(dbg.contains("len: 1"));
            assert!(dbg.contains("capacity: 5"));
        }
    }

    mod recency_semantics {
        use super::*;

        #[test]
        fn get_promotes_entry_to_mru() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            cache.get(&1);
            assert_eq!(keys_mru_to_lru(&cache), vec![1, 3, 2]);

            // Key 2 is now LRU and is the eviction candidate
            cache.insert(4, Arc::new(40));
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn update_promotes_entry_to_mru() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            cache.insert(1, Arc::new(11));
            assert_eq!(keys_mru_to_lru(&cache), vec![1, 3, 2]);
        }

        #[test]
        fn touch_promotes_without_value() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            assert!(cache.touch(&1));
            cache.insert(4, Arc::new(40));
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
            assert!(!cache.touch(&99));
        }

        #[test]
        fn miss_leaves_order_untouched() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));

            let before = keys_mru_to_lru(&cache);
            assert!(cache.get(&99).is_none());
            assert_eq!(keys_mru_to_lru(&cache), before);
            assert_eq!(cache.len(), 2);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn repeated_touches_are_idempotent_on_order() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));

            cache.get(&2);
            cache.get(&2);
            assert!(cache.touch(&2));
            assert_eq!(keys_mru_to_lru(&cache), vec![2, 1]);
        }

        #[test]
        fn recency_rank_counts_from_mru() {
            let mut cache = cache(5);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            assert_eq!(cache.recency_rank(&3), Some(0));
            assert_eq!(cache.recency_rank(&2), Some(1));
            assert_eq!(cache.recency_rank(&1), Some(2));
            assert_eq!(cache.recency_rank(&99), None);
        }

        #[test]
        fn peek_lru_reports_eviction_candidate() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));

            assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(1));
            cache.get(&1);
            assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(2));
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn pop_lru_drains_in_recency_order() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));
            cache.get(&1);

            let order: Vec<u32> = std::iter::from_fn(|| cache.pop_lru().map(|(k, _)| k)).collect();
            assert_eq!(order, vec![2, 3, 1]);
            assert!(cache.is_empty());
        }
    }

    mod capacity_and_eviction {
        use super::*;

        #[test]
        fn eviction_removes_least_recently_inserted() {
            let mut cache = cache(2);
            cache.insert(1, Arc::new(1));
            cache.insert(2, Arc::new(2));
            cache.insert(3, Arc::new(3));

            assert_eq!(cache.len(), 2);
            assert!(!cache.contains(&1));
            assert!(cache.contains(&2));
            assert!(cache.contains(&3));
        }

        #[test]
        fn get_hit_shields_entry_from_eviction() {
            let mut cache = cache(2);
            cache.insert(1, Arc::new(1));
            cache.insert(2, Arc::new(2));

            assert_eq!(*cache.get(&1).unwrap(), 1);
            cache.insert(3, Arc::new(3));

            assert!(cache.get(&2).is_none());
            assert_eq!(*cache.get(&3).unwrap(), 3);
            assert_eq!(*cache.get(&1).unwrap(), 1);
        }

        #[test]
        fn capacity_one_keeps_only_latest() {
            let mut cache: LruCache<u32, &str> = LruCache::new(1).unwrap();
            cache.insert(1, Arc::new("a"));
            cache.insert(2, Arc::new("b"));

            assert_eq!(cache.len(), 1);
            assert!(cache.get(&1).is_none());
            assert_eq!(*cache.get(&2).unwrap(), "b");
        }

        #[test]
        fn capacity_one_update_does_not_evict() {
            let mut cache: LruCache<u32, &str> = LruCache::new(1).unwrap();
            cache.insert(1, Arc::new("a"));
            let previous = cache.insert(1, Arc::new("b")).unwrap();
            assert_eq!(*previous, "a");
            assert_eq!(cache.len(), 1);
            assert_eq!(*cache.get(&1).unwrap(), "b");
        }

        #[test]
        fn touched_then_inserted_evicts_oldest_untouched() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));

            assert_eq!(*cache.get(&2).unwrap(), 20);
            cache.insert(4, Arc::new(40));

            assert!(cache.get(&1).is_none());
            assert_eq!(*cache.get(&2).unwrap(), 20);
            assert_eq!(*cache.get(&3).unwrap(), 30);
            assert_eq!(*cache.get(&4).unwrap(), 40);
        }

        #[test]
        fn update_after_eviction_round_keeps_count_stable() {
            let mut cache = cache(3);
            cache.insert(1, Arc::new(10));
            cache.insert(2, Arc::new(20));
            cache.insert(3, Arc::new(30));
            cache.get(&2);
            cache.insert(4, Arc::new(40));

            cache.insert(2, Arc::new(200));
            assert_eq!(*cache.get(&2).unwrap(), 200);
            assert_eq!(cache.len(), 3);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn entry_count_never_exceeds_capacity() {
            let mut cache = cache(4);
            for i in 0..64u32 {
                cache.insert(i, Arc::new(i as i32));
                assert!(cache.len() <= 4);
                cache.check_invariants().unwrap();
            }
            assert_eq!(cache.len(), 4);
        }

        #[test]
        fn evicted_value_snapshot_stays_alive() {
            let mut cache: LruCache<u32, String> = LruCache::new(1).unwrap();
            cache.insert(1, Arc::new("kept".to_string()));
            let snapshot = cache.get(&1).unwrap();

            cache.insert(2, Arc::new("evictor".to_string()));
            assert!(!cache.contains(&1));
            assert_eq!(*snapshot, "kept");
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics_counters {
        use super::*;

        #[test]
        fn counters_track_hits_misses_and_evictions() {
            let mut cache = cache(2);
            cache.insert(1, Arc::new(1));
            cache.insert(2, Arc::new(2));
            cache.insert(3, Arc::new(3)); // evicts
            cache.insert(3, Arc::new(4)); // update
            cache.get(&3);
            cache.get(&99);
            cache.peek(&2);
            cache.peek(&99);

            let snap = cache.metrics_snapshot();
            assert_eq!(snap.insert_calls, 4);
            assert_eq!(snap.insert_new, 3);
            assert_eq!(snap.insert_updates, 1);
            assert_eq!(snap.evicted_entries, 1);
            assert_eq!(snap.get_hits, 1);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(snap.peek_calls, 2);
            assert_eq!(snap.peek_hits, 1);
            assert_eq!(snap.cache_len, 2);
            assert_eq!(snap.capacity, 2);
        }
    }

    #[cfg(feature = "concurrency")]
    mod concurrent_wrapper {
        use super::*;

        #[test]
        fn rejects_zero_capacity() {
            assert!(ConcurrentLruCache::<u32, i32>::new(0).is_err());
        }

        #[test]
        fn basic_ops_through_the_lock() {
            let cache: ConcurrentLruCache<u32, String> = ConcurrentLruCache::new(2).unwrap();
            assert!(cache.insert(1, "one".to_string()).is_none());
            let previous = cache.insert(1, "uno".to_string()).unwrap();
            assert_eq!(*previous, "one");

            assert_eq!(*cache.get(&1).unwrap(), "uno");
            assert_eq!(*cache.peek(&1).unwrap(), "uno");
            assert!(cache.contains(&1));
            assert_eq!(cache.len(), 1);
            assert!(!cache.is_empty());

            cache.insert(2, "two".to_string());
            cache.insert(3, "three".to_string()); // evicts LRU
            assert_eq!(cache.len(), 2);

            cache.clear();
            assert!(cache.is_empty());
        }

        #[test]
        fn shared_across_threads() {
            let cache: ConcurrentLruCache<u32, u32> = ConcurrentLruCache::new(128).unwrap();

            let handles: Vec<_> = (0..4u32)
                .map(|t| {
                    let cache = cache.clone();
                    std::thread::spawn(move || {
                        for i in 0..32u32 {
                            cache.insert(t * 100 + i, i);
                            cache.get(&(t * 100 + i));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(cache.len(), 128);
        }
    }
}
