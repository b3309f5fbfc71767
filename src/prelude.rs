pub use crate::ds::{Arena, Handle, RecencyList};
pub use crate::error::{InvalidCapacity, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::LruMetricsSnapshot;
#[cfg(feature = "concurrency")]
pub use crate::policy::lru::ConcurrentLruCache;
pub use crate::policy::lru::LruCache;
pub use crate::traits::{ConcurrentCache, CoreCache, LruCacheTrait, MutableCache};
