//! # Metrics Trait Hierarchy
//!
//! Separates *recording*, *snapshotting*, and *export* responsibilities into
//! small, composable traits so production monitoring and bench/test tooling
//! never couple to the cache policy logic.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────┐
//!   │     CoreMetricsRecorder     │
//!   │  get_hit/get_miss/insert    │
//!   │  evict/clear                │
//!   └──────────────┬──────────────┘
//!                  │
//!                  ▼
//!   ┌─────────────────────────────┐   ┌─────────────────────────────┐
//!   │     LruMetricsRecorder      │   │   LruMetricsReadRecorder    │
//!   │  pop_lru/touch/rank (&mut)  │   │  peek/peek_lru/rank (&self) │
//!   └─────────────────────────────┘   └─────────────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐   ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │   │ MetricsExporter<S>           │
//!   │ (bench/test)                 │   │ (production monitoring)      │
//!   └──────────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The read recorder exists because `peek`/`peek_lru`/`recency_rank` take
//! `&self`; their counters live in [`MetricsCell`](crate::metrics::cell::MetricsCell)s.

/// Common counters for the cache core.
pub trait CoreMetricsRecorder {
    fn record_get_hit(&mut self);
    fn record_get_miss(&mut self);
    fn record_insert_call(&mut self);
    fn record_insert_new(&mut self);
    fn record_insert_update(&mut self);
    fn record_evict_call(&mut self);
    fn record_evicted_entry(&mut self);
    fn record_clear(&mut self);
}

/// Counters for recency-ordered operations that take `&mut self`.
pub trait LruMetricsRecorder: CoreMetricsRecorder {
    fn record_pop_lru_call(&mut self);
    fn record_pop_lru_found(&mut self);
    fn record_touch_call(&mut self);
    fn record_touch_found(&mut self);
}

/// Counters for read-only operations recorded through `&self`.
pub trait LruMetricsReadRecorder {
    fn record_peek_call(&self);
    fn record_peek_hit(&self);
    fn record_peek_lru_call(&self);
    fn record_peek_lru_found(&self);
    fn record_recency_rank_call(&self);
    fn record_recency_rank_found(&self);
    fn record_recency_rank_scan_step(&self);
}

/// Produces a point-in-time snapshot of recorded metrics.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Publishes a metrics snapshot to a monitoring system.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
