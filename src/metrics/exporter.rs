use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::LruMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// Writes in the Prometheus text exposition format so it can be scraped by
/// Prometheus or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_metric(&self, kind: &str, name: &str, value: u64) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "# TYPE {}_{} {}", self.prefix, name, kind);
        let _ = writeln!(writer, "{}_{} {}", self.prefix, name, value);
    }

    fn write_counter(&self, name: &str, value: u64) {
        self.write_metric("counter", name, value);
    }

    fn write_gauge(&self, name: &str, value: u64) {
        self.write_metric("gauge", name, value);
    }
}

impl<W: Write + Send + Sync> MetricsExporter<LruMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &LruMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("insert_calls_total", snapshot.insert_calls);
        self.write_counter("insert_updates_total", snapshot.insert_updates);
        self.write_counter("insert_new_total", snapshot.insert_new);
        self.write_counter("evict_calls_total", snapshot.evict_calls);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("peek_calls_total", snapshot.peek_calls);
        self.write_counter("peek_hits_total", snapshot.peek_hits);
        self.write_counter("pop_lru_calls_total", snapshot.pop_lru_calls);
        self.write_counter("pop_lru_found_total", snapshot.pop_lru_found);
        self.write_counter("touch_calls_total", snapshot.touch_calls);
        self.write_counter("touch_found_total", snapshot.touch_found);
        self.write_gauge("entries", snapshot.cache_len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
    }
}
