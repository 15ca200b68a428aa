//! Cached, throttled view of system memory pressure.
//!
//! Every guarded request asks for the used fraction, so the OS report is
//! re-read at most once per update interval and readers share the cached
//! counters. A refresh holds the write lock for the whole read and parse,
//! which means readers see either the previous map or the new one.

use std::io;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::common::rwlock_read_or_recover;
use crate::common::rwlock_write_or_recover;
use crate::domain::MemorySnapshot;
use crate::domain::MemoryValues;
use crate::domain::PressureMetric;
use crate::usecases::ports::Clock;
use crate::usecases::ports::MemoryReportSource;

#[derive(Debug, Error)]
pub enum MemoryStatsError {
    #[error("failed to read memory report from {origin}: {source}")]
    ReadReport {
        origin: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Default)]
struct StatsCache {
    values: MemoryValues,
    last_update: Option<Instant>,
    update_interval: Option<Duration>,
}

impl StatsCache {
    fn is_fresh(&self, now: Instant) -> bool {
        match (self.update_interval, self.last_update) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) < interval,
            _ => false,
        }
    }
}

pub struct MemoryStatsProvider {
    source: Arc<dyn MemoryReportSource>,
    clock: Arc<dyn Clock>,
    metric: PressureMetric,
    cache: RwLock<StatsCache>,
}

impl MemoryStatsProvider {
    /// Provider that re-reads the source on every call until an update
    /// interval is set.
    pub fn new(source: Arc<dyn MemoryReportSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            metric: PressureMetric::default(),
            cache: RwLock::new(StatsCache::default()),
        }
    }

    pub fn with_update_interval(self, interval: Duration) -> Self {
        self.set_update_interval(interval);
        self
    }

    /// Selects the figure returned by [`Self::pressure`]. The source must
    /// carry the matching counters (`VmRSS` for the process metric).
    pub fn with_metric(mut self, metric: PressureMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn metric(&self) -> PressureMetric {
        self.metric
    }

    /// Minimum time between OS reads. Zero disables throttling.
    pub fn set_update_interval(&self, interval: Duration) {
        let mut cache = rwlock_write_or_recover(&self.cache);
        cache.update_interval = (!interval.is_zero()).then_some(interval);
    }

    pub fn update_interval(&self) -> Option<Duration> {
        rwlock_read_or_recover(&self.cache).update_interval
    }

    pub fn last_update(&self) -> Option<Instant> {
        rwlock_read_or_recover(&self.cache).last_update
    }

    /// Re-reads the report unless the last successful refresh is younger
    /// than the update interval.
    ///
    /// A failed read leaves the cached counters and the refresh timestamp
    /// untouched, so the next call tries again.
    pub fn refresh(&self) -> Result<(), MemoryStatsError> {
        let mut cache = rwlock_write_or_recover(&self.cache);
        let now = self.clock.now();
        if cache.is_fresh(now) {
            return Ok(());
        }

        let report = self
            .source
            .read_report()
            .map_err(|source| MemoryStatsError::ReadReport {
                origin: self.source.describe(),
                source,
            })?;
        cache.values = MemoryValues::parse(&report);
        cache.last_update = Some(now);
        if cache.values.is_empty() {
            debug!(origin = %self.source.describe(), "Memory report carried no counters");
            return Ok(());
        }
        debug!(
            counters = cache.values.len(),
            total = cache.values.total(),
            available = cache.values.available(),
            "Refreshed memory report"
        );
        Ok(())
    }

    /// Total memory in bytes, 0 when unknown.
    pub fn total(&self) -> u64 {
        rwlock_read_or_recover(&self.cache).values.total()
    }

    pub fn available(&self) -> u64 {
        rwlock_read_or_recover(&self.cache).values.available()
    }

    /// Saturates at 0 when the fallback availability overshoots the total.
    pub fn used(&self) -> u64 {
        rwlock_read_or_recover(&self.cache).values.used()
    }

    /// Refreshes (subject to throttling) and returns `used / total`.
    ///
    /// Fails open: a report that cannot be read is logged and the last
    /// known counters are used, which read as 0.0 until a first refresh
    /// succeeds.
    pub fn used_fraction(&self) -> f64 {
        self.refresh_or_log();
        rwlock_read_or_recover(&self.cache).values.used_fraction()
    }

    /// Refreshes (subject to throttling) and returns the configured
    /// metric: `used_fraction` for the system metric, resident set over
    /// total memory for the process metric. Fails open like
    /// `used_fraction`.
    pub fn pressure(&self) -> f64 {
        self.refresh_or_log();
        rwlock_read_or_recover(&self.cache).values.pressure(self.metric)
    }

    /// Like `used_fraction` but reports every derived figure from one
    /// consistent read.
    pub fn snapshot(&self) -> MemorySnapshot {
        self.refresh_or_log();
        rwlock_read_or_recover(&self.cache).values.snapshot()
    }

    /// Copy of the raw counters from the last successful refresh.
    pub fn values(&self) -> MemoryValues {
        rwlock_read_or_recover(&self.cache).values.clone()
    }

    fn refresh_or_log(&self) {
        if let Err(err) = self.refresh() {
            warn!(error = %err, "Memory report unavailable; using last known values");
        }
    }
}
