//! Parsed OS memory counters and the pressure figures derived from them.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::gate::PressureMetric;

const KIB: u64 = 1024;

/// Counter names read from a meminfo-style report.
pub struct MemoryKey;

impl MemoryKey {
    pub const TOTAL: &'static str = "MemTotal";
    pub const AVAILABLE: &'static str = "MemAvailable";
    pub const FREE: &'static str = "MemFree";
    pub const BUFFERS: &'static str = "Buffers";
    pub const CACHED: &'static str = "Cached";
    /// Resident set size, from `/proc/<pid>/status`.
    pub const RESIDENT: &'static str = "VmRSS";
}

/// Counter name to magnitude. `kB` counters are stored in bytes, unitless
/// counters (e.g. `HugePages_Total`) verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryValues {
    values: HashMap<String, u64>,
}

impl MemoryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a line-oriented `Key: value [kB]` report.
    ///
    /// Lines without a colon, with a non-numeric value, with a unit other
    /// than `kB`, or whose byte count overflows `u64` are skipped. A later
    /// line with the same key overwrites the earlier one.
    pub fn parse(report: &str) -> Self {
        let mut values = HashMap::new();
        for line in report.lines() {
            if let Some((key, value)) = parse_line(line) {
                values.insert(key.to_string(), value);
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `MemTotal`, or 0 when the report did not carry it.
    pub fn total(&self) -> u64 {
        self.get(MemoryKey::TOTAL).unwrap_or(0)
    }

    /// Kernel `MemAvailable` estimate when present.
    ///
    /// Kernels older than 3.14 lack it; the fallback `MemFree + Buffers +
    /// Cached` is slightly optimistic since not all page cache can be
    /// reclaimed under pressure.
    pub fn available(&self) -> u64 {
        if let Some(available) = self.get(MemoryKey::AVAILABLE) {
            return available;
        }
        [MemoryKey::FREE, MemoryKey::BUFFERS, MemoryKey::CACHED]
            .iter()
            .map(|key| self.get(key).unwrap_or(0))
            .fold(0u64, u64::saturating_add)
    }

    /// Non-reclaimable memory in bytes. The fallback `available()` can
    /// exceed `total()`; that reads as nothing used.
    pub fn used(&self) -> u64 {
        self.total().saturating_sub(self.available())
    }

    /// `used / total` in `[0, 1]`, or 0.0 without a total (fail-open).
    pub fn used_fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.used() as f64 / total as f64).clamp(0.0, 1.0)
    }

    /// Resident set size of the reporting process, 0 when absent.
    pub fn resident(&self) -> u64 {
        self.get(MemoryKey::RESIDENT).unwrap_or(0)
    }

    /// `resident / total` in `[0, 1]`, or 0.0 without a total.
    pub fn resident_fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.resident() as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn pressure(&self, metric: PressureMetric) -> f64 {
        match metric {
            PressureMetric::System => self.used_fraction(),
            PressureMetric::Process => self.resident_fraction(),
        }
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            total_bytes: self.total(),
            available_bytes: self.available(),
            used_bytes: self.used(),
            used_fraction: self.used_fraction(),
        }
    }
}

fn parse_line(line: &str) -> Option<(&str, u64)> {
    let (key, rest) = line.split_once(':')?;
    let mut tokens = rest.split_whitespace();
    let number = tokens.next()?.parse::<u64>().ok()?;
    match (tokens.next(), tokens.next()) {
        (None, _) => Some((key, number)),
        (Some("kB"), None) => number.checked_mul(KIB).map(|bytes| (key, bytes)),
        _ => None,
    }
}

/// Point-in-time memory pressure reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub used_fraction: f64,
}
