//! Process-wide default memory provider.
//!
//! Created on first use over the platform's report source and never torn
//! down. Independent providers can still be built with
//! [`MemoryStatsProvider::new`] for tests and embedding.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use crate::infra::SystemClock;
use crate::infra::default_report_source;
use crate::usecases::MemoryStatsProvider;

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

static DEFAULT_PROVIDER: OnceLock<Arc<MemoryStatsProvider>> = OnceLock::new();

pub fn default_provider() -> Arc<MemoryStatsProvider> {
    Arc::clone(DEFAULT_PROVIDER.get_or_init(|| {
        Arc::new(
            MemoryStatsProvider::new(default_report_source(), Arc::new(SystemClock))
                .with_update_interval(DEFAULT_UPDATE_INTERVAL),
        )
    }))
}

/// Fraction of system memory in use, from the default provider.
pub fn used_fraction() -> f64 {
    default_provider().used_fraction()
}

/// Changes the default provider's refresh throttle. A zero interval is
/// ignored so a misconfigured caller cannot disable throttling globally.
pub fn set_update_interval(interval: Duration) {
    if interval.is_zero() {
        return;
    }
    default_provider().set_update_interval(interval);
}
