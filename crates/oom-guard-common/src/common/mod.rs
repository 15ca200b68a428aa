mod sync;
pub mod telemetry;

pub use sync::poison_recovery_count;
pub use sync::rwlock_read_or_recover;
pub use sync::rwlock_write_or_recover;
pub use telemetry::TelemetryGuard;
pub use telemetry::init_tracing;
