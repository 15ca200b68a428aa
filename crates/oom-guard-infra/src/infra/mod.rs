//! OS-facing implementations of the use case ports.

mod config;
mod meminfo;
#[cfg(unix)]
mod shutdown_signals;
#[cfg(unix)]
mod signal_strategy;
mod spawner;
mod system_clock;

pub use config::GuardConfig;
pub use meminfo::ProcMeminfoSource;
pub use meminfo::ProcessMemorySource;
pub use meminfo::UnsupportedPlatformSource;
pub use meminfo::default_report_source;
pub use meminfo::report_source_for;
#[cfg(unix)]
pub use shutdown_signals::ShutdownNotifier;
#[cfg(unix)]
pub use shutdown_signals::ShutdownSignals;
#[cfg(unix)]
pub use shutdown_signals::SignalSetupError;
#[cfg(unix)]
pub use signal_strategy::SignalStrategy;
pub use spawner::ThreadSpawner;
pub use spawner::TokioSpawner;
pub use system_clock::SystemClock;
