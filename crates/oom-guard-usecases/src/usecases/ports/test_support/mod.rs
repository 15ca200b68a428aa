//! Test-only doubles for the use case ports.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod manual_clock;
mod stub_report_source;
mod stub_spawner;
mod stub_strategy;

pub use manual_clock::ManualClock;
pub use stub_report_source::StubReportSource;
pub use stub_spawner::InlineSpawner;
pub use stub_spawner::RefusingSpawner;
pub use stub_spawner::ThreadPerTaskSpawner;
pub use stub_strategy::CountingStrategy;
