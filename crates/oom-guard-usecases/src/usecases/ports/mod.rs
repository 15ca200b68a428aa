pub mod clock;
pub mod memory_report;
pub mod task_spawner;
pub mod termination_strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::Clock;
pub use memory_report::MemoryReportSource;
pub use task_spawner::SpawnError;
pub use task_spawner::Task;
pub use task_spawner::TaskSpawner;
pub use termination_strategy::TerminationContext;
pub use termination_strategy::TerminationStrategy;
pub use termination_strategy::TerminationStrategyHandle;
