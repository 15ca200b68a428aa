pub mod memory_stats;
pub mod ports;
pub mod pressure_gate;
pub mod terminator;

pub use memory_stats::MemoryStatsError;
pub use memory_stats::MemoryStatsProvider;
pub use pressure_gate::PressureGate;
pub use terminator::GuardedTerminator;
