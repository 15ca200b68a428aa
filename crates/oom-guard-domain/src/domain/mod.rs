pub mod gate;
pub mod memory;
pub mod termination;

pub use gate::GateDecision;
pub use gate::ParseEnumError;
pub use gate::PressureAction;
pub use gate::PressureMetric;
pub use memory::MemoryKey;
pub use memory::MemorySnapshot;
pub use memory::MemoryValues;
pub use termination::SignalScope;
pub use termination::TerminationState;
pub use termination::TriggerOutcome;
