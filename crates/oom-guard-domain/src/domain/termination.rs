//! Self-termination coordinator states and signal targets.

use std::fmt;
use std::str::FromStr;

use crate::domain::gate::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationState {
    Idle,
    Terminating,
}

/// Result of asking the coordinator to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// This call won the guard and the strategy was scheduled.
    Accepted,
    /// Another attempt is in flight or already succeeded.
    AlreadyTerminating,
    /// The strategy could not be scheduled; the guard was re-armed.
    SpawnFailed,
}

impl TriggerOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TriggerOutcome::Accepted)
    }
}

/// Which processes a signal-based strategy targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalScope {
    /// Every process in the caller's process group (supervisor restarts
    /// the whole group).
    #[default]
    ProcessGroup,
    /// Only the current process.
    Process,
}

impl SignalScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalScope::ProcessGroup => "group",
            SignalScope::Process => "process",
        }
    }
}

impl fmt::Display for SignalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalScope {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" | "process-group" | "pgid" => Ok(SignalScope::ProcessGroup),
            "process" | "self" | "pid" => Ok(SignalScope::Process),
            _ => Err(ParseEnumError {
                kind: "signal scope",
                value: s.to_string(),
            }),
        }
    }
}
