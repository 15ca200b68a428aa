//! Outcomes of comparing a pressure reading against a threshold.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What a gate does once the threshold is exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressureAction {
    /// Short-circuit the request as unavailable.
    #[default]
    Reject,
    /// Let the request through and start a termination attempt.
    SelfDestruct,
}

impl PressureAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureAction::Reject => "reject",
            PressureAction::SelfDestruct => "selfdestruct",
        }
    }
}

impl fmt::Display for PressureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PressureAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(PressureAction::Reject),
            "selfdestruct" | "self-destruct" | "terminate" => Ok(PressureAction::SelfDestruct),
            _ => Err(ParseEnumError {
                kind: "pressure action",
                value: s.to_string(),
            }),
        }
    }
}

/// Which figure the gate compares against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressureMetric {
    /// System-wide used memory over total memory.
    #[default]
    System,
    /// This process's resident set over total memory.
    Process,
}

impl PressureMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureMetric::System => "system",
            PressureMetric::Process => "process",
        }
    }
}

impl fmt::Display for PressureMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PressureMetric {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(PressureMetric::System),
            "process" | "self" => Ok(PressureMetric::Process),
            _ => Err(ParseEnumError {
                kind: "pressure metric",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Reject,
    Terminate,
}

impl GateDecision {
    /// Whether the current request still reaches the inner handler.
    pub fn forwards_request(&self) -> bool {
        !matches!(self, GateDecision::Reject)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
