use tracing::warn;

use crate::domain::GateDecision;
use crate::domain::PressureAction;

/// Compares a used fraction against a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureGate {
    threshold: f64,
    action: PressureAction,
}

impl PressureGate {
    /// Thresholds are expected in `[0, 1]`; anything else is kept as given
    /// (above 1 never fires, below 0 always fires) and logged.
    pub fn new(threshold: f64, action: PressureAction) -> Self {
        if !(0.0..=1.0).contains(&threshold) {
            warn!(threshold, "Memory threshold outside [0, 1]");
        }
        Self { threshold, action }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn action(&self) -> PressureAction {
        self.action
    }

    /// Strictly greater than the threshold.
    pub fn exceeds(&self, used_fraction: f64) -> bool {
        used_fraction > self.threshold
    }

    pub fn evaluate(&self, used_fraction: f64) -> GateDecision {
        if !self.exceeds(used_fraction) {
            return GateDecision::Allow;
        }
        match self.action {
            PressureAction::Reject => GateDecision::Reject,
            PressureAction::SelfDestruct => GateDecision::Terminate,
        }
    }
}
