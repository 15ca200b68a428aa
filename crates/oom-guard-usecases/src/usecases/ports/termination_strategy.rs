use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Inputs handed to a termination attempt.
///
/// The cancellation flag is shared by every clone. Nothing in the
/// coordinator sets it; hosts can cancel from elsewhere and long-running
/// graceful strategies are expected to poll it.
#[derive(Debug, Clone, Default)]
pub struct TerminationContext {
    cancelled: Arc<AtomicBool>,
    used_fraction: f64,
    threshold: f64,
}

impl TerminationContext {
    pub fn new(used_fraction: f64, threshold: f64) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            used_fraction,
            threshold,
        }
    }

    /// Shares an existing cancellation flag, e.g. the server's shutdown flag.
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Pressure reading that caused the trigger.
    pub fn used_fraction(&self) -> f64 {
        self.used_fraction
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// One attempt at taking the process down.
///
/// Returns `true` when the shutdown was initiated (not necessarily
/// completed); `false` re-arms the coordinator so a later pressure spike
/// can retry.
pub trait TerminationStrategy: Send + Sync {
    fn attempt(&self, ctx: &TerminationContext) -> bool;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> TerminationStrategy for F
where
    F: Fn(&TerminationContext) -> bool + Send + Sync,
{
    fn attempt(&self, ctx: &TerminationContext) -> bool {
        self(ctx)
    }
}

pub type TerminationStrategyHandle = Arc<dyn TerminationStrategy>;
