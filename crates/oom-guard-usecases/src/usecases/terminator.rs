//! Single-flight self-termination.
//!
//! Under memory pressure every in-flight request may ask for termination at
//! once. One compare-and-swap on a shared flag picks a single winner; the
//! winner's strategy runs on the task spawner so the request is never held
//! up. A failed or panicking attempt re-arms the flag, a successful one
//! leaves it set for the rest of the process lifetime.

use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::domain::TerminationState;
use crate::domain::TriggerOutcome;
use crate::usecases::ports::TaskSpawner;
use crate::usecases::ports::TerminationContext;
use crate::usecases::ports::TerminationStrategy;

pub struct GuardedTerminator {
    terminating: Arc<AtomicBool>,
    spawner: Arc<dyn TaskSpawner>,
}

impl GuardedTerminator {
    pub fn new(spawner: Arc<dyn TaskSpawner>) -> Self {
        Self {
            terminating: Arc::new(AtomicBool::new(false)),
            spawner,
        }
    }

    pub fn state(&self) -> TerminationState {
        if self.terminating.load(Ordering::SeqCst) {
            TerminationState::Terminating
        } else {
            TerminationState::Idle
        }
    }

    pub fn is_terminating(&self) -> bool {
        self.state() == TerminationState::Terminating
    }

    /// Starts `strategy` in the background unless an attempt is already
    /// running or has succeeded. Never blocks on the strategy itself.
    pub fn trigger(
        &self,
        strategy: Arc<dyn TerminationStrategy>,
        ctx: TerminationContext,
    ) -> TriggerOutcome {
        if self
            .terminating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return TriggerOutcome::AlreadyTerminating;
        }

        warn!(
            strategy = strategy.name(),
            used_fraction = ctx.used_fraction(),
            threshold = ctx.threshold(),
            "Memory threshold exceeded, starting self-termination"
        );

        let terminating = Arc::clone(&self.terminating);
        let task = Box::new(move || run_attempt(&terminating, strategy.as_ref(), &ctx));
        match self.spawner.spawn(task) {
            Ok(()) => TriggerOutcome::Accepted,
            Err(err) => {
                error!(error = %err, "Could not schedule self-termination; re-arming");
                self.terminating.store(false, Ordering::SeqCst);
                TriggerOutcome::SpawnFailed
            }
        }
    }
}

fn run_attempt(
    terminating: &AtomicBool,
    strategy: &dyn TerminationStrategy,
    ctx: &TerminationContext,
) {
    let initiated = match panic::catch_unwind(AssertUnwindSafe(|| strategy.attempt(ctx))) {
        Ok(initiated) => initiated,
        Err(_) => {
            error!(strategy = strategy.name(), "Self-termination strategy panicked");
            false
        }
    };
    if initiated {
        info!(strategy = strategy.name(), "Self-termination initiated");
        return;
    }
    warn!(
        strategy = strategy.name(),
        "Self-termination attempt failed; a later trigger will retry"
    );
    terminating.store(false, Ordering::SeqCst);
}
