use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::usecases::ports::TerminationContext;
use crate::usecases::ports::TerminationStrategy;

/// Records attempts and answers with a configurable result.
pub struct CountingStrategy {
    succeed: AtomicBool,
    attempts: AtomicUsize,
    delay: Option<Duration>,
    last_fraction: Mutex<Option<f64>>,
    last_cancelled: Mutex<Option<bool>>,
}

impl CountingStrategy {
    pub fn succeeding() -> Self {
        Self::new(true)
    }

    pub fn failing() -> Self {
        Self::new(false)
    }

    fn new(succeed: bool) -> Self {
        Self {
            succeed: AtomicBool::new(succeed),
            attempts: AtomicUsize::new(0),
            delay: None,
            last_fraction: Mutex::new(None),
            last_cancelled: Mutex::new(None),
        }
    }

    /// Holds each attempt open so concurrent triggers overlap with it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_succeed(&self, succeed: bool) {
        self.succeed.store(succeed, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn last_fraction(&self) -> Option<f64> {
        *self.last_fraction.lock().unwrap()
    }

    /// Whether the most recent attempt saw a cancelled context.
    pub fn last_cancelled(&self) -> Option<bool> {
        *self.last_cancelled.lock().unwrap()
    }
}

impl TerminationStrategy for CountingStrategy {
    fn attempt(&self, ctx: &TerminationContext) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.last_fraction.lock().unwrap() = Some(ctx.used_fraction());
        *self.last_cancelled.lock().unwrap() = Some(ctx.is_cancelled());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.succeed.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "counting"
    }
}
