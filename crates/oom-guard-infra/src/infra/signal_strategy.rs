//! Termination by signalling the current process or its process group.

use std::io;

use tracing::error;
use tracing::info;

use crate::domain::SignalScope;
use crate::usecases::ports::TerminationContext;
use crate::usecases::ports::TerminationStrategy;

/// Sends a signal (SIGTERM unless overridden) and reports whether the
/// kernel accepted it. Whether the process then exits is up to its
/// signal handling.
#[derive(Debug, Clone, Copy)]
pub struct SignalStrategy {
    scope: SignalScope,
    signal: libc::c_int,
}

impl SignalStrategy {
    pub fn new(scope: SignalScope) -> Self {
        Self {
            scope,
            signal: libc::SIGTERM,
        }
    }

    pub fn process_group() -> Self {
        Self::new(SignalScope::ProcessGroup)
    }

    pub fn process() -> Self {
        Self::new(SignalScope::Process)
    }

    pub fn with_signal(mut self, signal: libc::c_int) -> Self {
        self.signal = signal;
        self
    }

    pub fn scope(&self) -> SignalScope {
        self.scope
    }

    pub fn signal(&self) -> libc::c_int {
        self.signal
    }

    /// The `kill(2)` target: the pid, or 0 for the caller's own process
    /// group. A pid of 0 never widens beyond that group, even when running
    /// as PID 1 of a container.
    fn target(&self) -> io::Result<libc::pid_t> {
        match self.scope {
            SignalScope::Process => libc::pid_t::try_from(std::process::id())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "pid out of range")),
            SignalScope::ProcessGroup => Ok(0),
        }
    }

    fn send(&self) -> io::Result<libc::pid_t> {
        let target = self.target()?;
        // SAFETY: target is our own pid or 0 (own process group); kill has
        // no memory safety preconditions.
        let rc = unsafe { libc::kill(target, self.signal) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(target)
    }
}

impl TerminationStrategy for SignalStrategy {
    fn attempt(&self, ctx: &TerminationContext) -> bool {
        if ctx.is_cancelled() {
            info!(scope = %self.scope, "Termination cancelled before signalling");
            return false;
        }
        match self.send() {
            Ok(target) => {
                info!(
                    scope = %self.scope,
                    signal = self.signal,
                    target,
                    "Sent termination signal"
                );
                true
            }
            Err(err) => {
                error!(
                    scope = %self.scope,
                    signal = self.signal,
                    error = %err,
                    "Failed to send termination signal"
                );
                false
            }
        }
    }

    fn name(&self) -> &str {
        match self.scope {
            SignalScope::ProcessGroup => "signal-process-group",
            SignalScope::Process => "signal-process",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use std::time::Instant;

    const INVALID_SIGNAL: libc::c_int = 9999;

    fn wait_for(flag: &AtomicBool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if flag.load(Ordering::SeqCst) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_defaults_to_sigterm() {
        assert_eq!(SignalStrategy::process_group().signal(), libc::SIGTERM);
        assert_eq!(SignalStrategy::process().scope(), SignalScope::Process);
    }

    #[test]
    fn test_group_target_is_own_group() {
        let target = SignalStrategy::process_group().target().unwrap();

        assert_eq!(target, 0);
    }

    #[test]
    fn test_group_signal_is_accepted_regardless_of_pgid() {
        // Signal 0 only checks deliverability, so this also holds as PID 1.
        let strategy = SignalStrategy::process_group().with_signal(0);

        assert!(strategy.attempt(&TerminationContext::new(0.95, 0.9)));
    }

    #[test]
    fn test_process_target_is_own_pid() {
        let target = SignalStrategy::process().target().unwrap();
        assert_eq!(target as u32, std::process::id());
    }

    #[test]
    fn test_signal_process_delivers_to_self() {
        let received = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(libc::SIGUSR2, Arc::clone(&received)).unwrap();
        let strategy = SignalStrategy::process().with_signal(libc::SIGUSR2);

        assert!(strategy.attempt(&TerminationContext::new(0.95, 0.9)));
        assert!(wait_for(&received));
    }

    #[test]
    fn test_rejected_signal_reports_failure() {
        let ctx = TerminationContext::new(0.95, 0.9);

        assert!(!SignalStrategy::process().with_signal(INVALID_SIGNAL).attempt(&ctx));
        assert!(
            !SignalStrategy::process_group()
                .with_signal(INVALID_SIGNAL)
                .attempt(&ctx)
        );
    }

    #[test]
    fn test_cancelled_context_skips_signal() {
        let ctx = TerminationContext::new(0.95, 0.9);
        ctx.cancel();

        assert!(!SignalStrategy::process().with_signal(INVALID_SIGNAL).attempt(&ctx));
    }

    #[test]
    fn test_names_follow_scope() {
        assert_eq!(SignalStrategy::process_group().name(), "signal-process-group");
        assert_eq!(SignalStrategy::process().name(), "signal-process");
    }
}
