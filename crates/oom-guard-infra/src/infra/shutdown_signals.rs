//! SIGINT/SIGTERM handling for graceful shutdown.

use std::io;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::thread::JoinHandle;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

/// Called from the signal thread after the shutdown flag is set.
pub type ShutdownNotifier = Box<dyn Fn() + Send + 'static>;

#[derive(Debug, Error)]
pub enum SignalSetupError {
    #[error("failed to register signal handlers: {0}")]
    Register(#[source] io::Error),
    #[error("failed to spawn signal handler: {0}")]
    Spawn(#[source] io::Error),
}

pub struct ShutdownSignals {
    _handle: JoinHandle<()>,
}

impl ShutdownSignals {
    pub fn setup(
        shutdown: Arc<AtomicBool>,
        notifier: Option<ShutdownNotifier>,
    ) -> Result<Self, SignalSetupError> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(SignalSetupError::Register)?;

        let handle = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut shutdown_initiated = false;
                for sig in signals.forever() {
                    if shutdown_initiated {
                        info!(
                            signal = sig,
                            "Received another signal; shutdown already in progress"
                        );
                    } else {
                        shutdown_initiated = true;
                        info!(signal = sig, "Received signal, initiating graceful shutdown");
                    }
                    shutdown.store(true, Ordering::SeqCst);
                    if let Some(notify) = notifier.as_ref() {
                        notify();
                    }
                }
            })
            .map_err(SignalSetupError::Spawn)?;

        Ok(Self { _handle: handle })
    }
}
