//! Executors that keep termination work off the request path.

use std::thread;

use tokio::runtime::Handle;

use crate::usecases::ports::SpawnError;
use crate::usecases::ports::Task;
use crate::usecases::ports::TaskSpawner;

const TERMINATOR_THREAD_NAME: &str = "oom-terminator";

/// Dedicated, detached OS thread per task. Works without any runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, task: Task) -> Result<(), SpawnError> {
        thread::Builder::new()
            .name(TERMINATOR_THREAD_NAME.to_string())
            .spawn(task)
            .map(|_detached| ())
            .map_err(SpawnError::Thread)
    }
}

/// Runs tasks on a tokio runtime's blocking pool, since strategies may
/// block (signal delivery, graceful drain).
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawner for the runtime the caller is running on.
    pub fn current() -> Result<Self, SpawnError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| SpawnError::Unavailable(err.to_string()))
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, task: Task) -> Result<(), SpawnError> {
        drop(self.handle.spawn_blocking(task));
        Ok(())
    }
}
