use thiserror::Error;

pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn thread: {0}")]
    Thread(#[source] std::io::Error),
    #[error("task executor unavailable: {0}")]
    Unavailable(String),
}

/// Runs work off the caller's thread. Implementations must not run the task
/// inline on a request path outside of tests.
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, task: Task) -> Result<(), SpawnError>;
}
