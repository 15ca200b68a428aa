use std::sync::Mutex;
use std::thread;
use std::thread::JoinHandle;

use crate::usecases::ports::SpawnError;
use crate::usecases::ports::Task;
use crate::usecases::ports::TaskSpawner;

/// Runs tasks on the calling thread so assertions can follow immediately.
#[derive(Default)]
pub struct InlineSpawner;

impl TaskSpawner for InlineSpawner {
    fn spawn(&self, task: Task) -> Result<(), SpawnError> {
        task();
        Ok(())
    }
}

/// Always refuses work.
#[derive(Default)]
pub struct RefusingSpawner;

impl TaskSpawner for RefusingSpawner {
    fn spawn(&self, _task: Task) -> Result<(), SpawnError> {
        Err(SpawnError::Unavailable("refusing spawner".to_string()))
    }
}

/// Spawns a thread per task and keeps the handles for `join_all`.
#[derive(Default)]
pub struct ThreadPerTaskSpawner {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPerTaskSpawner {
    pub fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

impl TaskSpawner for ThreadPerTaskSpawner {
    fn spawn(&self, task: Task) -> Result<(), SpawnError> {
        let handle = thread::spawn(task);
        self.handles.lock().unwrap().push(handle);
        Ok(())
    }
}
