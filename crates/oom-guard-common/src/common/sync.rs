//! Lock acquisition that survives a panicking writer.
//!
//! The memory stats cache is read on every guarded request. A panic inside a
//! refresh must not turn every later request into a panic, so poisoned locks
//! are recovered and counted instead of propagated.

use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tracing::error;

static POISON_RECOVERY_COUNT: AtomicU64 = AtomicU64::new(0);

/// Number of poisoned locks recovered since process start.
pub fn poison_recovery_count() -> u64 {
    POISON_RECOVERY_COUNT.load(Ordering::Relaxed)
}

fn recover<G>(kind: &'static str, poisoned: PoisonError<G>) -> G {
    POISON_RECOVERY_COUNT.fetch_add(1, Ordering::Relaxed);
    error!(
        lock = kind,
        "Lock poisoned - a thread panicked while holding it. Recovering last written state."
    );
    poisoned.into_inner()
}

pub fn rwlock_read_or_recover<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read()
        .unwrap_or_else(|poisoned| recover("rwlock-read", poisoned))
}

pub fn rwlock_write_or_recover<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write()
        .unwrap_or_else(|poisoned| recover("rwlock-write", poisoned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn poison_rwlock(lock: &Arc<RwLock<u64>>) {
        let lock = Arc::clone(lock);
        let _ = thread::spawn(move || {
            let mut guard = lock.write().unwrap();
            *guard = 7;
            panic!("poison the lock");
        })
        .join();
    }

    #[test]
    fn test_rwlock_read_recovers_after_writer_panic() {
        let lock = Arc::new(RwLock::new(0u64));
        poison_rwlock(&lock);
        assert!(lock.is_poisoned());

        let before = poison_recovery_count();
        let value = *rwlock_read_or_recover(&lock);

        assert_eq!(value, 7);
        assert!(poison_recovery_count() > before);
    }

    #[test]
    fn test_rwlock_write_recovers_after_writer_panic() {
        let lock = Arc::new(RwLock::new(0u64));
        poison_rwlock(&lock);

        *rwlock_write_or_recover(&lock) = 11;

        assert_eq!(*rwlock_read_or_recover(&lock), 11);
    }
}
