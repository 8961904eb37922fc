//! # Execution guard
//!
//! Exclusive, non-blocking access to a resource that moves hardware. Whoever wants to move the
//! arm must first begin a session on the guard. Beginning never waits: if another session is
//! active the attempt fails straight away and the caller skips its action. The session ends,
//! releasing the guard, when it is dropped, whichever way its holder returns.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::{
    ops::{Deref, DerefMut},
    sync::{Mutex, MutexGuard, TryLockError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single holder guard around a resource.
pub struct ExecutionGuard<T> {
    inner: Mutex<T>,
}

/// An active session on an `ExecutionGuard`, giving exclusive access to the resource.
pub struct ExecutionSession<'a, T> {
    resource: MutexGuard<'a, T>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> ExecutionGuard<T> {
    /// Create a new guard around the resource.
    pub fn new(resource: T) -> Self {
        Self {
            inner: Mutex::new(resource),
        }
    }

    /// Attempt to begin a session without blocking.
    ///
    /// Returns `None` if a session is already active.
    ///
    /// A holder which panicked leaves the guard poisoned. The guard is still released by the
    /// unwind so the next attempt succeeds, with a warning.
    pub fn try_begin(&self) -> Option<ExecutionSession<'_, T>> {
        match self.inner.try_lock() {
            Ok(resource) => Some(ExecutionSession { resource }),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(e)) => {
                warn!("Previous execution session panicked, recovering the guard");
                Some(ExecutionSession {
                    resource: e.into_inner(),
                })
            }
        }
    }
}

impl<'a, T> Deref for ExecutionSession<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<'a, T> DerefMut for ExecutionSession<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.resource
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Used for the short lived locks on shared state (tracker, duration configuration) where the
/// data stays meaningful after a panic elsewhere.
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("Lock on {} was poisoned, recovering", what);
        e.into_inner()
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn test_second_session_refused_until_first_ends() {
        let guard = ExecutionGuard::new(0u32);

        {
            let mut session = guard.try_begin().unwrap();
            *session += 1;

            assert!(guard.try_begin().is_none());
        }

        let session = guard.try_begin().unwrap();
        assert_eq!(*session, 1);
    }

    #[test]
    fn test_released_on_error_return() {
        fn failing_action(guard: &ExecutionGuard<()>) -> Result<(), &'static str> {
            let _session = guard.try_begin().ok_or("busy")?;
            Err("planner failed")
        }

        let guard = ExecutionGuard::new(());
        assert_eq!(failing_action(&guard), Err("planner failed"));
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = Arc::new(ExecutionGuard::new(5i32));

        let g = guard.clone();
        let res = thread::spawn(move || {
            let _session = g.try_begin().unwrap();
            panic!("actuation failed");
        })
        .join();
        assert!(res.is_err());

        let session = guard.try_begin();
        assert!(session.is_some());
        assert_eq!(*session.unwrap(), 5);
    }

    #[test]
    fn test_never_two_holders() {
        const NUM_THREADS: usize = 16;
        const NUM_ATTEMPTS: usize = 200;

        let guard = Arc::new(ExecutionGuard::new(()));
        let holders = Arc::new(AtomicUsize::new(0));
        let max_holders = Arc::new(AtomicUsize::new(0));
        let successes = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|_| {
                let guard = guard.clone();
                let holders = holders.clone();
                let max_holders = max_holders.clone();
                let successes = successes.clone();
                let barrier = barrier.clone();

                thread::spawn(move || {
                    barrier.wait();

                    for _ in 0..NUM_ATTEMPTS {
                        if let Some(_session) = guard.try_begin() {
                            let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                            max_holders.fetch_max(now, Ordering::SeqCst);
                            successes.fetch_add(1, Ordering::SeqCst);

                            thread::sleep(Duration::from_micros(50));

                            holders.fetch_sub(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_holders.load(Ordering::SeqCst), 1);
        assert!(successes.load(Ordering::SeqCst) >= 1);
        assert_eq!(holders.load(Ordering::SeqCst), 0);
    }
}
