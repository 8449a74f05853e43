//! Thread-safe generator that owns its state behind a mutex.

#![cfg(feature = "std")]
#![cfg_attr(docsrs, doc(cfg(feature = "std")))]

use std::sync;

use crate::generator::{GenerateError, PushIdGenerator, RandSource, TimeSource};
use crate::PushId;

/// A push ID generator that serializes every call through one mutex, so that a single instance
/// can be shared by reference across threads.
///
/// The whole generation step (clock read, duplicate detection, suffix increment or draw, and
/// encoding) runs under the lock, which gives a total order of push IDs across all callers of the
/// same instance.
///
/// # Examples
///
/// ```rust
/// use pushid::{PushIdGenerator, SyncGenerator};
/// use std::{sync::Arc, thread};
///
/// let g = Arc::new(SyncGenerator::new(PushIdGenerator::with_rand08(rand::rngs::OsRng)));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.next_id().unwrap(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
#[derive(Debug, Default)]
pub struct SyncGenerator<R, T> {
    inner: sync::Mutex<PushIdGenerator<R, T>>,
}

impl<R: RandSource, T: TimeSource> SyncGenerator<R, T> {
    /// Wraps a generator instance.
    pub const fn new(generator: PushIdGenerator<R, T>) -> Self {
        Self {
            inner: sync::Mutex::new(generator),
        }
    }

    /// Generates a new push ID from the current timestamp.
    ///
    /// See [`PushIdGenerator::generate`] for the description.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ClockOutOfRange`] if the current timestamp is not a 48-bit
    /// integer.
    pub fn next_id(&self) -> Result<PushId, GenerateError> {
        self.lock().generate()
    }

    /// Generates a new push ID and returns its string representation.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ClockOutOfRange`] if the current timestamp is not a 48-bit
    /// integer.
    pub fn next_string(&self) -> Result<String, GenerateError> {
        self.next_id().map(String::from)
    }

    /// Consumes this wrapper, returning the underlying generator.
    pub fn into_inner(self) -> PushIdGenerator<R, T> {
        self.inner
            .into_inner()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }

    /// Returns the lock handle of the generator.
    ///
    /// The generator state is only written after a push ID is successfully built, so a lock
    /// poisoned by a panicking random or time source still holds a consistent state.
    fn lock(&self) -> sync::MutexGuard<'_, PushIdGenerator<R, T>> {
        self.inner
            .lock()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }
}

impl<R: RandSource, T: TimeSource> From<PushIdGenerator<R, T>> for SyncGenerator<R, T> {
    fn from(generator: PushIdGenerator<R, T>) -> Self {
        Self::new(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::SyncGenerator;
    use crate::PushIdGenerator;

    /// Generates no duplicate push IDs under multithreading
    #[test]
    fn generates_no_duplicate_push_ids_under_multithreading(
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::{collections::HashSet, sync::mpsc, sync::Arc, thread};

        let g = Arc::new(SyncGenerator::new(PushIdGenerator::with_rand08(
            rand::rngs::OsRng,
        )));
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            let g = Arc::clone(&g);
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..10_000 {
                        tx.send((i, g.next_id().unwrap())).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        let mut last = [None; 4];
        while let Ok((i, e)) = rx.recv() {
            if let Some(prev) = last[i].replace(e) {
                assert!(prev < e, "thread {} produced {} after {}", i, e, prev);
            }
            s.insert(e);
        }

        assert_eq!(s.len(), 4 * 10_000);
        Ok(())
    }

    /// Generates increasing push IDs across calls on shared instance
    #[test]
    fn generates_increasing_push_ids_across_calls_on_shared_instance() {
        let g = SyncGenerator::from(PushIdGenerator::with_rand08(rand::thread_rng()));
        let mut prev = g.next_string().unwrap();
        for _ in 0..100_000 {
            let curr = g.next_string().unwrap();
            assert_eq!(curr.len(), 20);
            assert!(prev < curr);
            prev = curr;
        }
    }

    /// Survives lock poisoning with consistent state
    #[test]
    fn survives_lock_poisoning_with_consistent_state() {
        use std::{sync::Arc, thread};

        let g = Arc::new(SyncGenerator::new(PushIdGenerator::with_rand08(
            rand::rngs::OsRng,
        )));
        let before = g.next_id().unwrap();

        let g2 = Arc::clone(&g);
        let result = thread::spawn(move || {
            let _guard = g2.lock();
            panic!("poison the lock");
        })
        .join();
        assert!(result.is_err());
        assert!(g.inner.is_poisoned());

        let after = g.next_id().unwrap();
        assert!(before < after);
    }
}
