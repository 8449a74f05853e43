//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::{GenerateError, PushId};
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(sync::PoisonError::into_inner)
}

/// Generates a push ID.
///
/// This function employs a global generator and guarantees the process-wide monotonic order of
/// push IDs generated within the same millisecond. On Unix, this function resets the generator
/// when the process ID changes (i.e., upon process forks) to prevent collisions across processes.
///
/// # Errors
///
/// Returns [`GenerateError::ClockOutOfRange`] if the system clock is set before the Unix epoch
/// or beyond the 48-bit millisecond range.
///
/// # Examples
///
/// ```rust
/// let id = pushid::push_id()?;
/// println!("{}", id); // e.g., "-NjEtLVf3Yq9_xR0bK2c"
/// println!("{}", id.timestamp()); // as Unix timestamp in milliseconds
/// # Ok::<(), pushid::GenerateError>(())
/// ```
pub fn push_id() -> Result<PushId, GenerateError> {
    lock_global_gen().get_mut().generate()
}

/// Generates a push ID and returns its 20-character string representation.
///
/// # Errors
///
/// See [`push_id`].
///
/// # Examples
///
/// ```rust
/// let id: String = pushid::push_id_string()?;
/// assert_eq!(id.len(), 20);
/// # Ok::<(), pushid::GenerateError>(())
/// ```
pub fn push_id_string() -> Result<String, GenerateError> {
    push_id().map(String::from)
}

mod inner {
    use rand::rngs::{adapter::ReseedingRng, OsRng};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Core;

    use crate::generator::{PushIdGenerator, RandSource, StdSystemTime};

    /// The random number generator of the global generator.
    ///
    /// The global generator employs [`ChaCha12Core`] with [`ReseedingRng`] wrapper to emulate the
    /// strategy used by [`rand::rngs::ThreadRng`].
    pub struct GlobalGenRng(ReseedingRng<ChaCha12Core, OsRng>);

    impl RandSource for GlobalGenRng {
        fn next_u32(&mut self) -> u32 {
            rand::RngCore::next_u32(&mut self.0)
        }

        fn next_u64(&mut self) -> u64 {
            rand::RngCore::next_u64(&mut self.0)
        }
    }

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        generator: PushIdGenerator<GlobalGenRng, StdSystemTime>,
    }

    impl Default for GlobalGenInner {
        fn default() -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: PushIdGenerator::new(GlobalGenRng(ReseedingRng::new(
                    ChaCha12Core::from_entropy(),
                    1024 * 64,
                    OsRng,
                ))),
            }
        }
    }

    impl GlobalGenInner {
        /// Returns a mutable reference to the inner [`PushIdGenerator`] instance, reseting the
        /// generator state on Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &mut PushIdGenerator<GlobalGenRng, StdSystemTime> {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                tracing::debug!(
                    old_pid = self.pid,
                    new_pid = std::process::id(),
                    "process ID changed; resetting global push ID generator"
                );
                *self = Default::default();
            }
            &mut self.generator
        }
    }
}
