//! Push ID generator and related types.

#[cfg(not(feature = "std"))]
use core as std;

use std::fmt;

use crate::id::{PushId, MAX_TIMESTAMP, SUFFIX_LEN};

pub mod with_rand08;


/// A trait that defines the minimum random number generator interface for [`PushIdGenerator`].
pub trait RandSource {
    /// Returns the next random `u32`.
    fn next_u32(&mut self) -> u32;

    /// Returns the next random `u64`.
    fn next_u64(&mut self) -> u64;
}

/// A trait that defines the minimum system clock interface for [`PushIdGenerator`].
pub trait TimeSource {
    /// Returns the current Unix timestamp in milliseconds.
    fn unix_ts_ms(&mut self) -> u64;
}

/// The default [`TimeSource`] that uses [`std::time::SystemTime`].
///
/// A clock set before the Unix epoch is reported as `u64::MAX`, which the generator rejects as
/// out of range.
#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct StdSystemTime;

#[cfg(feature = "std")]
impl TimeSource for StdSystemTime {
    fn unix_ts_ms(&mut self) -> u64 {
        use std::time;
        time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .ok()
            .and_then(|d| u64::try_from(d.as_millis()).ok())
            .unwrap_or(u64::MAX)
    }
}

/// Error returned when a push ID cannot be generated.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum GenerateError {
    /// The timestamp does not fit in the 48 bits of the eight leading characters.
    ClockOutOfRange {
        /// The rejected timestamp.
        unix_ts_ms: u64,
    },

    /// The random suffix reached its maximum value within the same millisecond and cannot be
    /// incremented.
    SuffixOverflow,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockOutOfRange { unix_ts_ms } => {
                write!(f, "timestamp {} ms is out of 48-bit range", unix_ts_ms)
            }
            Self::SuffixOverflow => {
                write!(f, "random suffix overflowed within the same millisecond")
            }
        }
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl std::error::Error for GenerateError {}

/// Represents a push ID generator that remembers the last timestamp and random suffix and
/// guarantees the monotonic order of push IDs generated within the same millisecond.
///
/// This type provides the interface to customize the random number generator and system clock of
/// a push ID generator. Generation takes `&mut self`; wrap the generator in a
/// [`SyncGenerator`](crate::SyncGenerator) to share one instance across threads.
///
/// # Examples
///
/// ```rust
/// use pushid::PushIdGenerator;
///
/// let mut g = PushIdGenerator::with_rand08(rand::rngs::OsRng);
/// let x = g.generate()?;
/// let y = g.generate()?;
/// assert!(x < y);
/// # Ok::<(), pushid::GenerateError>(())
/// ```
///
/// # Generator functions
///
/// The generator comes with three different methods that generate a push ID:
///
/// | Flavor                     | Timestamp   | On suffix overflow               |
/// | -------------------------- | ----------- | -------------------------------- |
/// | [`generate`]               | Now         | Waits for next millisecond       |
/// | [`generate_or_abort`]      | Now         | Returns `Err(SuffixOverflow)`    |
/// | [`generate_or_abort_core`] | Argument    | Returns `Err(SuffixOverflow)`    |
///
/// When the timestamp equals the immediately preceding one, all of them return the previous
/// suffix incremented by one; otherwise they draw a fresh 72-bit suffix. A timestamp smaller than
/// the preceding one is not treated specially, so a clock rollback breaks the increasing order of
/// push IDs.
///
/// [`generate`]: PushIdGenerator::generate
/// [`generate_or_abort`]: PushIdGenerator::generate_or_abort
/// [`generate_or_abort_core`]: PushIdGenerator::generate_or_abort_core
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct PushIdGenerator<R, T> {
    timestamp: u64,
    suffix: [u8; SUFFIX_LEN],

    /// The random number generator used by the generator.
    rng: R,

    /// The system clock used by the generator.
    time_source: T,
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<R: RandSource> PushIdGenerator<R, StdSystemTime> {
    /// Creates a generator instance that reads the system clock.
    pub const fn new(rng: R) -> Self {
        Self::with_rand_and_time_sources(rng, StdSystemTime)
    }
}

impl<R: RandSource, T: TimeSource> PushIdGenerator<R, T> {
    /// Creates a generator instance with specified random number generator and system clock.
    pub const fn with_rand_and_time_sources(rng: R, time_source: T) -> Self {
        Self {
            timestamp: 0,
            suffix: [0; SUFFIX_LEN],
            rng,
            time_source,
        }
    }

    /// Generates a new push ID from the current timestamp, waiting for the clock to move on if
    /// the random suffix overflows within the same millisecond.
    ///
    /// See the [`PushIdGenerator`] type documentation for the description.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ClockOutOfRange`] if the current timestamp is not a 48-bit
    /// integer.
    pub fn generate(&mut self) -> Result<PushId, GenerateError> {
        let unix_ts_ms = self.time_source.unix_ts_ms();
        match self.generate_or_abort_core(unix_ts_ms) {
            Err(GenerateError::SuffixOverflow) => {
                tracing::warn!(
                    unix_ts_ms,
                    "push ID suffix overflowed; waiting for the next millisecond"
                );
                let mut now = self.time_source.unix_ts_ms();
                while now == self.timestamp {
                    std::hint::spin_loop();
                    now = self.time_source.unix_ts_ms();
                }
                self.generate_or_abort_core(now)
            }
            result => result,
        }
    }

    /// Generates a new push ID from the current timestamp, or returns an error if the random
    /// suffix overflows within the same millisecond.
    ///
    /// See the [`PushIdGenerator`] type documentation for the description.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ClockOutOfRange`] if the current timestamp is not a 48-bit
    /// integer and [`GenerateError::SuffixOverflow`] if the suffix cannot be incremented.
    pub fn generate_or_abort(&mut self) -> Result<PushId, GenerateError> {
        let unix_ts_ms = self.time_source.unix_ts_ms();
        self.generate_or_abort_core(unix_ts_ms)
    }

    /// Generates a new push ID from the `unix_ts_ms` passed, or returns an error if the random
    /// suffix overflows within the same millisecond.
    ///
    /// See the [`PushIdGenerator`] type documentation for the description. The generator state is
    /// left untouched when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::ClockOutOfRange`] if `unix_ts_ms` is not a 48-bit integer and
    /// [`GenerateError::SuffixOverflow`] if the suffix cannot be incremented.
    pub fn generate_or_abort_core(&mut self, unix_ts_ms: u64) -> Result<PushId, GenerateError> {
        if unix_ts_ms > MAX_TIMESTAMP {
            return Err(GenerateError::ClockOutOfRange { unix_ts_ms });
        }

        let suffix = if unix_ts_ms == self.timestamp {
            let mut suffix = self.suffix;
            if !increment(&mut suffix) {
                return Err(GenerateError::SuffixOverflow);
            }
            suffix
        } else {
            if unix_ts_ms < self.timestamp {
                tracing::warn!(
                    unix_ts_ms,
                    last_ts_ms = self.timestamp,
                    "clock moved backwards; push ID order is not preserved"
                );
            }
            draw_suffix(&mut self.rng)
        };

        self.timestamp = unix_ts_ms;
        self.suffix = suffix;
        Ok(PushId::from_parts(unix_ts_ms, &suffix))
    }
}

/// Adds one to a base-64 number stored most significant digit first, returning `false` if the
/// number is already at its maximum.
fn increment(digits: &mut [u8; SUFFIX_LEN]) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 63 {
            *d = 0;
        } else {
            *d += 1;
            return true;
        }
    }
    false
}

/// Draws 12 uniform base-64 digits from the top 60 bits of a `u64` and the top 12 bits of a
/// `u32`.
fn draw_suffix(rng: &mut impl RandSource) -> [u8; SUFFIX_LEN] {
    let hi = rng.next_u64();
    let lo = rng.next_u32();
    let mut digits = [0u8; SUFFIX_LEN];
    for (i, d) in digits[..10].iter_mut().enumerate() {
        *d = (hi >> (58 - 6 * i)) as u8 & 63;
    }
    digits[10] = (lo >> 26) as u8;
    digits[11] = (lo >> 20) as u8 & 63;
    digits
}

/// Supports operations as an infinite iterator that produces a new push ID for each call of
/// `next()`.
///
/// The iterator returns `None` only when the clock is out of the encodable range.
///
/// # Examples
///
/// ```rust
/// use pushid::PushIdGenerator;
///
/// PushIdGenerator::with_rand08(rand::thread_rng())
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{}] {}", i, e));
/// ```
impl<R: RandSource, T: TimeSource> Iterator for PushIdGenerator<R, T> {
    type Item = PushId;

    fn next(&mut self) -> Option<Self::Item> {
        self.generate().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(feature = "std")]
#[cfg(test)]
mod tests_generate_or_abort {
    use super::{with_rand08, GenerateError, PushIdGenerator, StdSystemTime};
    use crate::id::MAX_TIMESTAMP;

    type ThreadGen = PushIdGenerator<with_rand08::Adapter<rand::rngs::ThreadRng>, StdSystemTime>;

    /// Generates increasing push IDs with constant timestamp
    #[test]
    fn generates_increasing_push_ids_with_constant_timestamp() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let mut prev = g.generate_or_abort_core(ts).unwrap();
        assert_eq!(prev.timestamp(), ts);
        for _ in 0..100_000 {
            let curr = g.generate_or_abort_core(ts).unwrap();
            assert!(prev < curr);
            assert_eq!(curr.timestamp(), ts);
            prev = curr;
        }
    }

    /// Generates increasing push IDs with increasing timestamp
    #[test]
    fn generates_increasing_push_ids_with_increasing_timestamp() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let mut prev = g.generate_or_abort_core(ts).unwrap();
        for i in 0..100_000u64 {
            let curr = g.generate_or_abort_core(ts + i / 8).unwrap();
            assert!(prev < curr);
            prev = curr;
        }
        assert_eq!(prev.timestamp(), ts + 99_999 / 8);
    }

    /// Breaks increasing order of push IDs if timestamp goes backwards
    #[test]
    fn breaks_increasing_order_of_push_ids_if_timestamp_goes_backwards() {
        let ts = 0x0123_4567_89abu64;
        let mut g: ThreadGen = Default::default();
        let prev = g.generate_or_abort_core(ts).unwrap();
        let curr = g.generate_or_abort_core(ts - 1).unwrap();
        assert!(prev > curr);
        assert_eq!(curr.timestamp(), ts - 1);
    }

    /// Returns error if timestamp exceeds 48 bits
    #[test]
    fn returns_error_if_timestamp_exceeds_48_bits() {
        let mut g: ThreadGen = Default::default();
        assert!(g.generate_or_abort_core(MAX_TIMESTAMP).is_ok());
        for unix_ts_ms in [MAX_TIMESTAMP + 1, 1 << 60, u64::MAX] {
            assert_eq!(
                g.generate_or_abort_core(unix_ts_ms),
                Err(GenerateError::ClockOutOfRange { unix_ts_ms })
            );
        }
    }
}

#[cfg(feature = "std")]
#[cfg(test)]
mod tests_generate {
    use super::PushIdGenerator;
    use std::time;

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        let mut g = PushIdGenerator::with_rand08(rand::thread_rng());
        for _ in 0..10_000 {
            let ts_now = (time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_millis()) as i64;
            let timestamp = g.generate().unwrap().timestamp() as i64;
            assert!((ts_now - timestamp).abs() < 16);
        }
    }

    /// Works as infinite iterator
    #[test]
    fn works_as_infinite_iterator() {
        let samples: Vec<_> = PushIdGenerator::with_rand08(rand::thread_rng())
            .take(10_000)
            .collect();
        assert_eq!(samples.len(), 10_000);
        for i in 1..samples.len() {
            assert!(samples[i - 1] < samples[i]);
        }
    }
}
