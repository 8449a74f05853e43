#[cfg(not(feature = "std"))]
use core as std;

use std::{fmt, str};

use fstr::FStr;

/// The 64 characters used to encode base-64 digits, in ascending ASCII order so that the
/// lexicographic order of encoded strings matches the numeric order of the digits.
pub const ID_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// The largest millisecond timestamp representable by the eight leading characters.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// Number of base-64 digits that encode the timestamp.
pub const TIMESTAMP_LEN: usize = 8;

/// Number of base-64 digits that encode the random suffix.
pub const SUFFIX_LEN: usize = 12;

/// Total length of the string representation.
pub const ID_LEN: usize = TIMESTAMP_LEN + SUFFIX_LEN;

/// Represents a 20-character push ID: a 48-bit millisecond timestamp followed by a 72-bit random
/// suffix, both written in the base-64 alphabet of [`ID_CHARS`].
///
/// The type stores the encoded ASCII characters, so the derived [`Ord`] is the byte-wise order of
/// the string representation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PushId([u8; ID_LEN]);

impl PushId {
    /// The smallest push ID (`--------------------`).
    pub const MIN: Self = Self([b'-'; ID_LEN]);

    /// The largest push ID (`zzzzzzzzzzzzzzzzzzzz`).
    pub const MAX: Self = Self([b'z'; ID_LEN]);

    /// Creates a push ID from a timestamp and the base-64 digits of the random suffix (most
    /// significant digit first).
    ///
    /// # Panics
    ///
    /// Panics if `unix_ts_ms` is larger than [`MAX_TIMESTAMP`] or any digit is 64 or larger.
    pub const fn from_parts(unix_ts_ms: u64, suffix: &[u8; SUFFIX_LEN]) -> Self {
        if unix_ts_ms > MAX_TIMESTAMP {
            panic!("invalid field value");
        }

        let mut dst = [0u8; ID_LEN];
        let mut ts = unix_ts_ms;
        let mut i = TIMESTAMP_LEN;
        while i > 0 {
            i -= 1;
            dst[i] = ID_CHARS[(ts % 64) as usize];
            ts /= 64;
        }

        while i < SUFFIX_LEN {
            if suffix[i] >= 64 {
                panic!("invalid field value");
            }
            dst[TIMESTAMP_LEN + i] = ID_CHARS[suffix[i] as usize];
            i += 1;
        }
        Self(dst)
    }

    /// Returns the millisecond timestamp encoded in the first eight characters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pushid::PushId;
    ///
    /// let x = "-HC4Osaf-0123456789A".parse::<PushId>()?;
    /// assert_eq!(x.timestamp(), 0x0123_4567_89ab);
    /// # Ok::<(), pushid::ParseError>(())
    /// ```
    pub fn timestamp(&self) -> u64 {
        self.0[..TIMESTAMP_LEN]
            .iter()
            .fold(0, |acc, &c| acc << 6 | u64::from(decode_digit(c).unwrap_or_default()))
    }

    /// Returns the base-64 digits of the random suffix, most significant digit first.
    pub fn suffix(&self) -> [u8; SUFFIX_LEN] {
        let mut digits = [0u8; SUFFIX_LEN];
        for (d, &c) in digits.iter_mut().zip(&self.0[TIMESTAMP_LEN..]) {
            *d = decode_digit(c).unwrap_or_default();
        }
        digits
    }

    /// Returns a reference to the underlying ASCII byte array.
    pub const fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &str {
        debug_assert!(self.0.is_ascii());
        unsafe { str::from_utf8_unchecked(&self.0) }
    }

    /// Returns the string representation stored in a stack-allocated [`FStr`].
    ///
    /// This method is primarily for `no_std` environments where heap-allocated string types are
    /// not readily available.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pushid::PushId;
    ///
    /// let x = PushId::from_parts(1, &[0; 12]);
    /// let y = x.encode();
    /// assert_eq!(&y as &str, "-------0------------");
    /// assert_eq!(format!("{}", y), "-------0------------");
    /// ```
    pub fn encode(&self) -> FStr<ID_LEN> {
        debug_assert!(self.0.is_ascii());
        unsafe { FStr::from_inner_unchecked(self.0) }
    }
}

/// Maps an alphabet character back to its base-64 digit.
const fn decode_digit(c: u8) -> Option<u8> {
    match c {
        b'-' => Some(0),
        b'0'..=b'9' => Some(c - b'0' + 1),
        b'A'..=b'Z' => Some(c - b'A' + 11),
        b'_' => Some(37),
        b'a'..=b'z' => Some(c - b'a' + 38),
        _ => None,
    }
}

impl fmt::Display for PushId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for PushId {
    type Err = ParseError;

    /// Creates an object from the 20-character string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let src = <&[u8; ID_LEN]>::try_from(src.as_bytes()).map_err(|_| ParseError {})?;
        if src.iter().all(|&c| decode_digit(c).is_some()) {
            Ok(Self(*src))
        } else {
            Err(ParseError {})
        }
    }
}

impl From<PushId> for [u8; ID_LEN] {
    fn from(src: PushId) -> Self {
        src.0
    }
}

impl AsRef<str> for PushId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<[u8]> for PushId {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Error parsing an invalid string representation of push ID.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid string representation")
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
mod std_ext {
    use super::{ParseError, PushId};

    impl From<PushId> for String {
        fn from(src: PushId) -> Self {
            src.as_str().to_owned()
        }
    }

    impl TryFrom<String> for PushId {
        type Error = ParseError;

        fn try_from(src: String) -> Result<Self, Self::Error> {
            src.parse()
        }
    }

    impl std::error::Error for ParseError {}
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, str, PushId};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for PushId {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(self.as_str())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for PushId {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(VisitorImpl)
            } else {
                deserializer.deserialize_bytes(VisitorImpl)
            }
        }
    }

    struct VisitorImpl;

    impl<'de> de::Visitor<'de> for VisitorImpl {
        type Value = PushId;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a push ID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value.parse::<Self::Value>().map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            str::from_utf8(value)
                .map_err(de::Error::custom)?
                .parse::<Self::Value>()
                .map_err(de::Error::custom)
        }
    }

}
