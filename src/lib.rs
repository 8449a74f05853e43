//! Sortable, monotonic 20-character push IDs
//!
//! ```rust
//! use pushid::push_id;
//!
//! let id = push_id()?;
//! println!("{}", id); // e.g. "-NjEtLVf3Yq9_xR0bK2c"
//! println!("{}", id.timestamp()); // as Unix timestamp in milliseconds
//! # Ok::<(), pushid::GenerateError>(())
//! ```
//!
//! # Format
//!
//! A push ID is a 20-character string made of base-64 digits written with the following
//! alphabet, whose characters are in ascending ASCII order:
//!
//! ```text
//! -0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz
//! ```
//!
//! ```text
//! +--------+------------+
//! |  time  |   suffix   |
//! +--------+------------+
//!  8 chars    12 chars
//! ```
//!
//! Where:
//!
//! - The 8-character `time` field holds the 48-bit Unix timestamp in milliseconds, most
//!   significant digit first.
//! - The 12-character `suffix` field holds 72 bits of randomness, drawn afresh whenever the
//!   timestamp changes. When two push IDs are generated within the same millisecond, the later
//!   one reuses the previous suffix incremented by one, so push IDs from one generator sort in
//!   creation order both as strings and as [`PushId`] values.
//!
//! In the very rare circumstances where the suffix reaches its maximum value within the same
//! millisecond, [`PushIdGenerator::generate`] waits until the clock moves on and draws a fresh
//! suffix, while [`PushIdGenerator::generate_or_abort`] reports
//! [`GenerateError::SuffixOverflow`]. This library does not compensate for system clock
//! rollbacks: a push ID generated after the clock moves backwards sorts before the preceding
//! ones.
//!
//! # Crate features
//!
//! - `std` enables the system clock, [`SyncGenerator`], and `String` conversions. Without it the
//!   crate is `no_std`.
//! - `global_gen` (default) enables [`push_id()`] and [`push_id_string()`].
//! - `serde` enables serialization support for [`PushId`].

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod id;
pub use id::{ParseError, PushId, ID_CHARS, ID_LEN, MAX_TIMESTAMP, SUFFIX_LEN, TIMESTAMP_LEN};

pub mod generator;
#[doc(no_inline)]
pub use generator::{GenerateError, PushIdGenerator};

#[cfg(feature = "std")]
#[doc(no_inline)]
pub use generator::StdSystemTime;

mod sync_gen;
#[cfg(feature = "std")]
pub use sync_gen::SyncGenerator;

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{push_id, push_id_string};
