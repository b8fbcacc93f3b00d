//! Per-source cursor types.
//!
//! Every stream source advances its own cursor (a "token part") independently
//! of every other source. This module defines the capability a cursor must
//! provide ([`StreamKey`]) and the two concrete cursors carried by a
//! [`StreamToken`](crate::token::StreamToken):
//!
//! - [`EventsKey`]: position in the room event stream
//! - [`PresenceKey`]: position in the presence stream
//!
//! A cursor is meaningful only within the source that produced it. An
//! `EventsKey` and a `PresenceKey` with the same numeric value say nothing
//! about each other, which is why they are distinct types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Capability every source cursor must provide.
///
/// The contract deliberately asks for equality only. Sources whose cursors
/// are sequence numbers additionally implement [`OrderedKey`].
///
/// # Examples
///
/// ```
/// use event_sources_core::key::{EventsKey, StreamKey};
///
/// assert_eq!(EventsKey::zero(), EventsKey::new(0));
/// ```
pub trait StreamKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// The position of a source that has never produced anything.
    fn zero() -> Self;
}

/// A cursor with a total order and a successor.
///
/// Used by sources that number their events sequentially.
pub trait OrderedKey: StreamKey + Ord + Copy {
    /// The position immediately after `self`, or `None` once the cursor space
    /// is exhausted.
    #[must_use]
    fn successor(self) -> Option<Self>;
}

/// Position in the room event stream.
///
/// # Examples
///
/// ```
/// use event_sources_core::key::{EventsKey, OrderedKey};
///
/// let key = EventsKey::new(41);
/// assert_eq!(key.successor(), Some(EventsKey::new(42)));
/// assert_eq!(EventsKey::new(u64::MAX).successor(), None);
/// assert_eq!(key.value(), 41);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventsKey(u64);

impl EventsKey {
    /// Create a new `EventsKey` at the given position.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw position.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Position in the presence stream.
///
/// # Examples
///
/// ```
/// use event_sources_core::key::{PresenceKey, StreamKey};
///
/// assert!(PresenceKey::new(7) > PresenceKey::zero());
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceKey(u64);

impl PresenceKey {
    /// Create a new `PresenceKey` at the given position.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw position.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

macro_rules! sequential_key {
    ($key:ident) => {
        impl StreamKey for $key {
            fn zero() -> Self {
                Self(0)
            }
        }

        impl OrderedKey for $key {
            fn successor(self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl fmt::Display for $key {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $key {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$key> for u64 {
            fn from(key: $key) -> Self {
                key.0
            }
        }
    };
}

sequential_key!(EventsKey);
sequential_key!(PresenceKey);
