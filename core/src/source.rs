//! The stream source contract.
//!
//! A stream source produces an ordered sequence of events and a cursor into
//! that sequence. The aggregator in `event-sources-runtime` treats every
//! source uniformly through the [`StreamSource`] trait and never depends on a
//! concrete type.
//!
//! # Implementations
//!
//! - [`NullSource`](crate::null_source::NullSource): no events, cursor pinned at zero
//! - `InMemoryStreamSource` (in `event-sources-testing`): growable, deterministic
//! - Room timeline and presence sources live with their storage and are
//!   outside this workspace
//!
//! # Example
//!
//! ```
//! use event_sources_core::key::EventsKey;
//! use event_sources_core::null_source::NullSource;
//! use event_sources_core::source::StreamSource;
//!
//! # tokio_test::block_on(async {
//! let source = NullSource::<EventsKey>::new();
//! let current = source.get_current_token_part().await.unwrap_or_default();
//! assert_eq!(current, EventsKey::new(0));
//! # });
//! ```

use crate::event::{StreamEvent, UserId};
use crate::key::StreamKey;
use crate::pagination::PaginationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Identifier of a registered stream source.
///
/// The set is closed: adding a stream type means adding a variant here and a
/// matching field on [`StreamToken`](crate::token::StreamToken). The two change
/// together.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    /// Room timeline events. Carries the `events_key` token part.
    Room,
    /// Presence changes. Carries the `presence_key` token part.
    Presence,
}

impl SourceName {
    /// Every registered source, in token field order.
    pub const ALL: [Self; 2] = [Self::Room, Self::Presence];

    /// The registry name of this source.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_sources_core::source::SourceName;
    ///
    /// assert_eq!(SourceName::Room.as_str(), "room");
    /// assert_eq!(SourceName::Presence.as_str(), "presence");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Presence => "presence",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a name that is not in the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown stream source: {0:?}")]
pub struct ParseSourceNameError(String);

impl ParseSourceNameError {
    /// The name that failed to parse.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl FromStr for SourceName {
    type Err = ParseSourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ParseSourceNameError(s.to_string()))
    }
}

/// Errors a stream source can report.
///
/// The aggregator propagates these unchanged: a failed source query fails
/// the whole composite request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not complete the operation (backing store down, etc.).
    #[error("Stream source {name} unavailable: {reason}")]
    Unavailable {
        /// The source that failed.
        name: SourceName,
        /// Why it failed.
        reason: String,
    },

    /// The requested cursor refers to history the source no longer retains.
    #[error(
        "Stale cursor for stream source {name}: requested {requested}, oldest retained {oldest}"
    )]
    StaleCursor {
        /// The source that rejected the cursor.
        name: SourceName,
        /// The cursor the caller supplied.
        requested: String,
        /// The oldest position the source can still serve from.
        oldest: String,
    },

    /// The source did not answer within the configured query timeout.
    #[error("Stream source {name} timed out after {after:?}")]
    Timeout {
        /// The source that timed out.
        name: SourceName,
        /// The timeout that elapsed.
        after: Duration,
    },

    /// The source has handed out its last position and cannot advance.
    #[error("Stream source {name} has exhausted its cursor space")]
    Exhausted {
        /// The source that cannot advance.
        name: SourceName,
    },

    /// Any other backend failure.
    #[error("Stream source backend error: {0}")]
    Backend(String),
}

/// Boxed future returned by every [`StreamSource`] operation.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// A page or batch of events together with the cursor to continue from.
pub type EventBatch<K> = (Vec<StreamEvent>, K);

/// The contract every event source implements.
///
/// # Thread Safety
///
/// A source is registered once and shared by every caller, so implementations
/// must be `Send + Sync` and keep no caller-specific mutable state. Each
/// operation is independently callable and reentrant. Waiting on a backing
/// store must not hold a lock across the `.await`.
///
/// # Dyn Compatibility
///
/// Operations return [`SourceFuture`] instead of using `async fn` so sources
/// can be stored as `Arc<dyn StreamSource<Key = ...>>`.
pub trait StreamSource: Send + Sync {
    /// This source's cursor type.
    type Key: StreamKey;

    /// Events visible to `user` that occurred after `from_key`.
    ///
    /// Returns at most `limit` events, plus the cursor reflecting how far this
    /// call advanced. A merely old `from_key` is not an error.
    ///
    /// # Errors
    ///
    /// - `Unavailable` / `Backend`: the backing store failed
    /// - `StaleCursor`: `from_key` is older than the retained history and the
    ///   source chooses to signal it rather than return the available subset
    fn get_new_events_for_user<'a>(
        &'a self,
        user: &'a UserId,
        from_key: Self::Key,
        limit: usize,
    ) -> SourceFuture<'a, EventBatch<Self::Key>>;

    /// The source's current position, unfiltered.
    ///
    /// Never earlier than a position previously returned to any caller in
    /// this process.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` or `Backend` if the backing store failed.
    fn get_current_token_part(&self) -> SourceFuture<'_, Self::Key>;

    /// A page of historical rows for `user`, starting at
    /// `config.from_token` and moving in `config.direction`.
    ///
    /// `key` selects a logical sub-stream for sources that serve several. Its
    /// meaning is source-defined. The returned cursor is the `from_token` to
    /// use for the next page.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable`, `Backend` or `StaleCursor` as for
    /// [`get_new_events_for_user`](Self::get_new_events_for_user).
    fn get_pagination_rows<'a>(
        &'a self,
        user: &'a UserId,
        config: &'a PaginationConfig<Self::Key>,
        key: Option<&'a str>,
    ) -> SourceFuture<'a, EventBatch<Self::Key>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        assert_eq!("room".parse::<SourceName>(), Ok(SourceName::Room));
        assert_eq!("presence".parse::<SourceName>(), Ok(SourceName::Presence));
    }

    #[test]
    fn parse_unknown_name_fails() {
        let err = "typing".parse::<SourceName>().unwrap_err();
        assert_eq!(err.name(), "typing");
        assert!(err.to_string().contains("typing"));
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Room".parse::<SourceName>().is_err());
    }

    #[test]
    fn display_matches_registry_name() {
        for name in SourceName::ALL {
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn serde_uses_registry_name() {
        let json = serde_json::to_string(&SourceName::Presence).unwrap();
        assert_eq!(json, "\"presence\"");
    }

    #[test]
    fn stale_cursor_error_display() {
        let error = SourceError::StaleCursor {
            name: SourceName::Room,
            requested: "3".to_string(),
            oldest: "10".to_string(),
        };

        let display = error.to_string();
        assert!(display.contains("room"));
        assert!(display.contains("requested 3"));
        assert!(display.contains("oldest retained 10"));
    }

    #[test]
    fn timeout_error_display() {
        let error = SourceError::Timeout {
            name: SourceName::Presence,
            after: Duration::from_millis(250),
        };
        assert!(error.to_string().contains("presence"));
    }
}
