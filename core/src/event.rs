//! Users and the events sources hand back to them.
//!
//! Sources are heterogeneous (room timeline, presence, ...) but the
//! aggregator returns their output side by side, so every source speaks the
//! same type-erased [`StreamEvent`]. The payload is JSON; only the source that
//! produced an event knows its concrete shape.

use crate::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `UserId` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid user ID: {0}")]
pub struct ParseUserIdError(String);

/// Identifier of the user events are fetched for.
///
/// # Validation
///
/// - `FromStr::from_str()`: rejects empty strings
/// - `new()` and `From`: no validation, for trusted input
///
/// # Examples
///
/// ```
/// use event_sources_core::event::UserId;
///
/// let user = UserId::new("@alice:example.org");
/// assert_eq!(user.as_str(), "@alice:example.org");
///
/// assert!("".parse::<UserId>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new `UserId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the user ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseUserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseUserIdError("User ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An event produced by a stream source.
///
/// - `scope`: the logical sub-stream the event belongs to (a room ID for room
///   events). Pagination keys select on it.
/// - `audience`: when set, only these users may see the event. `None` means
///   visible to everyone.
///
/// # Examples
///
/// ```
/// use event_sources_core::event::{StreamEvent, UserId};
/// use serde_json::json;
///
/// let bob = UserId::new("@bob:example.org");
/// let event = StreamEvent::new("m.presence", bob, json!({"presence": "online"}))
///     .with_audience([UserId::new("@alice:example.org")]);
///
/// assert!(event.is_visible_to(&UserId::new("@alice:example.org")));
/// assert!(!event.is_visible_to(&UserId::new("@carol:example.org")));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event type identifier (e.g. `"m.room.message"`).
    pub event_type: String,
    /// Sub-stream this event belongs to.
    pub scope: Option<String>,
    /// User that caused the event.
    pub sender: UserId,
    /// Users allowed to see the event; `None` for everyone.
    pub audience: Option<Vec<UserId>>,
    /// Source-defined payload.
    pub content: serde_json::Value,
    /// When the source recorded the event.
    pub recorded_at: DateTime<Utc>,
}

impl StreamEvent {
    /// Create an event visible to everyone, recorded now.
    #[must_use]
    pub fn new(event_type: impl Into<String>, sender: UserId, content: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            scope: None,
            sender,
            audience: None,
            content,
            recorded_at: Utc::now(),
        }
    }

    /// Place the event in a sub-stream.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Restrict visibility to the given users.
    #[must_use]
    pub fn with_audience(mut self, audience: impl IntoIterator<Item = UserId>) -> Self {
        self.audience = Some(audience.into_iter().collect());
        self
    }

    /// Override the recording time.
    #[must_use]
    pub const fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Whether `user` may see this event.
    #[must_use]
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.audience
            .as_ref()
            .is_none_or(|audience| audience.contains(user))
    }

    /// Whether this event belongs to the sub-stream selected by `key`.
    ///
    /// A `None` key selects every sub-stream.
    #[must_use]
    pub fn in_scope(&self, key: Option<&str>) -> bool {
        key.is_none_or(|key| self.scope.as_deref() == Some(key))
    }
}
