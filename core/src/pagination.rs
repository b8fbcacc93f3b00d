//! Pagination request parameters.

use crate::key::StreamKey;
use serde::{Deserialize, Serialize};

/// Which way a page walks through a source's history.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards newer positions.
    Forwards,
    /// Towards older positions (scrolling back through history).
    #[default]
    Backwards,
}

/// Parameters for one page of a single source's history.
///
/// `from_token` is a per-source cursor, not a composite token: pagination is
/// always addressed to one named source.
///
/// # Examples
///
/// ```
/// use event_sources_core::key::EventsKey;
/// use event_sources_core::pagination::{Direction, PaginationConfig};
///
/// let config = PaginationConfig::new(EventsKey::new(100))
///     .with_limit(20)
///     .with_direction(Direction::Backwards);
///
/// assert_eq!(config.from_token, EventsKey::new(100));
/// assert_eq!(config.limit, 20);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig<K: StreamKey> {
    /// Cursor to start the page from.
    pub from_token: K,
    /// Optional cursor to stop at.
    pub to_token: Option<K>,
    /// Walk direction.
    pub direction: Direction,
    /// Maximum number of rows in the page.
    pub limit: usize,
}

impl<K: StreamKey> PaginationConfig<K> {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 10;

    /// Backwards page of [`DEFAULT_LIMIT`](Self::DEFAULT_LIMIT) rows from `from_token`.
    #[must_use]
    pub const fn new(from_token: K) -> Self {
        Self {
            from_token,
            to_token: None,
            direction: Direction::Backwards,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    /// Set the stop cursor.
    #[must_use]
    pub fn with_to_token(mut self, to_token: K) -> Self {
        self.to_token = Some(to_token);
        self
    }

    /// Set the walk direction.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PresenceKey;

    #[test]
    fn defaults_walk_backwards() {
        let config = PaginationConfig::new(PresenceKey::new(3));
        assert_eq!(config.direction, Direction::Backwards);
        assert_eq!(config.limit, PaginationConfig::<PresenceKey>::DEFAULT_LIMIT);
        assert_eq!(config.to_token, None);
    }

    #[test]
    fn builder_sets_fields() {
        let config = PaginationConfig::new(PresenceKey::new(3))
            .with_direction(Direction::Forwards)
            .with_to_token(PresenceKey::new(9))
            .with_limit(2);

        assert_eq!(config.direction, Direction::Forwards);
        assert_eq!(config.to_token, Some(PresenceKey::new(9)));
        assert_eq!(config.limit, 2);
    }
}
