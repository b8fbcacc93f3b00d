//! Composite stream tokens.
//!
//! A [`StreamToken`] bundles one cursor per registered source so a client can
//! resume every stream at once. Tokens are immutable: advancing a position
//! means building a new token.
//!
//! # Ordering
//!
//! Each field is ordered within its own source only. Tokens are therefore
//! compared component-wise: `a <= b` holds when every field of `a` is at or
//! before the matching field of `b`. If one source moved forwards while another
//! moved backwards the tokens are incomparable (`partial_cmp` returns `None`).

use crate::key::{EventsKey, PresenceKey};
use crate::source::SourceName;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// One source's cursor, tagged with the source it belongs to.
///
/// Lets callers address token fields by [`SourceName`] instead of by field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "key", rename_all = "lowercase")]
pub enum TokenPart {
    /// Cursor of the room source.
    Room(EventsKey),
    /// Cursor of the presence source.
    Presence(PresenceKey),
}

impl TokenPart {
    /// The source this cursor belongs to.
    #[must_use]
    pub const fn source(self) -> SourceName {
        match self {
            Self::Room(_) => SourceName::Room,
            Self::Presence(_) => SourceName::Presence,
        }
    }
}

impl fmt::Display for TokenPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(key) => write!(f, "room:{key}"),
            Self::Presence(key) => write!(f, "presence:{key}"),
        }
    }
}

/// Composite cursor across every registered source.
///
/// Two tokens are equal iff every per-source field is equal.
///
/// # Examples
///
/// ```
/// use event_sources_core::key::{EventsKey, PresenceKey};
/// use event_sources_core::token::StreamToken;
///
/// let token = StreamToken::new(EventsKey::new(42), PresenceKey::new(7));
/// assert_eq!(token.events_key(), EventsKey::new(42));
/// assert_eq!(token.presence_key(), PresenceKey::new(7));
///
/// let later = token.with_events_key(EventsKey::new(43));
/// assert!(token < later);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamToken {
    events_key: EventsKey,
    presence_key: PresenceKey,
}

impl StreamToken {
    /// The token every source starts at.
    pub const START: Self = Self::new(EventsKey::new(0), PresenceKey::new(0));

    /// Compose a token from one cursor per source.
    #[must_use]
    pub const fn new(events_key: EventsKey, presence_key: PresenceKey) -> Self {
        Self {
            events_key,
            presence_key,
        }
    }

    /// Room source cursor.
    #[must_use]
    pub const fn events_key(&self) -> EventsKey {
        self.events_key
    }

    /// Presence source cursor.
    #[must_use]
    pub const fn presence_key(&self) -> PresenceKey {
        self.presence_key
    }

    /// A copy of this token with the room cursor replaced.
    #[must_use]
    pub const fn with_events_key(self, events_key: EventsKey) -> Self {
        Self { events_key, ..self }
    }

    /// A copy of this token with the presence cursor replaced.
    #[must_use]
    pub const fn with_presence_key(self, presence_key: PresenceKey) -> Self {
        Self {
            presence_key,
            ..self
        }
    }

    /// The cursor of the named source.
    ///
    /// # Examples
    ///
    /// ```
    /// use event_sources_core::key::{EventsKey, PresenceKey};
    /// use event_sources_core::source::SourceName;
    /// use event_sources_core::token::{StreamToken, TokenPart};
    ///
    /// let token = StreamToken::new(EventsKey::new(3), PresenceKey::new(5));
    /// assert_eq!(token.part(SourceName::Presence), TokenPart::Presence(PresenceKey::new(5)));
    /// ```
    #[must_use]
    pub const fn part(&self, source: SourceName) -> TokenPart {
        match source {
            SourceName::Room => TokenPart::Room(self.events_key),
            SourceName::Presence => TokenPart::Presence(self.presence_key),
        }
    }

    /// A copy of this token with the part's source replaced.
    #[must_use]
    pub const fn with_part(self, part: TokenPart) -> Self {
        match part {
            TokenPart::Room(key) => self.with_events_key(key),
            TokenPart::Presence(key) => self.with_presence_key(key),
        }
    }

    /// Every part of this token, in [`SourceName::ALL`] order.
    #[must_use]
    pub const fn parts(&self) -> [TokenPart; 2] {
        [
            TokenPart::Room(self.events_key),
            TokenPart::Presence(self.presence_key),
        ]
    }

    /// Component-wise maximum of two tokens.
    ///
    /// The result is at or after both inputs in every source, which makes it
    /// the right token to hand back after merging results from two requests.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            events_key: self.events_key.max(other.events_key),
            presence_key: self.presence_key.max(other.presence_key),
        }
    }
}

impl PartialOrd for StreamToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let events = self.events_key.cmp(&other.events_key);
        let presence = self.presence_key.cmp(&other.presence_key);

        match (events, presence) {
            (a, b) if a == b => Some(a),
            (Ordering::Equal, other) | (other, Ordering::Equal) => Some(other),
            _ => None,
        }
    }
}

impl fmt::Display for StreamToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StreamToken(events_key={}, presence_key={})",
            self.events_key, self.presence_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn token(events: u64, presence: u64) -> StreamToken {
        StreamToken::new(EventsKey::new(events), PresenceKey::new(presence))
    }

    #[test]
    fn start_is_all_zero() {
        assert_eq!(StreamToken::START, token(0, 0));
        assert_eq!(StreamToken::default(), StreamToken::START);
    }

    #[test]
    fn with_builders_leave_original_untouched() {
        let original = token(1, 2);
        let advanced = original.with_events_key(EventsKey::new(5));

        assert_eq!(original, token(1, 2));
        assert_eq!(advanced, token(5, 2));
        assert_eq!(original.with_presence_key(PresenceKey::new(9)), token(1, 9));
    }

    #[test]
    fn part_addressing_round_trips() {
        let original = token(4, 6);
        for name in SourceName::ALL {
            let part = original.part(name);
            assert_eq!(part.source(), name);
            assert_eq!(StreamToken::START.with_part(part).part(name), part);
        }
        assert_eq!(original.parts().map(TokenPart::source), SourceName::ALL);
    }

    #[test]
    fn mixed_advancement_is_incomparable() {
        let a = token(5, 1);
        let b = token(1, 5);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(!(a < b));
        assert!(!(a > b));
    }

    #[test]
    fn merge_takes_component_maximum() {
        assert_eq!(token(5, 1).merge(token(1, 5)), token(5, 5));
    }

    #[test]
    fn display_names_both_fields() {
        assert_eq!(
            token(42, 7).to_string(),
            "StreamToken(events_key=42, presence_key=7)"
        );
        assert_eq!(TokenPart::Room(EventsKey::new(3)).to_string(), "room:3");
    }

    proptest! {
        #[test]
        fn fields_equal_inputs(e in any::<u64>(), p in any::<u64>()) {
            let t = token(e, p);
            prop_assert_eq!(t.events_key().value(), e);
            prop_assert_eq!(t.presence_key().value(), p);
        }

        #[test]
        fn equality_iff_every_field_equal(
            e1 in 0_u64..4,
            p1 in 0_u64..4,
            e2 in 0_u64..4,
            p2 in 0_u64..4
        ) {
            prop_assert_eq!(token(e1, p1) == token(e2, p2), e1 == e2 && p1 == p2);
        }

        #[test]
        fn order_is_component_wise(
            e1 in 0_u64..4,
            p1 in 0_u64..4,
            e2 in 0_u64..4,
            p2 in 0_u64..4
        ) {
            let (a, b) = (token(e1, p1), token(e2, p2));
            prop_assert_eq!(a <= b, e1 <= e2 && p1 <= p2);
            prop_assert_eq!(a >= b, e1 >= e2 && p1 >= p2);
        }

        #[test]
        fn merge_dominates_both(
            e1 in any::<u64>(),
            p1 in any::<u64>(),
            e2 in any::<u64>(),
            p2 in any::<u64>()
        ) {
            let (a, b) = (token(e1, p1), token(e2, p2));
            let merged = a.merge(b);
            prop_assert!(merged >= a);
            prop_assert!(merged >= b);
        }
    }
}
