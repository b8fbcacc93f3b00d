//! In-memory stream source for fast, deterministic tests.
//!
//! [`InMemoryStreamSource`] numbers appended events with consecutive keys and
//! keeps a bounded window of history. Cursors older than the window are
//! rejected with [`SourceError::StaleCursor`].

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only happens after a test already panicked

use event_sources_core::{
    Direction, EventBatch, OrderedKey, PaginationConfig, SourceError, SourceFuture, SourceName,
    StreamEvent, StreamSource, UserId,
};
use std::collections::VecDeque;
use std::fmt;
use std::future;
use std::sync::{Arc, RwLock};

/// Default number of events kept before the oldest are dropped.
const DEFAULT_RETENTION: usize = 1024;

#[derive(Debug)]
struct Inner<K> {
    /// Retained events, oldest first.
    events: VecDeque<(K, StreamEvent)>,
    /// Position of the newest event (or the start position if none).
    current: K,
    /// Cursors below this refer to history that is gone.
    floor: K,
    /// Error every operation returns while set.
    failure: Option<SourceError>,
}

/// Append-only stream source backed by a `VecDeque`.
///
/// Clones share the same backing store, so a test can keep a handle for
/// appending while the aggregator owns another.
///
/// - Visibility follows [`StreamEvent::is_visible_to`]
/// - The pagination `key` selects events by [`StreamEvent::scope`]
/// - A cursor ahead of the current position yields no events and is echoed
///
/// # Example
///
/// ```
/// use event_sources_testing::InMemoryStreamSource;
/// use event_sources_core::{EventsKey, SourceName, StreamEvent, StreamSource, UserId};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let source = InMemoryStreamSource::<EventsKey>::new(SourceName::Room);
/// let alice = UserId::new("@alice:example.org");
///
/// let key = source
///     .append(StreamEvent::new("m.room.message", alice.clone(), json!({"body": "hi"})))
///     .unwrap_or_default();
/// assert_eq!(key, EventsKey::new(1));
///
/// let (events, next) = source
///     .get_new_events_for_user(&alice, EventsKey::new(0), 10)
///     .await
///     .unwrap_or_default();
/// assert_eq!(events.len(), 1);
/// assert_eq!(next, key);
/// # });
/// ```
#[derive(Clone)]
pub struct InMemoryStreamSource<K> {
    name: SourceName,
    retention: usize,
    inner: Arc<RwLock<Inner<K>>>,
}

impl<K: OrderedKey + fmt::Display> InMemoryStreamSource<K> {
    /// Create an empty source at the zero position.
    #[must_use]
    pub fn new(name: SourceName) -> Self {
        Self::starting_at(name, K::zero())
    }

    /// Create an empty source whose history starts at `position`.
    ///
    /// Cursors below `position` are stale.
    #[must_use]
    pub fn starting_at(name: SourceName, position: K) -> Self {
        Self {
            name,
            retention: DEFAULT_RETENTION,
            inner: Arc::new(RwLock::new(Inner {
                events: VecDeque::new(),
                current: position,
                floor: position,
                failure: None,
            })),
        }
    }

    /// Keep at most `retention` events.
    #[must_use]
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    /// The name this source reports in errors.
    #[must_use]
    pub const fn name(&self) -> SourceName {
        self.name
    }

    /// Append an event and return its key.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Exhausted`] once the key type has no position
    /// after the current one. The source is left unchanged.
    pub fn append(&self, event: StreamEvent) -> Result<K, SourceError> {
        let mut inner = self.inner.write().unwrap();
        let key = inner
            .current
            .successor()
            .ok_or(SourceError::Exhausted { name: self.name })?;
        inner.current = key;
        inner.events.push_back((key, event));

        while inner.events.len() > self.retention {
            if let Some((dropped, _)) = inner.events.pop_front() {
                inner.floor = dropped;
            }
        }

        tracing::trace!(source = %self.name, %key, "Appended event");
        Ok(key)
    }

    /// The newest position.
    #[must_use]
    pub fn current(&self) -> K {
        self.inner.read().unwrap().current
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().events.len()
    }

    /// Whether no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().events.is_empty()
    }

    /// Make every operation fail with `error` until [`recover`](Self::recover).
    pub fn fail_with(&self, error: SourceError) {
        self.inner.write().unwrap().failure = Some(error);
    }

    /// Stop failing.
    pub fn recover(&self) {
        self.inner.write().unwrap().failure = None;
    }

    fn stale(&self, requested: K, floor: K) -> SourceError {
        SourceError::StaleCursor {
            name: self.name,
            requested: requested.to_string(),
            oldest: floor.to_string(),
        }
    }

    fn new_events(
        &self,
        user: &UserId,
        from: K,
        limit: usize,
    ) -> Result<EventBatch<K>, SourceError> {
        let inner = self.inner.read().unwrap();
        if let Some(error) = &inner.failure {
            return Err(error.clone());
        }
        if from < inner.floor {
            return Err(self.stale(from, inner.floor));
        }
        if from >= inner.current {
            return Ok((Vec::new(), from));
        }

        let mut events = Vec::new();
        let mut cursor = from;
        let mut exhausted = true;

        for (key, event) in inner.events.iter().filter(|(key, _)| *key > from) {
            if event.is_visible_to(user) {
                if events.len() == limit {
                    exhausted = false;
                    break;
                }
                events.push(event.clone());
            }
            cursor = *key;
        }

        if exhausted {
            cursor = inner.current;
        }

        Ok((events, cursor))
    }

    fn page(
        &self,
        user: &UserId,
        config: &PaginationConfig<K>,
        key: Option<&str>,
    ) -> Result<EventBatch<K>, SourceError> {
        let inner = self.inner.read().unwrap();
        if let Some(error) = &inner.failure {
            return Err(error.clone());
        }

        let from = config.from_token;
        let selected = |event: &StreamEvent| event.is_visible_to(user) && event.in_scope(key);
        let mut rows = Vec::new();
        let mut cursor = from;

        match config.direction {
            Direction::Forwards => {
                if from < inner.floor {
                    return Err(self.stale(from, inner.floor));
                }

                let window = inner
                    .events
                    .iter()
                    .filter(|(k, _)| *k > from)
                    .take_while(|(k, _)| config.to_token.is_none_or(|to| *k <= to));

                for (k, event) in window {
                    if selected(event) {
                        if rows.len() == config.limit {
                            break;
                        }
                        rows.push(event.clone());
                    }
                    cursor = *k;
                }
            }
            Direction::Backwards => {
                let positions: Vec<usize> = (0..inner.events.len())
                    .rev()
                    .filter(|&i| inner.events[i].0 <= from)
                    .take_while(|&i| config.to_token.is_none_or(|to| inner.events[i].0 > to))
                    .collect();

                for i in positions {
                    let event = &inner.events[i].1;
                    if selected(event) {
                        if rows.len() == config.limit {
                            break;
                        }
                        rows.push(event.clone());
                    }
                    cursor = if i == 0 { inner.floor } else { inner.events[i - 1].0 };
                }
            }
        }

        Ok((rows, cursor))
    }

    fn current_position(&self) -> Result<K, SourceError> {
        let inner = self.inner.read().unwrap();
        match &inner.failure {
            Some(error) => Err(error.clone()),
            None => Ok(inner.current),
        }
    }
}

impl<K: OrderedKey + fmt::Display> StreamSource for InMemoryStreamSource<K> {
    type Key = K;

    fn get_new_events_for_user<'a>(
        &'a self,
        user: &'a UserId,
        from_key: K,
        limit: usize,
    ) -> SourceFuture<'a, EventBatch<K>> {
        Box::pin(future::ready(self.new_events(user, from_key, limit)))
    }

    fn get_current_token_part(&self) -> SourceFuture<'_, K> {
        Box::pin(future::ready(self.current_position()))
    }

    fn get_pagination_rows<'a>(
        &'a self,
        user: &'a UserId,
        config: &'a PaginationConfig<K>,
        key: Option<&'a str>,
    ) -> SourceFuture<'a, EventBatch<K>> {
        Box::pin(future::ready(self.page(user, config, key)))
    }
}

impl<K: fmt::Debug> fmt::Debug for InMemoryStreamSource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStreamSource")
            .field("name", &self.name)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_sources_core::{EventsKey, PresenceKey};
    use serde_json::json;
    use tokio_test::block_on;

    fn alice() -> UserId {
        UserId::new("@alice:example.org")
    }

    fn bob() -> UserId {
        UserId::new("@bob:example.org")
    }

    fn message(room: &str, n: u64) -> StreamEvent {
        StreamEvent::new("m.room.message", alice(), json!({ "n": n })).with_scope(room)
    }

    fn numbers(events: &[StreamEvent]) -> Vec<u64> {
        events
            .iter()
            .map(|e| e.content["n"].as_u64().unwrap())
            .collect()
    }

    fn room_source(count: u64) -> InMemoryStreamSource<EventsKey> {
        let source = InMemoryStreamSource::new(SourceName::Room);
        for n in 1..=count {
            source.append(message("!a:example.org", n)).unwrap();
        }
        source
    }

    #[test]
    fn append_assigns_consecutive_keys() {
        let source = InMemoryStreamSource::<PresenceKey>::new(SourceName::Presence);
        let a = source.append(StreamEvent::new("m.presence", alice(), json!({}))).unwrap();
        let b = source.append(StreamEvent::new("m.presence", bob(), json!({}))).unwrap();

        assert_eq!(a, PresenceKey::new(1));
        assert_eq!(b, PresenceKey::new(2));
        assert_eq!(source.current(), b);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn new_events_respect_limit() {
        let source = room_source(5);

        let (events, next) =
            block_on(source.get_new_events_for_user(&alice(), EventsKey::new(1), 2)).unwrap();
        assert_eq!(numbers(&events), vec![2, 3]);
        assert_eq!(next, EventsKey::new(3));

        let (events, next) =
            block_on(source.get_new_events_for_user(&alice(), next, 10)).unwrap();
        assert_eq!(numbers(&events), vec![4, 5]);
        assert_eq!(next, EventsKey::new(5));
    }

    #[test]
    fn invisible_events_are_skipped_but_consumed() {
        let source = InMemoryStreamSource::<EventsKey>::new(SourceName::Room);
        source.append(message("!a:example.org", 1).with_audience([bob()])).unwrap();
        source.append(message("!a:example.org", 2)).unwrap();

        let (events, next) =
            block_on(source.get_new_events_for_user(&alice(), EventsKey::new(0), 10)).unwrap();
        assert_eq!(numbers(&events), vec![2]);
        assert_eq!(next, EventsKey::new(2));
    }

    #[test]
    fn cursor_ahead_of_current_is_echoed() {
        let source = room_source(2);
        let (events, next) =
            block_on(source.get_new_events_for_user(&alice(), EventsKey::new(9), 10)).unwrap();
        assert!(events.is_empty());
        assert_eq!(next, EventsKey::new(9));
    }

    #[test]
    fn stale_cursor_is_signalled() {
        let source = room_source(0).with_retention(2);
        for n in 1..=5 {
            source.append(message("!a:example.org", n)).unwrap();
        }

        let result = block_on(source.get_new_events_for_user(&alice(), EventsKey::new(1), 10));
        assert_eq!(
            result,
            Err(SourceError::StaleCursor {
                name: SourceName::Room,
                requested: "1".to_string(),
                oldest: "3".to_string(),
            })
        );

        let (events, _) =
            block_on(source.get_new_events_for_user(&alice(), EventsKey::new(3), 10)).unwrap();
        assert_eq!(numbers(&events), vec![4, 5]);
    }

    #[test]
    fn backwards_pagination_walks_history() {
        let source = room_source(5);
        let config = PaginationConfig::new(EventsKey::new(5)).with_limit(2);

        let (rows, next) =
            block_on(source.get_pagination_rows(&alice(), &config, None)).unwrap();
        assert_eq!(numbers(&rows), vec![5, 4]);
        assert_eq!(next, EventsKey::new(3));

        let config = PaginationConfig::new(next).with_limit(10);
        let (rows, next) =
            block_on(source.get_pagination_rows(&alice(), &config, None)).unwrap();
        assert_eq!(numbers(&rows), vec![3, 2, 1]);
        assert_eq!(next, EventsKey::new(0));
    }

    #[test]
    fn forwards_pagination_stops_at_to_token() {
        let source = room_source(5);
        let config = PaginationConfig::new(EventsKey::new(1))
            .with_direction(Direction::Forwards)
            .with_to_token(EventsKey::new(3));

        let (rows, next) =
            block_on(source.get_pagination_rows(&alice(), &config, None)).unwrap();
        assert_eq!(numbers(&rows), vec![2, 3]);
        assert_eq!(next, EventsKey::new(3));
    }

    #[test]
    fn pagination_key_selects_scope() {
        let source = InMemoryStreamSource::<EventsKey>::new(SourceName::Room);
        source.append(message("!a:example.org", 1)).unwrap();
        source.append(message("!b:example.org", 2)).unwrap();
        source.append(message("!a:example.org", 3)).unwrap();

        let config = PaginationConfig::new(EventsKey::new(3));
        let (rows, _) =
            block_on(source.get_pagination_rows(&alice(), &config, Some("!a:example.org")))
                .unwrap();
        assert_eq!(numbers(&rows), vec![3, 1]);
    }

    #[test]
    fn append_at_last_position_is_refused() {
        let source = InMemoryStreamSource::starting_at(SourceName::Room, EventsKey::new(u64::MAX));

        let result = source.append(message("!a:example.org", 1));

        assert_eq!(result, Err(SourceError::Exhausted { name: SourceName::Room }));
        assert_eq!(source.current(), EventsKey::new(u64::MAX));
        assert!(source.is_empty());
    }

    #[test]
    fn failure_injection() {
        let source = room_source(1);
        let error = SourceError::Backend("disk full".to_string());

        source.fail_with(error.clone());
        assert_eq!(block_on(source.get_current_token_part()), Err(error));

        source.recover();
        assert_eq!(block_on(source.get_current_token_part()), Ok(EventsKey::new(1)));
    }
}
