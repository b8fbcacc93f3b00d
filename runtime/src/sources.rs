//! The stream source aggregator.

use crate::config::{EventSourcesConfig, FanOut};
use crate::metrics::{SourceMetrics, TokenMetrics};
use crate::registry::{EventSourcesBuilder, PresenceSource, RoomSource, SourceFactory};
use event_sources_core::{
    EventBatch, EventsKey, PaginationConfig, PresenceKey, SourceError, SourceName, StreamEvent,
    StreamKey, StreamToken, TokenPart, UserId,
};
use std::future::Future;
use std::time::Instant;

/// New events for one user across every source.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEvents {
    /// Events from the room source, oldest first.
    pub room: Vec<StreamEvent>,
    /// Events from the presence source, oldest first.
    pub presence: Vec<StreamEvent>,
    /// The token the request started from.
    pub start: StreamToken,
    /// The token to resume from next time.
    pub end: StreamToken,
}

impl NewEvents {
    /// Total number of events across sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.room.len() + self.presence.len()
    }

    /// Whether no source produced anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.room.is_empty() && self.presence.is_empty()
    }
}

/// Owns one source per registered name and composes their cursors.
///
/// This is the only access point callers use; they never talk to a source
/// directly. The registry is read-only after construction, so an
/// `EventSources` can be shared (`Arc<EventSources>`) by any number of
/// concurrent callers without locking.
///
/// # Failure policy
///
/// A composite request either fully succeeds or fully fails. If any source
/// query fails the whole request fails with that source's error, unchanged,
/// and no partial token is produced.
///
/// # Example
///
/// ```
/// use event_sources_runtime::EventSources;
/// use event_sources_runtime::config::EventSourcesConfig;
/// use event_sources_runtime::registry::NullSources;
/// use event_sources_core::StreamToken;
///
/// # tokio_test::block_on(async {
/// let sources = EventSources::new(&NullSources, EventSourcesConfig::default());
/// let token = sources.get_current_token().await;
/// assert_eq!(token, Ok(StreamToken::START));
/// # });
/// ```
pub struct EventSources {
    room: RoomSource,
    presence: PresenceSource,
    config: EventSourcesConfig,
}

impl EventSources {
    /// Build one source per registered name from `factory`.
    #[must_use]
    pub fn new(factory: &impl SourceFactory, config: EventSourcesConfig) -> Self {
        Self::from_registry(factory.room_source(), factory.presence_source(), config)
    }

    /// Start explicit registration.
    #[must_use]
    pub fn builder() -> EventSourcesBuilder {
        EventSourcesBuilder::default()
    }

    pub(crate) fn from_registry(
        room: RoomSource,
        presence: PresenceSource,
        config: EventSourcesConfig,
    ) -> Self {
        tracing::info!(
            sources = ?SourceName::ALL,
            fan_out = ?config.fan_out,
            "Stream sources registered"
        );
        Self {
            room,
            presence,
            config,
        }
    }

    /// Compose a token from one cursor per source.
    ///
    /// Pure: no validation beyond what the key types enforce.
    #[must_use]
    pub const fn create_token(events_key: EventsKey, presence_key: PresenceKey) -> StreamToken {
        StreamToken::new(events_key, presence_key)
    }

    /// The registered source names, in token field order.
    #[must_use]
    pub const fn source_names(&self) -> [SourceName; 2] {
        SourceName::ALL
    }

    /// The aggregator's configuration.
    #[must_use]
    pub const fn config(&self) -> &EventSourcesConfig {
        &self.config
    }

    /// The source registered as `"room"`.
    #[must_use]
    pub const fn room(&self) -> &RoomSource {
        &self.room
    }

    /// The source registered as `"presence"`.
    #[must_use]
    pub const fn presence(&self) -> &PresenceSource {
        &self.presence
    }

    /// The current position of every source, as one token.
    ///
    /// Both source queries must complete before the token is composed. With
    /// [`FanOut::Concurrent`] they run at the same time and the first failure
    /// abandons the other query.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError`] reported by any source.
    #[tracing::instrument(skip(self), name = "get_current_token")]
    pub async fn get_current_token(&self) -> Result<StreamToken, SourceError> {
        let started = Instant::now();

        let room = self.query(SourceName::Room, self.room.get_current_token_part());
        let presence = self.query(SourceName::Presence, self.presence.get_current_token_part());

        let (events_key, presence_key) = match self.config.fan_out {
            FanOut::Concurrent => tokio::try_join!(room, presence)?,
            FanOut::Sequential => (room.await?, presence.await?),
        };

        let token = Self::create_token(events_key, presence_key);
        TokenMetrics::record_current_token(started.elapsed());
        tracing::debug!(%token, "Composed current stream token");

        Ok(token)
    }

    /// The current position of a single named source.
    ///
    /// # Errors
    ///
    /// Returns the source's [`SourceError`] unchanged.
    #[tracing::instrument(skip(self), name = "get_current_token_part")]
    pub async fn get_current_token_part(&self, name: SourceName) -> Result<TokenPart, SourceError> {
        match name {
            SourceName::Room => self
                .query(name, self.room.get_current_token_part())
                .await
                .map(TokenPart::Room),
            SourceName::Presence => self
                .query(name, self.presence.get_current_token_part())
                .await
                .map(TokenPart::Presence),
        }
    }

    /// Events visible to `user` since `from`, from every source.
    ///
    /// Each source receives its own part of `from` and at most `limit` events
    /// are requested from each (after clamping to `max_limit`). The returned
    /// `end` token is composed from the cursors the sources hand back.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError`] reported by any source.
    #[tracing::instrument(
        skip(self, user, from),
        name = "get_new_events_for_user",
        fields(user = %user, from = %from)
    )]
    pub async fn get_new_events_for_user(
        &self,
        user: &UserId,
        from: StreamToken,
        limit: usize,
    ) -> Result<NewEvents, SourceError> {
        let limit = self.config.clamp_limit(limit);

        let room = self.query(
            SourceName::Room,
            self.room.get_new_events_for_user(user, from.events_key(), limit),
        );
        let presence = self.query(
            SourceName::Presence,
            self.presence.get_new_events_for_user(user, from.presence_key(), limit),
        );

        let ((room, events_key), (presence, presence_key)) = match self.config.fan_out {
            FanOut::Concurrent => tokio::try_join!(room, presence)?,
            FanOut::Sequential => (room.await?, presence.await?),
        };

        SourceMetrics::record_new_events(SourceName::Room, room.len());
        SourceMetrics::record_new_events(SourceName::Presence, presence.len());

        let end = Self::create_token(events_key, presence_key);
        tracing::debug!(
            room_events = room.len(),
            presence_events = presence.len(),
            %end,
            "Collected new events"
        );

        Ok(NewEvents {
            room,
            presence,
            start: from,
            end,
        })
    }

    /// A page of room history for `user`.
    ///
    /// `key` is passed to the room source uninterpreted.
    ///
    /// # Errors
    ///
    /// Returns the room source's [`SourceError`] unchanged.
    #[tracing::instrument(
        skip(self, user, config),
        name = "get_room_pagination_rows",
        fields(user = %user, from = %config.from_token)
    )]
    pub async fn get_room_pagination_rows(
        &self,
        user: &UserId,
        config: &PaginationConfig<EventsKey>,
        key: Option<&str>,
    ) -> Result<EventBatch<EventsKey>, SourceError> {
        let config = self.clamp_page(config);
        self.query(
            SourceName::Room,
            self.room.get_pagination_rows(user, &config, key),
        )
        .await
    }

    /// A page of presence history for `user`.
    ///
    /// `key` is passed to the presence source uninterpreted.
    ///
    /// # Errors
    ///
    /// Returns the presence source's [`SourceError`] unchanged.
    #[tracing::instrument(
        skip(self, user, config),
        name = "get_presence_pagination_rows",
        fields(user = %user, from = %config.from_token)
    )]
    pub async fn get_presence_pagination_rows(
        &self,
        user: &UserId,
        config: &PaginationConfig<PresenceKey>,
        key: Option<&str>,
    ) -> Result<EventBatch<PresenceKey>, SourceError> {
        let config = self.clamp_page(config);
        self.query(
            SourceName::Presence,
            self.presence.get_pagination_rows(user, &config, key),
        )
        .await
    }

    fn clamp_page<K: StreamKey>(&self, config: &PaginationConfig<K>) -> PaginationConfig<K> {
        let limit = self.config.clamp_limit(config.limit);
        config.clone().with_limit(limit)
    }

    /// Run one source query with the configured timeout, recording metrics
    /// and logging failures. The error is returned unchanged.
    async fn query<T>(
        &self,
        name: SourceName,
        operation: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        SourceMetrics::record_query(name);

        let result = match self.config.query_timeout {
            Some(after) => tokio::time::timeout(after, operation)
                .await
                .unwrap_or_else(|_| Err(SourceError::Timeout { name, after })),
            None => operation.await,
        };

        if let Err(error) = &result {
            SourceMetrics::record_failure(name);
            tracing::warn!(source = %name, %error, "Stream source query failed");
        }

        result
    }
}

impl std::fmt::Debug for EventSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSources")
            .field("sources", &SourceName::ALL)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
