//! The fixed registry of stream sources.
//!
//! Every [`SourceName`] maps to exactly one live source. The mapping is built
//! once, either from a [`SourceFactory`] (the host builds each source) or by
//! explicit registration through [`EventSourcesBuilder`], and never changes
//! afterwards.

use crate::config::EventSourcesConfig;
use crate::sources::EventSources;
use event_sources_core::{EventsKey, NullSource, PresenceKey, SourceName, StreamSource};
use std::sync::Arc;
use thiserror::Error;

/// The room source, as stored by the registry.
pub type RoomSource = Arc<dyn StreamSource<Key = EventsKey>>;

/// The presence source, as stored by the registry.
pub type PresenceSource = Arc<dyn StreamSource<Key = PresenceKey>>;

/// Errors from assembling the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A registered source name has no instance.
    #[error("No instance registered for stream source {0}")]
    MissingSource(SourceName),
}

/// The host that builds one source per registered name.
///
/// # Example
///
/// ```
/// use event_sources_runtime::registry::{PresenceSource, RoomSource, SourceFactory};
/// use event_sources_core::NullSource;
/// use std::sync::Arc;
///
/// struct Host;
///
/// impl SourceFactory for Host {
///     fn room_source(&self) -> RoomSource {
///         Arc::new(NullSource::new())
///     }
///
///     fn presence_source(&self) -> PresenceSource {
///         Arc::new(NullSource::new())
///     }
/// }
/// ```
pub trait SourceFactory {
    /// Build the source registered as `"room"`.
    fn room_source(&self) -> RoomSource;

    /// Build the source registered as `"presence"`.
    fn presence_source(&self) -> PresenceSource;
}

/// Factory that registers a [`NullSource`] for every name.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSources;

impl SourceFactory for NullSources {
    fn room_source(&self) -> RoomSource {
        Arc::new(NullSource::new())
    }

    fn presence_source(&self) -> PresenceSource {
        Arc::new(NullSource::new())
    }
}

/// Explicit registration of each source.
///
/// # Example
///
/// ```
/// use event_sources_runtime::EventSources;
/// use event_sources_runtime::registry::RegistryError;
/// use event_sources_core::{NullSource, SourceName};
/// use std::sync::Arc;
///
/// let incomplete = EventSources::builder()
///     .room(Arc::new(NullSource::new()))
///     .build();
/// assert_eq!(incomplete.err(), Some(RegistryError::MissingSource(SourceName::Presence)));
/// ```
#[derive(Default)]
pub struct EventSourcesBuilder {
    room: Option<RoomSource>,
    presence: Option<PresenceSource>,
    config: EventSourcesConfig,
}

impl EventSourcesBuilder {
    /// Register the room source.
    #[must_use]
    pub fn room(mut self, source: RoomSource) -> Self {
        self.room = Some(source);
        self
    }

    /// Register the presence source.
    #[must_use]
    pub fn presence(mut self, source: PresenceSource) -> Self {
        self.presence = Some(source);
        self
    }

    /// Use `config` instead of [`EventSourcesConfig::default`].
    #[must_use]
    pub fn config(mut self, config: EventSourcesConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the aggregator.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingSource`] naming the first source (in
    /// [`SourceName::ALL`] order) with no registered instance.
    pub fn build(self) -> Result<EventSources, RegistryError> {
        let room = self.room.ok_or(RegistryError::MissingSource(SourceName::Room))?;
        let presence = self
            .presence
            .ok_or(RegistryError::MissingSource(SourceName::Presence))?;

        Ok(EventSources::from_registry(room, presence, self.config))
    }
}

impl std::fmt::Debug for EventSourcesBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcesBuilder")
            .field("room", &self.room.is_some())
            .field("presence", &self.presence.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_reports_room_first() {
        let result = EventSourcesBuilder::default().build();
        assert_eq!(result.err(), Some(RegistryError::MissingSource(SourceName::Room)));
    }

    #[test]
    fn missing_presence_is_reported() {
        let result = EventSourcesBuilder::default()
            .room(NullSources.room_source())
            .build();
        assert_eq!(
            result.err(),
            Some(RegistryError::MissingSource(SourceName::Presence))
        );
    }

    #[test]
    fn complete_registration_builds() {
        let sources = EventSourcesBuilder::default()
            .room(NullSources.room_source())
            .presence(NullSources.presence_source())
            .build()
            .unwrap();
        assert_eq!(sources.source_names(), SourceName::ALL);
    }

    #[test]
    fn error_display_names_source() {
        let error = RegistryError::MissingSource(SourceName::Presence);
        assert_eq!(error.to_string(), "No instance registered for stream source presence");
    }
}
