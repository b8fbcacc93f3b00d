//! A stream source that never yields anything.

use crate::event::UserId;
use crate::key::StreamKey;
use crate::pagination::PaginationConfig;
use crate::source::{EventBatch, SourceFuture, StreamSource};
use std::fmt;
use std::marker::PhantomData;

/// This source never yields any events and its cursor stays at zero.
///
/// Useful in tests and wherever a source must be registered for a feature
/// that is switched off. Every operation succeeds immediately and has no side
/// effects:
///
/// - `get_new_events_for_user`: no events, `from_key` echoed back
/// - `get_current_token_part`: [`StreamKey::zero`]
/// - `get_pagination_rows`: no rows, `config.from_token` echoed back
///
/// # Example
///
/// ```
/// use event_sources_core::event::UserId;
/// use event_sources_core::key::PresenceKey;
/// use event_sources_core::null_source::NullSource;
/// use event_sources_core::source::StreamSource;
///
/// # tokio_test::block_on(async {
/// let source = NullSource::<PresenceKey>::new();
/// let user = UserId::new("@alice:example.org");
///
/// let (events, key) = source
///     .get_new_events_for_user(&user, PresenceKey::new(17), 10)
///     .await
///     .unwrap_or_default();
/// assert!(events.is_empty());
/// assert_eq!(key, PresenceKey::new(17));
/// # });
/// ```
pub struct NullSource<K> {
    _key: PhantomData<fn() -> K>,
}

impl<K> NullSource<K> {
    /// Create a new null source.
    #[must_use]
    pub const fn new() -> Self {
        Self { _key: PhantomData }
    }
}

impl<K> Default for NullSource<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Clone for NullSource<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NullSource<K> {}

impl<K> fmt::Debug for NullSource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NullSource")
    }
}

impl<K: StreamKey> StreamSource for NullSource<K> {
    type Key = K;

    fn get_new_events_for_user<'a>(
        &'a self,
        _user: &'a UserId,
        from_key: K,
        _limit: usize,
    ) -> SourceFuture<'a, EventBatch<K>> {
        Box::pin(async move { Ok((Vec::new(), from_key)) })
    }

    fn get_current_token_part(&self) -> SourceFuture<'_, K> {
        Box::pin(async { Ok(K::zero()) })
    }

    fn get_pagination_rows<'a>(
        &'a self,
        _user: &'a UserId,
        config: &'a PaginationConfig<K>,
        _key: Option<&'a str>,
    ) -> SourceFuture<'a, EventBatch<K>> {
        Box::pin(async move { Ok((Vec::new(), config.from_token.clone())) })
    }
}
