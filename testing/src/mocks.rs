//! Stream sources with scripted misbehaviour.

use event_sources_core::{
    EventBatch, PaginationConfig, SourceError, SourceFuture, SourceName, StreamKey, StreamSource,
    UserId,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A source whose backing store is always down.
///
/// Every operation fails with [`SourceError::Unavailable`].
///
/// # Example
///
/// ```
/// use event_sources_testing::FailingSource;
/// use event_sources_core::{EventsKey, SourceError, SourceName, StreamSource};
///
/// # tokio_test::block_on(async {
/// let source = FailingSource::<EventsKey>::new(SourceName::Room, "connection refused");
/// let result = source.get_current_token_part().await;
///
/// assert!(matches!(result, Err(SourceError::Unavailable { name: SourceName::Room, .. })));
/// assert_eq!(source.calls(), 1);
/// # });
/// ```
pub struct FailingSource<K> {
    name: SourceName,
    reason: String,
    calls: Arc<AtomicUsize>,
    _key: PhantomData<fn() -> K>,
}

impl<K> FailingSource<K> {
    /// Create a source that fails with `reason`.
    #[must_use]
    pub fn new(name: SourceName, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            _key: PhantomData,
        }
    }

    /// How many operations have been attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The error every operation returns.
    #[must_use]
    pub fn error(&self) -> SourceError {
        SourceError::Unavailable {
            name: self.name,
            reason: self.reason.clone(),
        }
    }

    fn fail<T: Send + 'static>(&self) -> SourceFuture<'static, T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let error = self.error();
        Box::pin(async move { Err(error) })
    }
}

impl<K> Clone for FailingSource<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            reason: self.reason.clone(),
            calls: Arc::clone(&self.calls),
            _key: PhantomData,
        }
    }
}

impl<K> fmt::Debug for FailingSource<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailingSource")
            .field("name", &self.name)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

impl<K: StreamKey> StreamSource for FailingSource<K> {
    type Key = K;

    fn get_new_events_for_user<'a>(
        &'a self,
        _user: &'a UserId,
        _from_key: K,
        _limit: usize,
    ) -> SourceFuture<'a, EventBatch<K>> {
        self.fail()
    }

    fn get_current_token_part(&self) -> SourceFuture<'_, K> {
        self.fail()
    }

    fn get_pagination_rows<'a>(
        &'a self,
        _user: &'a UserId,
        _config: &'a PaginationConfig<K>,
        _key: Option<&'a str>,
    ) -> SourceFuture<'a, EventBatch<K>> {
        self.fail()
    }
}

/// Wraps a source and answers every operation only after `delay`.
///
/// Uses `tokio::time::sleep`, so tests can run it under a paused clock.
#[derive(Clone, Debug)]
pub struct DelayedSource<S> {
    inner: S,
    delay: Duration,
}

impl<S: StreamSource> DelayedSource<S> {
    /// Delay every operation of `inner` by `delay`.
    #[must_use]
    pub const fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// The wrapped source.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: StreamSource> StreamSource for DelayedSource<S> {
    type Key = S::Key;

    fn get_new_events_for_user<'a>(
        &'a self,
        user: &'a UserId,
        from_key: S::Key,
        limit: usize,
    ) -> SourceFuture<'a, EventBatch<S::Key>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.get_new_events_for_user(user, from_key, limit).await
        })
    }

    fn get_current_token_part(&self) -> SourceFuture<'_, S::Key> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.get_current_token_part().await
        })
    }

    fn get_pagination_rows<'a>(
        &'a self,
        user: &'a UserId,
        config: &'a PaginationConfig<S::Key>,
        key: Option<&'a str>,
    ) -> SourceFuture<'a, EventBatch<S::Key>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.get_pagination_rows(user, config, key).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_sources_core::{NullSource, PresenceKey};

    #[test]
    fn failing_source_counts_every_operation() {
        let source = FailingSource::<PresenceKey>::new(SourceName::Presence, "down");
        let user = UserId::new("@alice:example.org");
        let config = PaginationConfig::new(PresenceKey::new(1));

        let results = tokio_test::block_on(async {
            (
                source.get_current_token_part().await.is_err(),
                source.get_new_events_for_user(&user, PresenceKey::new(0), 5).await.is_err(),
                source.get_pagination_rows(&user, &config, None).await.is_err(),
            )
        });

        assert_eq!(results, (true, true, true));
        assert_eq!(source.calls(), 3);
        assert_eq!(source.clone().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_source_waits_before_answering() {
        let source = DelayedSource::new(NullSource::<PresenceKey>::new(), Duration::from_secs(3));
        let started = tokio::time::Instant::now();

        let key = source.get_current_token_part().await;

        assert_eq!(key, Ok(PresenceKey::new(0)));
        assert!(started.elapsed() >= Duration::from_secs(3));
    }
}
