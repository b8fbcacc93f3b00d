//! # Event Sources Testing
//!
//! Test doubles for the stream source contract.
//!
//! This crate provides:
//! - [`InMemoryStreamSource`]: a growable, deterministic source
//! - [`FailingSource`]: a source whose backing store is always down
//! - [`DelayedSource`]: wraps any source and answers late
//! - [`init_test_tracing`]: log output for tests
//!
//! `NullSource` itself lives in `event-sources-core`.
//!
//! ## Example
//!
//! Wiring the doubles into the aggregator, as in an `event-sources-runtime`
//! integration test (this crate does not depend on the runtime):
//!
//! ```ignore
//! use event_sources_core::{EventsKey, PresenceKey, SourceName};
//! use event_sources_runtime::EventSources;
//! use event_sources_testing::{FailingSource, InMemoryStreamSource};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn presence_outage_fails_current_token() {
//!     let sources = EventSources::builder()
//!         .room(Arc::new(InMemoryStreamSource::<EventsKey>::new(SourceName::Room)))
//!         .presence(Arc::new(FailingSource::<PresenceKey>::new(SourceName::Presence, "down")))
//!         .build()
//!         .unwrap();
//!
//!     assert!(sources.get_current_token().await.is_err());
//! }
//! ```

pub mod in_memory;
pub mod mocks;

pub use in_memory::InMemoryStreamSource;
pub use mocks::{DelayedSource, FailingSource};

/// Send `tracing` output to the test harness.
///
/// Honours `RUST_LOG`. Safe to call from every test; only the first call
/// installs a subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
