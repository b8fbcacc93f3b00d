//! # Event Sources Runtime
//!
//! The aggregator that lets a single [`StreamToken`] stand for progress across
//! several independently advancing event streams.
//!
//! ## Core Components
//!
//! - **[`EventSources`]**: owns one source per registered name, composes
//!   their cursors and fans requests out to them
//! - **Registry**: how sources get built ([`SourceFactory`](registry::SourceFactory))
//!   or registered ([`EventSourcesBuilder`](registry::EventSourcesBuilder))
//! - **Config**: fan-out mode, query timeout, limit cap
//!
//! ## Example
//!
//! ```
//! use event_sources_runtime::EventSources;
//! use event_sources_core::{NullSource, StreamToken, UserId};
//! use std::sync::Arc;
//!
//! # let result = tokio_test::block_on(async {
//! let sources = EventSources::builder()
//!     .room(Arc::new(NullSource::new()))
//!     .presence(Arc::new(NullSource::new()))
//!     .build()
//!     .map_err(|e| e.to_string())?;
//!
//! let token = sources.get_current_token().await.map_err(|e| e.to_string())?;
//! let events = sources
//!     .get_new_events_for_user(&UserId::new("@alice:example.org"), token, 10)
//!     .await
//!     .map_err(|e| e.to_string())?;
//!
//! assert!(events.is_empty());
//! assert_eq!(events.end, StreamToken::START);
//! # Ok::<(), String>(())
//! # });
//! # assert_eq!(result, Ok(()));
//! ```
//!
//! [`StreamToken`]: event_sources_core::StreamToken

/// Aggregator configuration
pub mod config;

/// Prometheus metrics for observability
pub mod metrics;

/// Source registry and factories
pub mod registry;

mod sources;

pub use config::{EventSourcesConfig, FanOut};
pub use registry::{RegistryError, SourceFactory};
pub use sources::{EventSources, NewEvents};
