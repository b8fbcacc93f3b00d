//! # Event Sources Core
//!
//! The stream source contract and composite stream tokens.
//!
//! A client follows several independently advancing event streams (room
//! activity, presence changes) through a single cursor, the [`StreamToken`].
//! This crate defines:
//!
//! - **[`StreamSource`]**: the three operations every event source provides
//! - **[`NullSource`]**: a source with no events whose cursor stays at zero
//! - **[`StreamToken`]**: one cursor per registered source, immutable
//! - **[`SourceName`]**: the closed set of registered sources
//!
//! The aggregator that fans requests out to every source lives in
//! `event-sources-runtime`.
//!
//! ## Example
//!
//! ```
//! use event_sources_core::{EventsKey, NullSource, PresenceKey, StreamSource, StreamToken};
//!
//! # tokio_test::block_on(async {
//! let room = NullSource::<EventsKey>::new();
//! let presence = NullSource::<PresenceKey>::new();
//!
//! let token = StreamToken::new(
//!     room.get_current_token_part().await.unwrap_or_default(),
//!     presence.get_current_token_part().await.unwrap_or_default(),
//! );
//! assert_eq!(token, StreamToken::START);
//! # });
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod event;
pub mod key;
pub mod null_source;
pub mod pagination;
pub mod source;
pub mod token;

pub use event::{StreamEvent, UserId};
pub use key::{EventsKey, OrderedKey, PresenceKey, StreamKey};
pub use null_source::NullSource;
pub use pagination::{Direction, PaginationConfig};
pub use source::{
    EventBatch, ParseSourceNameError, SourceError, SourceFuture, SourceName, StreamSource,
};
pub use token::{StreamToken, TokenPart};
