//! Aggregator configuration.
//!
//! # Example
//!
//! ```rust
//! use event_sources_runtime::config::{EventSourcesConfig, FanOut};
//! use std::time::Duration;
//!
//! let config = EventSourcesConfig::builder()
//!     .fan_out(FanOut::Sequential)
//!     .query_timeout(Duration::from_secs(5))
//!     .max_limit(500)
//!     .build();
//!
//! assert_eq!(config.max_limit, 500);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cap on the `limit` forwarded to a source.
const DEFAULT_MAX_LIMIT: usize = 1000;

/// How a composite request is dispatched to the registered sources.
///
/// Sources do not observe each other, so both modes produce the same result.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanOut {
    /// Query every source at once and join.
    #[default]
    Concurrent,
    /// Query sources one after another in registry order.
    Sequential,
}

/// Configuration for [`EventSources`](crate::EventSources).
///
/// # Default Values
///
/// - `fan_out`: [`FanOut::Concurrent`]
/// - `query_timeout`: none (wait for the source as long as it takes)
/// - `max_limit`: 1000
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSourcesConfig {
    /// Dispatch mode for composite requests
    pub fan_out: FanOut,
    /// Per-source query timeout
    pub query_timeout: Option<Duration>,
    /// Upper bound for `limit` values passed to sources
    pub max_limit: usize,
}

impl Default for EventSourcesConfig {
    fn default() -> Self {
        Self {
            fan_out: FanOut::Concurrent,
            query_timeout: None,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl EventSourcesConfig {
    /// Create a new config builder.
    #[must_use]
    pub const fn builder() -> EventSourcesConfigBuilder {
        EventSourcesConfigBuilder {
            fan_out: None,
            query_timeout: None,
            max_limit: None,
        }
    }

    /// Clamp a caller-supplied limit to `max_limit`.
    #[must_use]
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.min(self.max_limit)
    }
}

/// Builder for [`EventSourcesConfig`].
#[derive(Debug, Clone)]
pub struct EventSourcesConfigBuilder {
    fan_out: Option<FanOut>,
    query_timeout: Option<Duration>,
    max_limit: Option<usize>,
}

impl EventSourcesConfigBuilder {
    /// Set the dispatch mode.
    #[must_use]
    pub const fn fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = Some(fan_out);
        self
    }

    /// Fail a source query with `SourceError::Timeout` after `timeout`.
    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the upper bound for forwarded limits.
    #[must_use]
    pub const fn max_limit(mut self, max_limit: usize) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    /// Build the [`EventSourcesConfig`].
    #[must_use]
    pub fn build(self) -> EventSourcesConfig {
        EventSourcesConfig {
            fan_out: self.fan_out.unwrap_or_default(),
            query_timeout: self.query_timeout,
            max_limit: self.max_limit.unwrap_or(DEFAULT_MAX_LIMIT),
        }
    }
}
