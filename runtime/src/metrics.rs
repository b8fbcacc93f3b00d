//! Prometheus metrics for the aggregator.
//!
//! Metrics are recorded through the `metrics` facade and are no-ops until a
//! recorder is installed. [`MetricsServer`] installs the Prometheus one.
//!
//! # Example
//!
//! ```rust,no_run
//! use event_sources_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! if let Some(rendered) = server.render() {
//!     println!("{rendered}");
//! }
//! # Ok(())
//! # }
//! ```

use event_sources_core::SourceName;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics recorder.
///
/// Installs the Prometheus recorder but binds no listener. The host serves
/// the output of [`render`](Self::render) from its own HTTP endpoint; `addr`
/// is the address it advertises and is only logged here.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe every metric and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// Only one recorder can be installed per process. A second call (common
    /// in tests) logs a warning and leaves `handle()` as `None`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Address the host serves rendered metrics on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_histogram!(
        "event_sources_current_token_duration_seconds",
        "Time taken to compose the current stream token"
    );
    describe_counter!(
        "event_sources_source_queries_total",
        "Total number of queries issued to stream sources"
    );
    describe_counter!(
        "event_sources_source_failures_total",
        "Total number of failed stream source queries"
    );
    describe_counter!(
        "event_sources_new_events_total",
        "Total number of new events returned to users"
    );
}

/// Stream source metrics recorder.
pub struct SourceMetrics;

impl SourceMetrics {
    /// Record a query issued to `source`.
    pub fn record_query(source: SourceName) {
        counter!("event_sources_source_queries_total", "source" => source.as_str()).increment(1);
    }

    /// Record a failed query to `source`.
    pub fn record_failure(source: SourceName) {
        counter!("event_sources_source_failures_total", "source" => source.as_str()).increment(1);
    }

    /// Record events delivered from `source`.
    pub fn record_new_events(source: SourceName, count: usize) {
        counter!("event_sources_new_events_total", "source" => source.as_str())
            .increment(count as u64);
    }
}

/// Composite token metrics recorder.
pub struct TokenMetrics;

impl TokenMetrics {
    /// Record how long composing the current token took.
    pub fn record_current_token(duration: Duration) {
        histogram!("event_sources_current_token_duration_seconds").record(duration.as_secs_f64());
    }
}
