//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which installs a `tracing` subscriber and logs
//! the lifecycle events of every stream run.
//!
//! # Example
//!
//! ```ignore
//! use rivulet_core_plugins::{TracingFormat, TracingPlugin};
//! use rivulet_stream::StreamExecutor;
//! use tracing::Level;
//!
//! let mut executor = StreamExecutor::new();
//! executor.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! ```

use rivulet_stream::executor::StreamExecutor;
use rivulet_stream::hooks::StreamEvent;
use rivulet_stream::hooks::schedule::{
    OnNodeBlocked, OnNodeExecuted, OnNodeFinished, OnRoundComplete, OnRunComplete, OnRunFailure,
    OnRunStart,
};
use rivulet_stream::plugin::Plugin;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Name under which the lifecycle observer is registered.
pub const OBSERVER_NAME: &str = "rivulet::tracing";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The effective tracing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// On build it installs a global subscriber (unless one is already set) and,
/// unless disabled with [`with_stream_events`](Self::with_stream_events),
/// registers an observer on every run and node schedule. Node events are
/// logged at `debug`, blocked ticks and rounds at `trace`.
///
/// # Environment Filter
///
/// ```ignore
/// TracingPlugin::default().with_env_filter("rivulet_stream=trace,tokio=warn");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    env_filter: Option<String>,
    span_events: bool,
    stream_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
            stream_events: true,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An unparsable filter falls
    /// back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Enables the observer that logs run and node lifecycle events.
    ///
    /// On by default. Disable it to keep only the engine's own logs.
    #[must_use]
    pub fn with_stream_events(mut self, enabled: bool) -> Self {
        self.stream_events = enabled;
        self
    }

    /// The configuration this plugin installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn install_subscriber(&self) {
        let env_filter = match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        };

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init fails if a global subscriber is already set; keep that one.
        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        };

        if installed.is_ok() {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                "TracingPlugin initialized"
            );
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, executor: &mut StreamExecutor) {
        self.install_subscriber();
        if !self.stream_events {
            return;
        }

        let registered = executor.hooks().register_observer::<(
            OnRunStart,
            OnRunComplete,
            OnRunFailure,
            OnRoundComplete,
            OnNodeBlocked,
            OnNodeExecuted,
            OnNodeFinished,
        ), _>(OBSERVER_NAME, log_event);

        if let Err(err) = registered {
            tracing::warn!(error = %err, "TracingPlugin observer not registered");
        }
    }
}

fn log_event(event: &StreamEvent) {
    match event {
        StreamEvent::RunStart { .. } | StreamEvent::RunComplete { .. } => {
            tracing::debug!(%event, "run event");
        }
        StreamEvent::RunFailure { error } => {
            tracing::debug!(%error, "run failed");
        }
        StreamEvent::RoundComplete { round } => tracing::trace!(round, "round complete"),
        StreamEvent::NodeBlocked { label, .. } => tracing::trace!(node = %label, "blocked"),
        StreamEvent::NodeExecuted { label, value, .. } => {
            tracing::debug!(node = %label, ?value, "executed");
        }
        StreamEvent::NodeFinished { label, .. } => tracing::debug!(node = %label, "finished"),
    }
}
