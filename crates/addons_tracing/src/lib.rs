//! Logging setup for addon registration.
//!
//! The library crates only emit `tracing` events. Binaries install a
//! subscriber once at startup with [`TracingConfig::init`].
//!
//! By default the configured level applies to the addon crates
//! ([`ADDON_TARGETS`]) while everything else logs at `warn`, so a
//! `--level debug` run shows import and layer rounds without dependency noise.
//!
//! # Example
//!
//! ```
//! use addons_tracing::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! tracing::debug!(target: "addons_core", "subscriber installed");
//! ```

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Targets that receive the configured level.
pub const ADDON_TARGETS: &[&str] = &["addons_core", "addons_layers", "addons_demo"];

/// Level for every target outside [`ADDON_TARGETS`].
const OTHER_TARGETS: Level = Level::WARN;

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

/// Subscriber configuration.
///
/// A custom filter set with [`with_env_filter`](Self::with_env_filter)
/// replaces the addon-scoped default. One that does not parse falls back to it.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    level: Level,
    format: TracingFormat,
    /// Directives such as `addons_core=trace,addons_layers=off`.
    env_filter: Option<String>,
    /// Log span enter/exit.
    span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level of the addon targets.
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

    /// Replaces the default directives.
    ///
    /// Format: `target=level,target=level,...`
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

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> TracingFormat {
        self.format
    }

    /// Default directives: [`ADDON_TARGETS`] at the configured level, the rest
    /// at `warn`.
    #[must_use]
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directives = OTHER_TARGETS.as_str().to_ascii_lowercase();
        for target in ADDON_TARGETS {
            directives.push_str(&format!(",{target}={level}"));
        }
        directives
    }

    /// Builds the filter `init` installs.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_directives());
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|error| {
                tracing::warn!(
                    %error,
                    directives = directives.as_str(),
                    "ignoring invalid log filter"
                );
                fallback()
            }),
            None => fallback(),
        }
    }

    /// Builds the formatting layer, filter included.
    #[must_use]
    pub fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let fmt = tracing_subscriber::fmt::layer().with_span_events(span_events);

        let formatted = match self.format {
            TracingFormat::Pretty => fmt.pretty().boxed(),
            TracingFormat::Compact => fmt.compact().boxed(),
            TracingFormat::Json => fmt.json().boxed(),
        };
        formatted.with_filter(self.filter()).boxed()
    }

    /// Installs the global subscriber.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init(&self) {
        let installed = tracing_subscriber::registry()
            .with(self.layer())
            .try_init()
            .is_ok();

        tracing::debug!(
            target: "addons_core",
            installed,
            level = %self.level,
            format = ?self.format,
            "tracing initialized"
        );
    }
}
