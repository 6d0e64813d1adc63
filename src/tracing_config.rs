//! Tracing configuration for the CLI
//!
//! The library only emits events; the binary installs the subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// How events are rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Coloured, for interactive terminals
    Console,
    /// Plain text without ANSI codes, for pipes and CI logs
    Compact,
    /// One JSON object per event
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Subscriber settings for the `inkflow` binary
#[derive(Debug)]
pub struct TracingConfig {
    /// Number of `-v` flags
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Explicit filter directive, takes precedence over `verbosity`
    pub env_filter: Option<String>,
    /// Logged once at startup so a run's events can be grouped
    pub session_id: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Console,
            env_filter: None,
            session_id: None,
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Filter directive for the configured verbosity
    ///
    /// Dependencies (reqwest, hyper) stay at `warn` until `-vvv`.
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn,inkflow_studio=info",
            1 => "warn,inkflow_studio=debug",
            2 => "warn,inkflow_studio=trace",
            _ => "trace",
        }
    }

    /// Install the global subscriber
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let filter = match &self.env_filter {
            Some(env_filter) => EnvFilter::try_new(env_filter)?,
            None => EnvFilter::try_new(self.verbosity_to_filter())?,
        };

        let registry = Registry::default().with(filter);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            TracingFormat::Compact => {
                let fmt_layer = fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr);
                registry.with(fmt_layer).try_init()?;
            },
        }

        if let Some(session_id) = &self.session_id {
            tracing::debug!(session_id = %session_id, "Studio session started");
        }

        Ok(())
    }
}

/// Install tracing for a CLI run
pub fn init_cli_tracing(verbosity: u8, json: bool) -> anyhow::Result<()> {
    let format = if json {
        #[cfg(feature = "tracing-json")]
        {
            TracingFormat::Json
        }
        #[cfg(not(feature = "tracing-json"))]
        {
            TracingFormat::Compact
        }
    } else {
        TracingFormat::Console
    };

    let mut config = TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .with_session_id(uuid::Uuid::new_v4().to_string());

    // RUST_LOG wins over -v when set
    if let Ok(filter) = std::env::var("RUST_LOG") {
        if !filter.trim().is_empty() {
            config = config.with_env_filter(filter);
        }
    }
    config.init()
}

/// Spans opened by the CLI
pub mod spans {
    use tracing::{Level, Span};

    /// Span covering one CLI command
    pub fn command(name: &str) -> Span {
        tracing::span!(Level::INFO, "command", name = %name)
    }

    /// Span for a call into the design service
    pub fn service_call(service: &str, operation: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "service_call",
            service = %service,
            operation = %operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_mapping() {
        let filter = |v| TracingConfig::new().with_verbosity(v).verbosity_to_filter();
        assert_eq!(filter(0), "warn,inkflow_studio=info");
        assert_eq!(filter(1), "warn,inkflow_studio=debug");
        assert_eq!(filter(2), "warn,inkflow_studio=trace");
        assert_eq!(filter(7), "trace");
    }

    #[test]
    fn test_config_builder() {
        let config = TracingConfig::new()
            .with_verbosity(2)
            .with_format(TracingFormat::Compact)
            .with_env_filter("inkflow_studio=trace")
            .with_session_id("test-session");

        assert_eq!(config.verbosity, 2);
        assert_eq!(config.format, TracingFormat::Compact);
        assert_eq!(config.env_filter.as_deref(), Some("inkflow_studio=trace"));
        assert_eq!(config.session_id.as_deref(), Some("test-session"));
    }

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.format, TracingFormat::Console);
        assert!(config.env_filter.is_none());
    }
}
