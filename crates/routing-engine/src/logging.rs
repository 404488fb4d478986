//! Tracing subscriber installation for the `qroute` binary and embedders
//!
//! The configured level is only the default: `RUST_LOG` directives, when
//! present, take precedence so a single module can be turned up without
//! touching the configuration file.

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogSettings;
use crate::error::{Result, RoutingError};

/// Output encoding of log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Subscriber settings resolved from `[logging]` and command-line overrides
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// Source file and line on every event
    pub source_location: bool,
    /// Enter/exit events for spans such as a routing pass
    pub span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
            source_location: false,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Resolve the `[logging]` section; fails on an unknown level name
    pub fn from_settings(settings: &LogSettings) -> Result<Self> {
        let config = Self::default().with_level(parse_log_level(&settings.level)?);
        Ok(if settings.json { config.json() } else { config })
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn with_source_location(mut self) -> Self {
        self.source_location = true;
        self
    }

    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy()
    }
}

/// Install the global subscriber; events go to stderr so stdout stays
/// reserved for command output
///
/// Fails with a configuration error if a subscriber is already installed.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(config.env_filter())
        .with_span_events(config.span_events())
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| RoutingError::config(format!("cannot install log subscriber: {}", e)))?;

    tracing::debug!(level = %config.level, format = ?config.format, "logging initialised");
    Ok(())
}

/// Parse a level name, case-insensitively
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| RoutingError::config(format!("invalid log level: {}", level)))
}

pub fn log_startup(app_name: &str, version: &str) {
    tracing::info!(app = app_name, version, "starting");
}
