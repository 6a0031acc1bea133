// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging configuration for the Dremio Flight ADBC driver.
//!
//! A single `tracing-subscriber` is installed per process, writing to a file
//! or to stderr.
//!
//! The filter comes from the first of these that is usable:
//!
//! 1. the `dremio.log_level` ADBC option, scoped to this crate (`off` disables
//!    logging altogether)
//! 2. the `RUST_LOG` environment variable, used as a full directive list
//! 3. `dremio_flight_adbc=warn`
//!
//! ## Usage
//!
//! ```bash
//! # Via environment variable
//! RUST_LOG=dremio_flight_adbc=debug ./my_adbc_app
//! ```
//!
//! Or programmatically via ADBC options:
//! ```ignore
//! database.set_option(OptionDatabase::Other("dremio.log_level".into()), "debug".into())?;
//! database.set_option(OptionDatabase::Other("dremio.log_file".into()), "/tmp/adbc.log".into())?;
//! ```

use std::fs::OpenOptions;
use std::sync::{Mutex, OnceLock};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, time::SystemTime, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_TARGET: &str = "dremio_flight_adbc";

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging configuration passed via ADBC database options.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogConfig {
    /// Log level: "OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE".
    pub level: Option<String>,
    /// Log file path. If unset, logs go to stderr.
    pub file: Option<String>,
}

impl LogConfig {
    /// Parse a level name, ignoring case and surrounding whitespace.
    pub fn parse_level(level: &str) -> Option<LevelFilter> {
        let level = level.trim();
        if level.is_empty() {
            return None;
        }
        level.parse().ok()
    }

    /// Resolve the filter directive given the current `RUST_LOG` value.
    ///
    /// Returns `None` when logging is switched off.
    pub fn resolve_filter(&self, rust_log: Option<&str>) -> Option<String> {
        if let Some(level) = self.level.as_deref().and_then(Self::parse_level) {
            if level == LevelFilter::OFF {
                return None;
            }
            return Some(format!("{}={}", LOG_TARGET, level));
        }
        let directive = rust_log
            .map(str::trim)
            .filter(|d| !d.is_empty() && EnvFilter::try_new(d).is_ok())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}=warn", LOG_TARGET));
        Some(directive)
    }

    fn make_writer(&self) -> std::io::Result<BoxMakeWriter> {
        match self.file {
            Some(ref path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(std::io::stderr)),
        }
    }
}

/// Install the subscriber for this process.
///
/// Only the first call has any effect; the first `Database::new_connection()`
/// decides the configuration.
pub(crate) fn init_logging(config: &LogConfig) {
    LOGGING_INITIALIZED.get_or_init(|| {
        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let Some(directive) = config.resolve_filter(rust_log.as_deref()) else {
            return;
        };
        let writer = match config.make_writer() {
            Ok(writer) => writer,
            Err(e) => {
                eprintln!("dremio-flight-adbc: failed to open log file: {}", e);
                return;
            }
        };

        tracing_subscriber::registry()
            .with(EnvFilter::new(directive))
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(false)
                    .with_ansi(config.file.is_none())
                    .with_timer(SystemTime),
            )
            .try_init()
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_level(level: &str) -> LogConfig {
        LogConfig {
            level: Some(level.to_string()),
            file: None,
        }
    }

    #[test]
    fn test_option_level_beats_rust_log() {
        let filter = with_level(" DEBUG ").resolve_filter(Some("hyper=trace"));
        assert_eq!(filter.as_deref(), Some("dremio_flight_adbc=debug"));
    }

    #[test]
    fn test_rust_log_used_without_option() {
        let config = LogConfig::default();
        assert_eq!(
            config.resolve_filter(Some("dremio_flight_adbc=info,tonic=debug")).as_deref(),
            Some("dremio_flight_adbc=info,tonic=debug")
        );
        assert_eq!(
            config.resolve_filter(None).as_deref(),
            Some("dremio_flight_adbc=warn")
        );
        assert_eq!(
            config.resolve_filter(Some("  ")).as_deref(),
            Some("dremio_flight_adbc=warn")
        );
    }

    #[test]
    fn test_unparseable_level_falls_through() {
        assert_eq!(
            with_level("chatty").resolve_filter(Some("info")).as_deref(),
            Some("info")
        );
        assert_eq!(
            LogConfig::default().resolve_filter(Some("=[")).as_deref(),
            Some("dremio_flight_adbc=warn")
        );
    }

    #[test]
    fn test_off_disables_logging() {
        assert!(with_level("off").resolve_filter(Some("trace")).is_none());
        assert_eq!(LogConfig::parse_level("Off"), Some(LevelFilter::OFF));
        assert_eq!(LogConfig::parse_level("trace"), Some(LevelFilter::TRACE));
        assert_eq!(LogConfig::parse_level("loud"), None);
        assert_eq!(LogConfig::parse_level(""), None);
    }

    #[test]
    fn test_make_writer_reports_unopenable_file() {
        let config = LogConfig {
            level: None,
            file: Some("/nonexistent-dir/dremio/adbc.log".to_string()),
        };
        assert!(config.make_writer().is_err());
        assert!(LogConfig::default().make_writer().is_ok());
    }
}
