//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from bound settings
//! - Route records to stdout or to `log.path`
//! - Enable per-topic debug output from the `DEBUG` environment list
//!
//! # Design Decisions
//! - `quiet` > `verbose` > `debug` > default (warn) when several are set
//! - `RUST_LOG` overrides the computed filter
//! - With a log file, stdout keeps only errors

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{Settings, SettingsResult};
use crate::environment::Environment;

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Logging options derived from settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingOptions {
    pub level: LevelFilter,
    pub log_path: Option<PathBuf>,
    pub debug_config: bool,
}

impl LoggingOptions {
    pub fn from_settings(settings: &Settings) -> SettingsResult<Self> {
        Ok(Self {
            level: level_for(
                settings.get_bool("quiet")?,
                settings.get_bool("verbose")?,
                settings.get_bool("debug")?,
            ),
            log_path: settings.get_string("log.path")?.map(PathBuf::from),
            debug_config: settings.get_bool("debug.config")?,
        })
    }

    /// `debug.config` only has an effect at debug level.
    pub fn config_dump_dropped(&self) -> bool {
        self.debug_config && self.level != LevelFilter::DEBUG
    }
}

/// Log level for the verbosity flags.
pub fn level_for(quiet: bool, verbose: bool, debug: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else if verbose {
        LevelFilter::INFO
    } else if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

/// Build the filter: `RUST_LOG` if set, else the level plus one
/// `<topic>=debug` directive per debug topic.
pub fn build_filter(level: LevelFilter, topics: &[String]) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        topics.iter().fold(EnvFilter::new(level.to_string()), |filter, topic| {
            match format!("{}=debug", topic).parse::<Directive>() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            }
        })
    })
}

/// Install the global subscriber.
pub fn init_logging(options: &LoggingOptions, environment: &Environment) -> Result<(), LoggingError> {
    let filter = build_filter(options.level, environment.debug_topics());

    match &options.log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Open {
                    path: path.clone(),
                    source,
                })?;

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_filter(filter),
                )
                .with(fmt::layer().with_filter(LevelFilter::ERROR))
                .try_init()?;

            println!("Sending logs to {}.", path.display());
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .try_init()?;
        }
    }

    if options.config_dump_dropped() {
        tracing::warn!("--debug.config was specified, but log level was not set to --debug! No config info will be logged.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_precedence() {
        assert_eq!(level_for(false, false, false), LevelFilter::WARN);
        assert_eq!(level_for(false, false, true), LevelFilter::DEBUG);
        assert_eq!(level_for(false, true, true), LevelFilter::INFO);
        assert_eq!(level_for(true, true, true), LevelFilter::ERROR);
    }

    #[test]
    fn test_debug_config_without_debug_is_flagged() {
        let mut settings = crate::config::default_settings().unwrap();
        settings.set_value("debug.config", true).unwrap();
        let options = LoggingOptions::from_settings(&settings).unwrap();
        assert!(options.config_dump_dropped());

        settings.set_value("debug", true).unwrap();
        let options = LoggingOptions::from_settings(&settings).unwrap();
        assert!(!options.config_dump_dropped());
    }

    #[test]
    fn test_log_path_from_settings() {
        let mut settings = crate::config::default_settings().unwrap();
        assert_eq!(LoggingOptions::from_settings(&settings).unwrap().log_path, None);

        settings.set_value("log.path", "/var/log/ingest.log").unwrap();
        let options = LoggingOptions::from_settings(&settings).unwrap();
        assert_eq!(options.log_path, Some(PathBuf::from("/var/log/ingest.log")));
    }
}
