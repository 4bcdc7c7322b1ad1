//! Top-level error type of the runner.

use thiserror::Error;

use crate::agent::AgentError;
use crate::config::{ConfigError, SettingsError, UsageError};
use crate::observability::logging::LoggingError;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("failed to watch config path: {0}")]
    Watcher(#[from] notify::Error),
}

impl RunnerError {
    /// Usage errors are reported with short help instead of a fatal log.
    pub fn is_usage(&self) -> bool {
        match self {
            RunnerError::Usage(UsageError::Setting(e)) | RunnerError::Settings(e) => {
                matches!(e, SettingsError::InvalidPath { .. } | SettingsError::Type { .. })
            }
            RunnerError::Usage(_) => true,
            RunnerError::Logging(LoggingError::Open { .. }) => true,
            _ => false,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerError::Usage(_) => "usage",
            RunnerError::Settings(_) => "settings",
            RunnerError::Config(_) => "config",
            RunnerError::Agent(_) => "agent",
            RunnerError::Logging(_) => "logging",
            RunnerError::Signals(_) => "signals",
            RunnerError::Watcher(_) => "watcher",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_usage_classification() {
        assert!(RunnerError::from(UsageError::MissingConfiguration).is_usage());

        let invalid_path = SettingsError::InvalidPath {
            name: "config.path".into(),
            path: PathBuf::from("/missing"),
        };
        assert!(RunnerError::from(invalid_path).is_usage());

        let unknown = SettingsError::Unknown("nope".into());
        assert!(!RunnerError::from(unknown).is_usage());
        assert!(!RunnerError::from(AgentError::Pipeline("boom".into())).is_usage());
    }
}
