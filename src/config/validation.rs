//! Startup validation of bound settings.
//!
//! # Responsibilities
//! - Require a pipeline source (`config.path` or `config.string`)
//! - Reject auto reload without a file to watch or with an unusable interval
//! - Bound the pipeline worker count
//! - Check that every plugin path is a directory
//!
//! # Design Decisions
//! - Pure function over the registry; no side effects
//! - Violations are usage errors, reported before any agent exists

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::catalog::DEFAULT_RELOAD_INTERVAL_SECS;
use crate::config::error::SettingsError;
use crate::config::registry::Settings;

/// A problem with how the runner was invoked.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("no configuration given: pass a config file path (-f) or an inline config string (-e)")]
    MissingConfiguration,

    #[error("automatic config reload requires a config file path (-f); an inline string cannot be reloaded")]
    ReloadWithoutConfigPath,

    #[error("plugin path {} is not a directory", .0.display())]
    PluginPathMissing(PathBuf),

    #[error("config reload interval must be a positive number of seconds, got {0}")]
    ReloadInterval(f64),

    #[error("pipeline workers must be between 1 and {MAX_PIPELINE_WORKERS}, got {0}")]
    PipelineWorkers(i64),

    #[error(transparent)]
    Setting(#[from] SettingsError),
}

/// Upper bound on `pipeline.workers`.
pub const MAX_PIPELINE_WORKERS: i64 = 1024;

/// Check the settings needed before an agent may be created.
pub fn validate_startup(settings: &Settings) -> Result<(), UsageError> {
    let has_path = settings.get_value("config.path")?.is_some();
    let has_string = settings.get_value("config.string")?.is_some();

    if !has_path && !has_string {
        return Err(UsageError::MissingConfiguration);
    }
    if settings.get_bool("config.auto_reload")? {
        if !has_path {
            return Err(UsageError::ReloadWithoutConfigPath);
        }
        reload_interval(settings)?;
    }
    if let Some(workers) = settings.get_integer("pipeline.workers")? {
        if !(1..=MAX_PIPELINE_WORKERS).contains(&workers) {
            return Err(UsageError::PipelineWorkers(workers));
        }
    }
    Ok(())
}

/// Poll period of the auto-reload watcher from `config.reload_interval`.
pub fn reload_interval(settings: &Settings) -> Result<Duration, UsageError> {
    let secs = settings
        .get_float("config.reload_interval")?
        .unwrap_or(DEFAULT_RELOAD_INTERVAL_SECS as f64);
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => Err(UsageError::ReloadInterval(secs)),
    }
}

/// Resolve `plugin.paths`, each of which must be an existing directory.
pub fn plugin_paths(settings: &Settings) -> Result<Vec<PathBuf>, UsageError> {
    settings
        .get_list("plugin.paths")?
        .iter()
        .map(PathBuf::from)
        .map(|p| if p.is_dir() { Ok(p) } else { Err(UsageError::PluginPathMissing(p)) })
        .collect()
}
