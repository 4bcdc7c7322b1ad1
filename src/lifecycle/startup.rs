//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate bound settings and report usage errors
//! - Handle the short-circuit modes (version, config test)
//! - Create the agent, install signal handlers and supervise it
//! - Map every outcome to a process exit code
//!
//! # Design Decisions
//! - Fail fast: any startup error ends the run with exit code 1
//! - The agent is created only after validation passed
//! - Signal handlers and the config watcher are scoped to the run

use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agent::{AgentError, AgentFactory};
use crate::config::validation::{plugin_paths, reload_interval, validate_startup};
use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigLoader, Settings, SettingsResult};
use crate::environment::Environment;
use crate::error::RunnerError;
use crate::lifecycle::shutdown::ShutdownCoordinator;
use crate::lifecycle::signals::SignalListener;
use crate::lifecycle::supervisor::{LifecycleSupervisor, SupervisorOutcome};
use crate::observability::metrics;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Top-level run sequence.
pub struct Runner<F> {
    settings: Arc<Settings>,
    factory: F,
    environment: Environment,
    short_help: String,
}

impl<F: AgentFactory> Runner<F> {
    /// Freeze the bound settings and prepare a run.
    pub fn new(settings: Settings, factory: F) -> Self {
        Self {
            settings: Arc::new(settings),
            factory,
            environment: Environment::default(),
            short_help: String::new(),
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_short_help(mut self, short_help: impl Into<String>) -> Self {
        self.short_help = short_help.into();
        self
    }

    /// Run to completion and return the process exit code.
    pub async fn run(self) -> i32 {
        match self.execute().await {
            Ok(code) => code,
            Err(e) => report_error(&e, &self.short_help),
        }
    }

    async fn execute(&self) -> Result<i32, RunnerError> {
        let settings = &self.settings;
        let policy = ShutdownCoordinator::from_settings(settings)?;

        for path in plugin_paths(settings)? {
            tracing::info!(path = %path.display(), "Plugin path registered");
        }

        if settings.get_bool("version")? {
            for line in version_lines(settings, &self.environment)? {
                println!("{}", line);
            }
            return Ok(EXIT_SUCCESS);
        }

        tracing::debug!("-------- Settings (* means modified) --------");
        for line in settings.format_settings() {
            tracing::debug!("{}", line);
        }
        tracing::debug!("-------- Settings --------");

        validate_startup(settings)?;

        let loader = ConfigLoader::new();
        let config_path = settings.get_path("config.path")?;
        let config_string = settings.get_string("config.string")?;

        if settings.get_bool("config.test")? {
            let verified = loader
                .format_config(config_path, config_string)
                .map_err(AgentError::from)
                .and_then(|config| self.factory.verify_config(&config));
            return Ok(match verified {
                Ok(()) => {
                    println!("Configuration OK");
                    EXIT_SUCCESS
                }
                Err(e) => {
                    tracing::error!(error = %e, "Invalid configuration");
                    EXIT_FAILURE
                }
            });
        }

        if settings.get_bool("metric.collect")? {
            start_metrics(settings)?;
        }

        let agent = self.factory.create(Arc::clone(settings), policy)?;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let _signals = SignalListener::install(events_tx.clone()).map_err(RunnerError::Signals)?;

        let auto_reload = settings.get_bool("config.auto_reload")?;
        let _watcher = match config_path {
            Some(path) if auto_reload => {
                let interval = reload_interval(settings)?;
                Some(ConfigWatcher::new(path, interval, events_tx.clone()).run()?)
            }
            _ => None,
        };
        drop(events_tx);

        // Signals stay routed through the supervisor until cleanup is done.
        let mut supervisor = LifecycleSupervisor::new(agent, policy);
        let result = match supervisor.supervise(&mut events_rx).await {
            SupervisorOutcome::Forced => return Ok(EXIT_FAILURE),
            SupervisorOutcome::Completed(result) => result,
        };
        let finalized = match supervisor.finalize(&mut events_rx).await {
            Some(finalized) => finalized,
            None => return Ok(EXIT_FAILURE),
        };
        if let Err(e) = &finalized {
            tracing::error!(error = %e, "Agent shutdown failed");
        }
        let code = result?;
        finalized?;
        Ok(code)
    }
}

fn start_metrics(settings: &Settings) -> SettingsResult<()> {
    let host = settings.get_string("web_api.http.host")?.unwrap_or("127.0.0.1");
    let port = settings.get_integer("web_api.http.port")?.unwrap_or(0);
    match format!("{}:{}", host, port).parse::<SocketAddr>() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint");
            }
        }
        Err(_) => {
            tracing::error!(host, port, "Failed to parse metrics address");
        }
    }
    Ok(())
}

/// Print a usage error with short help, or log any other error as fatal.
/// Returns the exit code.
pub fn report_error(err: &RunnerError, short_help: &str) -> i32 {
    if err.is_usage() {
        eprintln!("ERROR: {}", err);
        if !short_help.is_empty() {
            println!("{}", short_help);
        }
    } else {
        tracing::error!(
            error = %err,
            kind = err.as_label(),
            cause = ?err.source(),
            "An unexpected error occurred"
        );
    }
    EXIT_FAILURE
}

/// Lines printed for `--version`. Verbose or debug output adds the
/// platform and runtime environment; debug adds the debug topics.
pub fn version_lines(settings: &Settings, environment: &Environment) -> SettingsResult<Vec<String>> {
    let debug = settings.get_bool("debug")?;
    let verbose = settings.get_bool("verbose")?;

    let mut lines = vec![format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))];
    if verbose || debug {
        lines.push(format!("platform {}/{}", std::env::consts::OS, std::env::consts::ARCH));
        lines.push(format!("environment {}", environment.runtime()));
    }
    if debug {
        let topics = environment.debug_topics();
        if topics.is_empty() {
            lines.push("debug topics: none".to_string());
        } else {
            lines.push(format!("debug topics: {}", topics.join(",")));
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_settings;

    #[test]
    fn test_version_lines_by_verbosity() {
        let env = Environment::from_vars(Some("test"), Some("agent"));
        let mut settings = default_settings().unwrap();
        assert_eq!(version_lines(&settings, &env).unwrap().len(), 1);

        settings.set_value("verbose", true).unwrap();
        let lines = version_lines(&settings, &env).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "environment test");

        settings.set_value("debug", true).unwrap();
        let lines = version_lines(&settings, &env).unwrap();
        assert_eq!(lines.last().unwrap(), "debug topics: agent");
    }
}
