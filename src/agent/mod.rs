//! Agent boundary.
//!
//! The agent runs the configured pipelines. The lifecycle subsystem only
//! sees it through [`Agent`] and [`AgentFactory`]:
//!
//! ```text
//! Runner      → AgentFactory::verify_config   (config test mode)
//! Runner      → AgentFactory::create          (after validation)
//! Supervisor  → Agent::execute                (spawned task)
//! Supervisor  → Agent::reload_state           (SIGHUP / config change)
//! Runner      → Agent::shutdown               (after the task completes)
//! ```

pub mod local;

use std::sync::Arc;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ConfigError, Settings, SettingsError};
use crate::lifecycle::{ShutdownCoordinator, StopSignal};

pub use local::{LocalAgent, LocalAgentFactory};

/// Errors raised by an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("agent task panicked: {0}")]
    Panicked(String),

    #[error("agent task aborted: {0}")]
    Aborted(String),
}

/// A running agent as seen by the supervisor.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run until the pipelines finish or `stop` is requested. Returns the
    /// process exit code.
    async fn execute(&self, stop: StopSignal) -> Result<i32, AgentError>;

    /// Final cleanup after `execute` returned. Called once on every
    /// non-forced exit.
    async fn shutdown(&self) -> Result<(), AgentError>;

    /// Request a configuration reload. Must not block.
    fn reload_state(&self);
}

/// Builds agents once startup validation has passed.
pub trait AgentFactory {
    type Agent: Agent + 'static;

    /// Check pipeline configuration text without running it.
    fn verify_config(&self, config: &str) -> Result<(), AgentError>;

    fn create(&self, settings: Arc<Settings>, policy: ShutdownCoordinator) -> Result<Arc<Self::Agent>, AgentError>;
}
