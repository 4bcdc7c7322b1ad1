//! Pipeline runner library: settings registry and lifecycle supervision.

pub mod agent;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use agent::{Agent, AgentError, AgentFactory};
pub use config::Settings;
pub use error::RunnerError;
pub use lifecycle::{LifecycleSupervisor, Runner, ShutdownCoordinator};
