//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bound settings → Validate → Create agent → Install signals → Supervise
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGHUP → LifecycleEvent → supervisor channel
//!
//! Supervisor (supervisor.rs):
//!     Idle → Starting → Running → Stopping → Terminated
//!     first SIGINT / SIGTERM → request agent stop
//!     second SIGINT → forced termination, agent abandoned
//!     SIGHUP / config change → agent reload
//!     task done → finalize: agent cleanup under the same rules
//!
//! Shutdown (shutdown.rs):
//!     ShutdownCoordinator policy (drain vs. abort) + stop request channel
//! ```
//!
//! # Design Decisions
//! - Signals are queued as typed events; one loop owns all lifecycle state
//! - Stop requests are one-way and never block the loop
//! - Forced termination does not wait for the agent

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod supervisor;

pub use shutdown::{DrainMode, Shutdown, ShutdownCoordinator, StopSignal};
pub use signals::SignalListener;
pub use startup::Runner;
pub use supervisor::{LifecycleState, LifecycleSupervisor, SupervisorOutcome};

/// External events consumed by the supervisor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    HangUp,
    /// The config watcher saw the pipeline config change.
    ConfigChanged,
}

impl LifecycleEvent {
    /// Short stable label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleEvent::Interrupt => "sigint",
            LifecycleEvent::Terminate => "sigterm",
            LifecycleEvent::HangUp => "sighup",
            LifecycleEvent::ConfigChanged => "config_changed",
        }
    }
}
