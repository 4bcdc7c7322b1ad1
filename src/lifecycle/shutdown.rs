//! Shutdown policy and stop-request plumbing.

use std::time::Duration;
use tokio::sync::watch;

use crate::config::{Settings, SettingsResult};

/// Delay before the "still shutting down" warning after a first interrupt.
pub const SLOW_SHUTDOWN_WARNING: Duration = Duration::from_secs(5);

/// How in-flight work is treated when the agent is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    /// Finish in-flight batches before reporting stopped.
    Drain,
    /// Drop in-flight batches immediately.
    Abort,
}

/// Shutdown policy, fixed at startup.
///
/// The agent consults [`ShutdownCoordinator::drain_mode`] when stopping. The
/// supervisor uses [`ShutdownCoordinator::slow_shutdown_warning`] to time the
/// follow-up warning after a first interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownCoordinator {
    unsafe_shutdown: bool,
    slow_shutdown_warning: Duration,
}

impl ShutdownCoordinator {
    pub fn new(unsafe_shutdown: bool) -> Self {
        Self {
            unsafe_shutdown,
            slow_shutdown_warning: SLOW_SHUTDOWN_WARNING,
        }
    }

    /// Read `pipeline.unsafe_shutdown` from the registry.
    pub fn from_settings(settings: &Settings) -> SettingsResult<Self> {
        Ok(Self::new(settings.get_bool("pipeline.unsafe_shutdown")?))
    }

    pub fn with_slow_shutdown_warning(mut self, delay: Duration) -> Self {
        self.slow_shutdown_warning = delay;
        self
    }

    pub fn is_unsafe(&self) -> bool {
        self.unsafe_shutdown
    }

    pub fn drain_mode(&self) -> DrainMode {
        if self.unsafe_shutdown {
            DrainMode::Abort
        } else {
            DrainMode::Drain
        }
    }

    pub fn slow_shutdown_warning(&self) -> Duration {
        self.slow_shutdown_warning
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Sender side of the agent's stop request.
///
/// The request is level-triggered: a [`StopSignal`] created after the
/// trigger still observes it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new stop request channel.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the stop request.
    pub fn subscribe(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Request a stop. Returns `true` only for the first request.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|requested| !std::mem::replace(requested, true))
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver side of the stop request, handed to the agent.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Resolve once a stop has been requested. Also resolves if the
    /// supervisor side is dropped.
    pub async fn requested(&mut self) {
        let _ = self.rx.wait_for(|stop| *stop).await;
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_settings() {
        let mut settings = crate::config::default_settings().unwrap();
        let policy = ShutdownCoordinator::from_settings(&settings).unwrap();
        assert_eq!(policy.drain_mode(), DrainMode::Drain);
        assert_eq!(policy.slow_shutdown_warning(), SLOW_SHUTDOWN_WARNING);

        settings.set_value("pipeline.unsafe_shutdown", true).unwrap();
        let policy = ShutdownCoordinator::from_settings(&settings).unwrap();
        assert!(policy.is_unsafe());
        assert_eq!(policy.drain_mode(), DrainMode::Abort);
    }

    #[test]
    fn test_trigger_reports_first_request_only() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_stop() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let mut stop = shutdown.subscribe();
        assert!(stop.is_requested());
        tokio::time::timeout(Duration::from_secs(1), stop.requested())
            .await
            .expect("stop not observed");
    }
}
