//! Signal-driven supervision of the agent task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::agent::{Agent, AgentError};
use crate::lifecycle::shutdown::{Shutdown, ShutdownCoordinator};
use crate::lifecycle::LifecycleEvent;
use crate::observability::metrics;

/// Supervisor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    Stopping,
    Terminated,
}

/// How supervision ended.
#[derive(Debug)]
pub enum SupervisorOutcome {
    /// The agent task finished on its own or after a stop request.
    Completed(Result<i32, AgentError>),
    /// A second interrupt arrived; the agent task was abandoned.
    Forced,
}

enum Step {
    Continue,
    Force,
}

/// Owns the agent task and arbitrates stop, forced stop and reload.
pub struct LifecycleSupervisor {
    agent: Arc<dyn Agent>,
    policy: ShutdownCoordinator,
    shutdown: Shutdown,
    state: LifecycleState,
    interrupted_once: bool,
    terminated: Arc<AtomicBool>,
}

impl LifecycleSupervisor {
    pub fn new(agent: Arc<dyn Agent>, policy: ShutdownCoordinator) -> Self {
        Self {
            agent,
            policy,
            shutdown: Shutdown::new(),
            state: LifecycleState::Idle,
            interrupted_once: false,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn interrupted_once(&self) -> bool {
        self.interrupted_once
    }

    /// True once a stop has been requested from the agent.
    pub fn stop_requested(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Launch the agent and process events until the task completes or a
    /// forced termination is requested.
    ///
    /// If the event channel closes, supervision continues until the task
    /// completes. A completed run leaves the supervisor in `Stopping` until
    /// [`LifecycleSupervisor::finalize`] has run.
    pub async fn supervise(&mut self, events: &mut mpsc::UnboundedReceiver<LifecycleEvent>) -> SupervisorOutcome {
        self.transition(LifecycleState::Starting);

        let agent = Arc::clone(&self.agent);
        let stop = self.shutdown.subscribe();
        let mut task = tokio::spawn(async move { agent.execute(stop).await });

        self.transition(LifecycleState::Running);

        let mut listening = true;
        let outcome = loop {
            tokio::select! {
                joined = &mut task => break SupervisorOutcome::Completed(flatten(joined)),
                event = events.recv(), if listening => match event {
                    Some(event) => {
                        if let Step::Force = self.handle(event) {
                            break SupervisorOutcome::Forced;
                        }
                    }
                    None => listening = false,
                },
            }
        };

        self.terminated.store(true, Ordering::SeqCst);
        match &outcome {
            SupervisorOutcome::Forced => self.transition(LifecycleState::Terminated),
            SupervisorOutcome::Completed(_) => self.transition(LifecycleState::Stopping),
        }
        outcome
    }

    /// Run the agent's final cleanup while still handling events, so a
    /// second interrupt can cut a stalled cleanup short.
    ///
    /// Returns `None` when termination was forced.
    pub async fn finalize(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<LifecycleEvent>,
    ) -> Option<Result<(), AgentError>> {
        let agent = Arc::clone(&self.agent);
        let mut cleanup = agent.shutdown();

        let mut listening = true;
        let finalized = loop {
            tokio::select! {
                result = &mut cleanup => break Some(result),
                event = events.recv(), if listening => match event {
                    Some(event) => {
                        if let Step::Force = self.handle(event) {
                            break None;
                        }
                    }
                    None => listening = false,
                },
            }
        };

        self.transition(LifecycleState::Terminated);
        finalized
    }

    fn handle(&mut self, event: LifecycleEvent) -> Step {
        metrics::record_signal(event.as_label());

        match event {
            LifecycleEvent::Interrupt if self.interrupted_once => {
                tracing::error!("SIGINT received again, terminating immediately without waiting for the pipeline to drain");
                return Step::Force;
            }
            LifecycleEvent::Interrupt => {
                tracing::warn!("SIGINT received. Shutting down the agent.");
                self.spawn_slow_shutdown_warning();
                self.interrupted_once = true;
                self.request_stop();
            }
            LifecycleEvent::Terminate => {
                tracing::warn!("SIGTERM received. Shutting down the agent.");
                self.request_stop();
            }
            LifecycleEvent::HangUp => {
                tracing::warn!("SIGHUP received. Reloading pipeline configuration.");
                self.agent.reload_state();
            }
            LifecycleEvent::ConfigChanged => {
                tracing::info!("Pipeline configuration changed. Reloading.");
                self.agent.reload_state();
            }
        }
        Step::Continue
    }

    fn request_stop(&mut self) {
        if self.state == LifecycleState::Running {
            self.transition(LifecycleState::Stopping);
        }
        if !self.shutdown.trigger() {
            tracing::debug!("Stop already requested");
        }
    }

    /// Warn if the agent is still running after the grace delay. Runs on its
    /// own task so the event loop never sleeps.
    fn spawn_slow_shutdown_warning(&self) {
        let terminated = Arc::clone(&self.terminated);
        let delay = self.policy.slow_shutdown_warning();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !terminated.load(Ordering::SeqCst) {
                tracing::warn!(
                    waited_secs = delay.as_secs_f64(),
                    "Received shutdown signal, but pipeline is still waiting for in-flight events to be processed. Sending another ^C will force quit, possibly losing data."
                );
            }
        });
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "Lifecycle transition");
        self.state = next;
    }
}

fn flatten(joined: Result<Result<i32, AgentError>, JoinError>) -> Result<i32, AgentError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(AgentError::Panicked(e.to_string())),
        Err(e) => Err(AgentError::Aborted(e.to_string())),
    }
}
