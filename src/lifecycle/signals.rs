//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT, SIGTERM and SIGHUP
//! - Translate each delivery into a [`LifecycleEvent`] on the supervisor channel
//! - Stop forwarding when the listener is dropped
//!
//! # Limitations
//! - Dropping the listener stops forwarding but does not restore the default
//!   OS disposition: Tokio keeps its handlers registered for the life of the
//!   process, so later deliveries are caught and discarded
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe, no work in the raw handler)
//! - Forwarding never blocks: the channel is unbounded
//! - Escalation logic lives in the supervisor, not here

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::LifecycleEvent;

/// Scoped signal subscription. Dropping it ends forwarding on every exit
/// path; the handlers themselves stay registered with the OS.
#[derive(Debug)]
pub struct SignalListener {
    task: JoinHandle<()>,
}

impl SignalListener {
    /// Install the handlers. Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn install(events: mpsc::UnboundedSender<LifecycleEvent>) -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sighup = signal(SignalKind::hangup())?;

        let task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    Some(()) = sigint.recv() => LifecycleEvent::Interrupt,
                    Some(()) = sigterm.recv() => LifecycleEvent::Terminate,
                    Some(()) = sighup.recv() => LifecycleEvent::HangUp,
                    else => break,
                };
                if !forward(&events, event) {
                    break;
                }
            }
        });

        tracing::debug!("Signal handlers installed (SIGINT, SIGTERM, SIGHUP)");
        Ok(Self { task })
    }

    /// Install the handlers. Only Ctrl-C is available off Unix.
    #[cfg(not(unix))]
    pub fn install(events: mpsc::UnboundedSender<LifecycleEvent>) -> std::io::Result<Self> {
        let task = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !forward(&events, LifecycleEvent::Interrupt) {
                    break;
                }
            }
        });

        tracing::debug!("Signal handlers installed (Ctrl-C)");
        Ok(Self { task })
    }
}

fn forward(events: &mpsc::UnboundedSender<LifecycleEvent>, event: LifecycleEvent) -> bool {
    tracing::debug!(signal = event.as_label(), "Signal received");
    events.send(event).is_ok()
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("Signal forwarding stopped");
    }
}
