//! Configuration file watcher for automatic reload.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::lifecycle::LifecycleEvent;

/// Polls the pipeline config path and enqueues a reload on change.
pub struct ConfigWatcher {
    path: PathBuf,
    interval: Duration,
    events: mpsc::UnboundedSender<LifecycleEvent>,
}

impl ConfigWatcher {
    /// Create a watcher that feeds the supervisor's event channel.
    pub fn new(path: &Path, interval: Duration, events: mpsc::UnboundedSender<LifecycleEvent>) -> Self {
        Self {
            path: path.to_path_buf(),
            interval,
            events,
        }
    }

    /// Start polling in a background thread. Dropping the returned watcher
    /// stops it.
    pub fn run(self) -> Result<PollWatcher, notify::Error> {
        let tx = self.events.clone();

        let mut watcher = PollWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                        tracing::info!(paths = ?event.paths, "Config change detected, requesting reload");
                        let _ = tx.send(LifecycleEvent::ConfigChanged);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default()
                .with_poll_interval(self.interval)
                .with_compare_contents(true),
        )?;

        let mode = if self.path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&self.path, mode)?;

        tracing::info!(
            path = %self.path.display(),
            interval_secs = self.interval.as_secs_f64(),
            "Config watcher started"
        );
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_change_enqueues_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pipeline.conf");
        std::fs::write(&file, "input { stdin {} }\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watcher = ConfigWatcher::new(&file, Duration::from_millis(50), tx)
            .run()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&file, "input { stdin {} }\noutput { stdout {} }\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no reload event")
            .unwrap();
        assert_eq!(event, LifecycleEvent::ConfigChanged);
    }
}
