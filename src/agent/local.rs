//! In-process agent hosting a single pipeline's worker tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::agent::{Agent, AgentError, AgentFactory};
use crate::config::{ConfigLoader, PipelineDefinition, Settings};
use crate::lifecycle::{DrainMode, ShutdownCoordinator, StopSignal};
use crate::observability::metrics;

/// Creates [`LocalAgent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAgentFactory;

impl AgentFactory for LocalAgentFactory {
    type Agent = LocalAgent;

    fn verify_config(&self, config: &str) -> Result<(), AgentError> {
        PipelineDefinition::parse(config)?;
        Ok(())
    }

    fn create(&self, settings: Arc<Settings>, policy: ShutdownCoordinator) -> Result<Arc<LocalAgent>, AgentError> {
        Ok(Arc::new(LocalAgent::new(settings, policy)?))
    }
}

/// Agent that runs the `pipeline.id` pipeline with `pipeline.workers`
/// worker tasks, each taking a batch every `pipeline.batch.delay` ms.
pub struct LocalAgent {
    inner: Arc<Inner>,
    policy: ShutdownCoordinator,
    workers: usize,
    batch_delay: Duration,
}

struct Inner {
    settings: Arc<Settings>,
    loader: ConfigLoader,
    pipeline_id: String,
    definition: ArcSwapOption<PipelineDefinition>,
    batches: Arc<AtomicU64>,
    reloads: AtomicU64,
    shut_down: AtomicBool,
}

impl LocalAgent {
    pub fn new(settings: Arc<Settings>, policy: ShutdownCoordinator) -> Result<Self, AgentError> {
        let pipeline_id = settings.get_string("pipeline.id")?.unwrap_or("main").to_string();
        let workers = settings.get_integer("pipeline.workers")?.unwrap_or(1).max(1) as usize;
        let delay_ms = settings.get_integer("pipeline.batch.delay")?.unwrap_or(5).max(1) as u64;

        Ok(Self {
            inner: Arc::new(Inner {
                settings,
                loader: ConfigLoader::new(),
                pipeline_id,
                definition: ArcSwapOption::empty(),
                batches: Arc::new(AtomicU64::new(0)),
                reloads: AtomicU64::new(0),
                shut_down: AtomicBool::new(false),
            }),
            policy,
            workers,
            batch_delay: Duration::from_millis(delay_ms),
        })
    }

    /// The active pipeline definition, once loaded.
    pub fn definition(&self) -> Option<Arc<PipelineDefinition>> {
        self.inner.definition.load_full()
    }

    pub fn batches_processed(&self) -> u64 {
        self.inner.batches.load(Ordering::Relaxed)
    }

    /// Number of completed reload attempts, successful or not.
    pub fn reload_count(&self) -> u64 {
        self.inner.reloads.load(Ordering::SeqCst)
    }
}

impl Inner {
    fn load_definition(&self) -> Result<PipelineDefinition, AgentError> {
        let text = self.loader.format_config(
            self.settings.get_path("config.path")?,
            self.settings.get_string("config.string")?,
        )?;
        if self.settings.get_bool("debug.config")? {
            tracing::debug!(pipeline_id = %self.pipeline_id, config = %text, "Pipeline configuration");
        }
        Ok(PipelineDefinition::parse(&text)?)
    }

    fn reload(&self) {
        match self.load_definition() {
            Ok(def) => {
                tracing::info!(
                    pipeline_id = %self.pipeline_id,
                    plugins = def.plugin_count(),
                    "Pipeline definition reloaded"
                );
                self.definition.store(Some(Arc::new(def)));
                metrics::record_reload(true);
            }
            Err(e) => {
                tracing::error!(
                    pipeline_id = %self.pipeline_id,
                    error = %e,
                    "Failed to reload pipeline. Keeping current definition."
                );
                metrics::record_reload(false);
            }
        }
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Agent for LocalAgent {
    async fn execute(&self, mut stop: StopSignal) -> Result<i32, AgentError> {
        let def = self.inner.load_definition()?;
        tracing::info!(
            pipeline_id = %self.inner.pipeline_id,
            inputs = ?def.inputs,
            filters = ?def.filters,
            outputs = ?def.outputs,
            workers = self.workers,
            batch_delay_ms = self.batch_delay.as_millis() as u64,
            "Pipeline started"
        );
        self.inner.definition.store(Some(Arc::new(def)));

        let mut workers = JoinSet::new();
        for worker in 0..self.workers {
            let mut stop = stop.clone();
            let batches = Arc::clone(&self.inner.batches);
            let pipeline_id = self.inner.pipeline_id.clone();
            let mut ticker = tokio::time::interval(self.batch_delay);

            workers.spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.requested() => break,
                        _ = ticker.tick() => {
                            batches.fetch_add(1, Ordering::Relaxed);
                            metrics::record_batch(&pipeline_id);
                        }
                    }
                }
                tracing::debug!(worker, "Pipeline worker stopped");
            });
        }

        stop.requested().await;

        match self.policy.drain_mode() {
            DrainMode::Drain => {
                tracing::info!(pipeline_id = %self.inner.pipeline_id, "Draining in-flight batches");
                while let Some(joined) = workers.join_next().await {
                    if let Err(e) = joined {
                        tracing::warn!(error = %e, "Pipeline worker failed during drain");
                    }
                }
            }
            DrainMode::Abort => {
                tracing::warn!(pipeline_id = %self.inner.pipeline_id, "Unsafe shutdown, dropping in-flight batches");
                workers.shutdown().await;
            }
        }

        tracing::info!(
            pipeline_id = %self.inner.pipeline_id,
            batches = self.batches_processed(),
            "Pipeline stopped"
        );
        Ok(0)
    }

    async fn shutdown(&self) -> Result<(), AgentError> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!(batches = self.batches_processed(), "Agent shut down");
        Ok(())
    }

    fn reload_state(&self) {
        let inner = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || inner.reload());
            }
            Err(_) => inner.reload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    fn settings(config: &str, unsafe_shutdown: bool) -> Arc<Settings> {
        let mut s = crate::config::default_settings().unwrap();
        s.set_value("config.string", config).unwrap();
        s.set_value("pipeline.workers", 2i64).unwrap();
        s.set_value("pipeline.batch.delay", 1i64).unwrap();
        s.set_value("pipeline.unsafe_shutdown", unsafe_shutdown).unwrap();
        Arc::new(s)
    }

    async fn run_until_stopped(unsafe_shutdown: bool) -> (Arc<LocalAgent>, Result<i32, AgentError>) {
        let settings = settings("input { generator {} }", unsafe_shutdown);
        let policy = ShutdownCoordinator::from_settings(&settings).unwrap();
        let agent = LocalAgentFactory.create(settings, policy).unwrap();

        let shutdown = Shutdown::new();
        let task = {
            let agent = Arc::clone(&agent);
            let stop = shutdown.subscribe();
            tokio::spawn(async move { agent.execute(stop).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("agent did not stop")
            .unwrap();
        (agent, result)
    }

    #[tokio::test]
    async fn test_graceful_stop_drains() {
        let (agent, result) = run_until_stopped(false).await;
        assert_eq!(result.unwrap(), 0);
        assert!(agent.batches_processed() > 0);

        let def = agent.definition().unwrap();
        assert_eq!(def.inputs, vec!["generator"]);
        assert_eq!(def.outputs, vec!["stdout"]);
    }

    #[tokio::test]
    async fn test_unsafe_stop_aborts() {
        let (agent, result) = run_until_stopped(true).await;
        assert_eq!(result.unwrap(), 0);
        agent.shutdown().await.unwrap();
        agent.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_fails_execute() {
        let settings = settings("input { stdin {", false);
        let agent = LocalAgent::new(settings, ShutdownCoordinator::default()).unwrap();
        let err = agent.execute(Shutdown::new().subscribe()).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_failed_reload_keeps_definition() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pipeline.conf");
        std::fs::write(&file, "input { stdin {} } output { stdout {} }").unwrap();

        let mut s = crate::config::default_settings().unwrap();
        s.set_value("config.path", file.clone()).unwrap();
        let agent = LocalAgent::new(Arc::new(s), ShutdownCoordinator::default()).unwrap();

        // No runtime here, so the reload runs inline.
        agent.reload_state();
        assert_eq!(agent.reload_count(), 1);
        assert_eq!(agent.definition().unwrap().inputs, vec!["stdin"]);

        std::fs::write(&file, "input { stdin { ").unwrap();
        agent.reload_state();
        assert_eq!(agent.reload_count(), 2);
        assert_eq!(agent.definition().unwrap().outputs, vec!["stdout"]);

        std::fs::write(&file, "input { generator {} } output { null {} }").unwrap();
        agent.reload_state();
        assert_eq!(agent.definition().unwrap().outputs, vec!["null"]);
    }
}
