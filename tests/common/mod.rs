//! Shared mock agents for lifecycle integration tests.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ingest_runner::config::{default_settings, Settings};
use ingest_runner::lifecycle::{ShutdownCoordinator, StopSignal};
use ingest_runner::{Agent, AgentError, AgentFactory};
use tempfile::NamedTempFile;

/// How a [`MockAgent`] behaves once executed.
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub enum Behavior {
    /// Return the code right away.
    Exit(i32),
    /// Wait for a stop request, then return 0.
    StopOnRequest,
    /// Never return, whatever is requested.
    IgnoreStop,
    /// Return a pipeline error right away.
    Fail,
    /// Return 0 right away, then never finish cleanup.
    StallShutdown,
}

#[derive(Default)]
pub struct Counters {
    pub stops: AtomicUsize,
    pub reloads: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

pub struct MockAgent {
    behavior: Behavior,
    pub counters: Arc<Counters>,
}

impl MockAgent {
    #[allow(dead_code)]
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            counters: Arc::new(Counters::default()),
        }
    }
}

#[async_trait]
impl Agent for MockAgent {
    async fn execute(&self, mut stop: StopSignal) -> Result<i32, AgentError> {
        match self.behavior {
            Behavior::Exit(code) => Ok(code),
            Behavior::StallShutdown => Ok(0),
            Behavior::Fail => Err(AgentError::Pipeline("output unreachable".into())),
            Behavior::StopOnRequest => {
                stop.requested().await;
                self.counters.stops.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            }
            Behavior::IgnoreStop => {
                stop.requested().await;
                self.counters.stops.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>().await;
                Ok(0)
            }
        }
    }

    async fn shutdown(&self) -> Result<(), AgentError> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        if let Behavior::StallShutdown = self.behavior {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn reload_state(&self) {
        self.counters.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory that records how often it built an agent.
pub struct MockFactory {
    behavior: Behavior,
    pub created: Arc<AtomicUsize>,
    pub counters: Arc<Counters>,
    pub verified: Arc<Mutex<Vec<String>>>,
}

impl MockFactory {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            created: Arc::new(AtomicUsize::new(0)),
            counters: Arc::new(Counters::default()),
            verified: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl AgentFactory for MockFactory {
    type Agent = MockAgent;

    fn verify_config(&self, config: &str) -> Result<(), AgentError> {
        self.verified.lock().unwrap().push(config.to_string());
        ingest_runner::config::PipelineDefinition::parse(config)?;
        Ok(())
    }

    fn create(&self, _settings: Arc<Settings>, _policy: ShutdownCoordinator) -> Result<Arc<MockAgent>, AgentError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockAgent {
            behavior: self.behavior,
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Catalog registry with the given values bound.
#[allow(dead_code)]
pub fn settings_with(values: &[(&str, ingest_runner::config::SettingValue)]) -> Settings {
    let mut settings = default_settings().unwrap();
    for (name, value) in values {
        settings.set_value(name, value.clone()).unwrap();
    }
    settings
}

/// Pipeline config written to a temporary `.conf` file, removed on drop.
#[allow(dead_code)]
pub fn config_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".conf").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}
