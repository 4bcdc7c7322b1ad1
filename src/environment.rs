//! Process environment inputs.

use std::fmt;

/// Selects the runtime environment. Defaults to production.
pub const RUNTIME_ENV_VAR: &str = "INGEST_ENV";

/// Comma-separated list of debug topics.
pub const DEBUG_TOPICS_VAR: &str = "DEBUG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    Production,
    Development,
    Test,
    Other(String),
}

impl RuntimeEnvironment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "production" => RuntimeEnvironment::Production,
            "development" => RuntimeEnvironment::Development,
            "test" => RuntimeEnvironment::Test,
            _ => RuntimeEnvironment::Other(value.to_string()),
        }
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEnvironment::Production => f.write_str("production"),
            RuntimeEnvironment::Development => f.write_str("development"),
            RuntimeEnvironment::Test => f.write_str("test"),
            RuntimeEnvironment::Other(name) => f.write_str(name),
        }
    }
}

/// Snapshot of the environment variables the runner consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    runtime: RuntimeEnvironment,
    debug_topics: Vec<String>,
}

impl Environment {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var(RUNTIME_ENV_VAR).ok().as_deref(),
            std::env::var(DEBUG_TOPICS_VAR).ok().as_deref(),
        )
    }

    pub fn from_vars(runtime: Option<&str>, debug_topics: Option<&str>) -> Self {
        Self {
            runtime: RuntimeEnvironment::parse(runtime.unwrap_or_default().trim()),
            debug_topics: debug_topics
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn runtime(&self) -> &RuntimeEnvironment {
        &self.runtime
    }

    pub fn is_production(&self) -> bool {
        self.runtime == RuntimeEnvironment::Production
    }

    pub fn is_development(&self) -> bool {
        self.runtime == RuntimeEnvironment::Development
    }

    pub fn is_test(&self) -> bool {
        self.runtime == RuntimeEnvironment::Test
    }

    pub fn debug_topics(&self) -> &[String] {
        &self.debug_topics
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_vars(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_production() {
        let env = Environment::default();
        assert!(env.is_production());
        assert!(env.debug_topics().is_empty());
    }

    #[test]
    fn test_parse_vars() {
        let env = Environment::from_vars(Some("Development"), Some("ingest_runner::agent, ,tokio"));
        assert!(env.is_development());
        assert_eq!(env.debug_topics(), ["ingest_runner::agent", "tokio"]);

        let env = Environment::from_vars(Some("staging"), None);
        assert_eq!(env.runtime(), &RuntimeEnvironment::Other("staging".into()));
        assert_eq!(env.runtime().to_string(), "staging");
        assert!(!env.is_test());
    }
}
