//! Built-in settings catalog.
//!
//! Every setting the runner and the agent read is registered here, once,
//! at process start.

use crate::config::error::SettingsResult;
use crate::config::registry::Settings;
use crate::config::setting::{Setting, SettingType};

/// Default interval between config reload polls, in seconds.
pub const DEFAULT_RELOAD_INTERVAL_SECS: i64 = 3;

/// Default Web API port.
pub const DEFAULT_HTTP_PORT: i64 = 9600;

/// Build a registry holding the full built-in catalog.
pub fn default_settings() -> SettingsResult<Settings> {
    let mut settings = Settings::new();
    for setting in catalog() {
        settings.register(setting)?;
    }
    Ok(settings)
}

fn catalog() -> Vec<Setting> {
    vec![
        Setting::new("node.name", SettingType::String, hostname()),
        Setting::boolean("config.allow_env", false),
        Setting::optional("config.path", SettingType::ExistingPath),
        Setting::optional("config.string", SettingType::String),
        Setting::boolean("config.test", false),
        Setting::boolean("config.auto_reload", false),
        Setting::new("config.reload_interval", SettingType::Numeric, DEFAULT_RELOAD_INTERVAL_SECS),
        Setting::boolean("metric.collect", false),
        Setting::new("pipeline.id", SettingType::String, "main"),
        Setting::new("pipeline.workers", SettingType::Numeric, cpu_cores()),
        Setting::new("pipeline.output.workers", SettingType::Numeric, 1i64),
        Setting::new("pipeline.batch.size", SettingType::Numeric, 125i64),
        // milliseconds
        Setting::new("pipeline.batch.delay", SettingType::Numeric, 5i64),
        Setting::boolean("pipeline.unsafe_shutdown", false),
        Setting::new("plugin.paths", SettingType::StringList, Vec::<String>::new()),
        Setting::optional("ruby_shell", SettingType::String),
        Setting::boolean("debug", false),
        Setting::boolean("debug.config", false),
        Setting::boolean("verbose", false),
        Setting::boolean("quiet", false),
        Setting::boolean("version", false),
        Setting::boolean("help", false),
        Setting::optional("log.path", SettingType::String),
        Setting::new("web_api.http.host", SettingType::String, "127.0.0.1"),
        Setting::new("web_api.http.port", SettingType::Numeric, DEFAULT_HTTP_PORT),
    ]
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn cpu_cores() -> i64 {
    std::thread::available_parallelism()
        .map(|n| n.get() as i64)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::setting::SettingValue;

    #[test]
    fn test_catalog_registers_cleanly() {
        let settings = default_settings().unwrap();
        assert_eq!(settings.len(), 25);
        assert_eq!(settings.get_string("pipeline.id").unwrap(), Some("main"));
        assert_eq!(settings.get_integer("web_api.http.port").unwrap(), Some(9600));
        assert_eq!(settings.get_integer("config.reload_interval").unwrap(), Some(3));
        assert!(settings.get_integer("pipeline.workers").unwrap().unwrap() >= 1);
        assert!(settings.get_value("config.path").unwrap().is_none());
        assert!(settings.get_list("plugin.paths").unwrap().is_empty());
    }

    #[test]
    fn test_catalog_order_is_stable() {
        let settings = default_settings().unwrap();
        let names: Vec<&str> = settings.iter().map(|s| s.name()).collect();
        assert_eq!(names.first(), Some(&"node.name"));
        assert_eq!(names.last(), Some(&"web_api.http.port"));
        assert_eq!(
            settings.get_default("pipeline.batch.delay").unwrap(),
            Some(&SettingValue::from(5i64))
        );
    }
}
