//! Command-line flags and their binding into the settings registry.

use std::path::PathBuf;
use clap::{CommandFactory, Parser};

use crate::config::{Settings, SettingsResult};

/// Runs a data pipeline under signal-driven supervision.
#[derive(Debug, Default, Parser)]
#[command(name = "ingest-runner", disable_version_flag = true)]
pub struct Cli {
    /// Name of this node
    #[arg(short = 'n', long = "node.name", value_name = "NAME")]
    pub node_name: Option<String>,

    /// Load the pipeline config from a file or a directory of files
    #[arg(short = 'f', long = "config.path", value_name = "CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Use the given string as the pipeline config
    #[arg(short = 'e', long = "config.string", value_name = "CONFIG_STRING")]
    pub config_string: Option<String>,

    /// Number of pipeline worker tasks
    #[arg(short = 'w', long = "pipeline.workers", value_name = "COUNT")]
    pub pipeline_workers: Option<String>,

    /// Events per batch
    #[arg(short = 'b', long = "pipeline.batch.size", value_name = "SIZE")]
    pub batch_size: Option<String>,

    /// Milliseconds to wait for a batch to fill
    #[arg(short = 'u', long = "pipeline.batch.delay", value_name = "DELAY_IN_MS")]
    pub batch_delay: Option<String>,

    /// Drop in-flight events on shutdown instead of draining them
    #[arg(long = "pipeline.unsafe_shutdown")]
    pub unsafe_shutdown: bool,

    /// Extra directory to search for plugins (repeatable)
    #[arg(short = 'p', long = "plugin.paths", value_name = "PATH")]
    pub plugin_paths: Vec<String>,

    /// Write logs to FILE
    #[arg(short = 'l', long = "log", value_name = "FILE")]
    pub log: Option<String>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Log errors only
    #[arg(long)]
    pub quiet: bool,

    /// Log at info level
    #[arg(long)]
    pub verbose: bool,

    /// Log the compiled pipeline config (needs --debug)
    #[arg(long = "debug.config")]
    pub debug_config: bool,

    /// Print the version and exit
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Check the config and exit
    #[arg(short = 't', long = "config.test")]
    pub config_test: bool,

    /// Reload the config when the file changes
    #[arg(short = 'r', long = "auto.reload")]
    pub auto_reload: bool,

    /// Seconds between config change checks
    #[arg(long = "reload.interval", value_name = "RELOAD_INTERVAL")]
    pub reload_interval: Option<String>,

    /// Web API bind host
    #[arg(long = "http-host", value_name = "WEB_API_HTTP_HOST")]
    pub http_host: Option<String>,

    /// Web API bind port
    #[arg(long = "http-port", value_name = "WEB_API_HTTP_PORT")]
    pub http_port: Option<String>,

    /// Allow environment variable references in the config
    #[arg(long = "allow-env")]
    pub allow_env: bool,

    /// Expose lifecycle metrics on the Web API address
    #[arg(long = "metric.collect")]
    pub metric_collect: bool,
}

impl Cli {
    /// Write every supplied flag into the registry. Flags not given on the
    /// command line leave the registry defaults in place. Numeric flags are
    /// passed as text and coerced by the registry.
    pub fn bind(&self, settings: &mut Settings) -> SettingsResult<()> {
        let texts = [
            ("node.name", &self.node_name),
            ("config.string", &self.config_string),
            ("pipeline.workers", &self.pipeline_workers),
            ("pipeline.batch.size", &self.batch_size),
            ("pipeline.batch.delay", &self.batch_delay),
            ("log.path", &self.log),
            ("config.reload_interval", &self.reload_interval),
            ("web_api.http.host", &self.http_host),
            ("web_api.http.port", &self.http_port),
        ];
        for (name, value) in texts {
            if let Some(value) = value {
                settings.set_value(name, value.as_str())?;
            }
        }

        if let Some(path) = &self.config_path {
            settings.set_value("config.path", path.clone())?;
        }
        if !self.plugin_paths.is_empty() {
            settings.set_value("plugin.paths", self.plugin_paths.clone())?;
        }

        let flags = [
            ("pipeline.unsafe_shutdown", self.unsafe_shutdown),
            ("debug", self.debug),
            ("quiet", self.quiet),
            ("verbose", self.verbose),
            ("debug.config", self.debug_config),
            ("version", self.version),
            ("config.test", self.config_test),
            ("config.auto_reload", self.auto_reload),
            ("config.allow_env", self.allow_env),
            ("metric.collect", self.metric_collect),
        ];
        for (name, set) in flags {
            if set {
                settings.set_value(name, true)?;
            }
        }
        Ok(())
    }
}

/// Usage line plus a pointer to `--help`, shown after usage errors.
pub fn short_help() -> String {
    let usage = Cli::command().render_usage();
    format!("{}\n\nFor more information, try '--help'.", usage)
}
