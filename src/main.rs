//! Pipeline runner (v1)
//!
//! Runs the agent that hosts the configured pipeline, under signal-driven
//! supervision.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli (clap) ──bind──▶ config::Settings (typed registry)
//!                                        │
//!                                        ▼
//!                             observability::logging
//!                                        │
//!                                        ▼
//!                             lifecycle::Runner
//!                    ┌───────────────────┼────────────────────┐
//!                    ▼                   ▼                    ▼
//!             validation /        SignalListener        ConfigWatcher
//!             config test          (INT/TERM/HUP)       (auto reload)
//!                                        │                    │
//!                                        ▼                    ▼
//!                             LifecycleSupervisor ◀── event channel
//!                                        │
//!                                        ▼
//!                              agent::LocalAgent task
//! ```
//!
//! Exit codes: 0 on success, 1 on usage, configuration or runtime errors and
//! on forced shutdown. A forced shutdown (second ^C) deliberately exits 1
//! rather than 0, so callers can tell it apart from a clean stop.

use clap::Parser;

use ingest_runner::cli::{short_help, Cli};
use ingest_runner::config::default_settings;
use ingest_runner::environment::Environment;
use ingest_runner::lifecycle::startup::{report_error, EXIT_FAILURE, EXIT_SUCCESS};
use ingest_runner::observability::logging::{init_logging, LoggingOptions};
use ingest_runner::{agent::LocalAgentFactory, Runner, RunnerError};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS });
        }
    };

    let environment = Environment::from_env();
    let help = short_help();

    let mut settings = match default_settings() {
        Ok(settings) => settings,
        Err(e) => std::process::exit(report_error(&RunnerError::from(e), &help)),
    };
    if let Err(e) = cli.bind(&mut settings) {
        std::process::exit(report_error(&RunnerError::from(e), &help));
    }

    let logging = LoggingOptions::from_settings(&settings)
        .map_err(RunnerError::from)
        .and_then(|options| init_logging(&options, &environment).map_err(RunnerError::from));
    if let Err(e) = logging {
        std::process::exit(report_error(&e, &help));
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %environment.runtime(),
        "ingest-runner starting"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("ingest-runner")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start the async runtime");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let runner = Runner::new(settings, LocalAgentFactory)
        .with_environment(environment)
        .with_short_help(help);
    let code = runtime.block_on(runner.run());

    // Exit without dropping the runtime: after a forced shutdown the agent
    // task is still running and must not be waited on.
    std::process::exit(code);
}
