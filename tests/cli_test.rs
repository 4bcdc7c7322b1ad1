//! Command line through settings binding into a run.

use std::sync::atomic::Ordering;

use clap::Parser;
use ingest_runner::cli::Cli;
use ingest_runner::config::{default_settings, Number, SettingValue};
use ingest_runner::observability::logging::LoggingOptions;
use ingest_runner::Runner;

mod common;

use common::{Behavior, MockFactory};

fn bound(args: &[&str]) -> ingest_runner::Settings {
    let cli = Cli::try_parse_from(std::iter::once("ingest-runner").chain(args.iter().copied())).unwrap();
    let mut settings = default_settings().unwrap();
    cli.bind(&mut settings).unwrap();
    settings
}

#[test]
fn test_batch_size_flag_becomes_numeric() {
    let settings = bound(&["-b", "250", "-e", "input { stdin {} }"]);
    assert_eq!(
        settings.get_value("pipeline.batch.size").unwrap(),
        Some(&SettingValue::Numeric(Number::Int(250)))
    );
    assert_eq!(settings.get_integer("pipeline.batch.size").unwrap(), Some(250));
}

#[test]
fn test_debug_config_without_debug_is_flagged() {
    let settings = bound(&["--debug.config", "-e", "input { stdin {} }"]);
    let options = LoggingOptions::from_settings(&settings).unwrap();
    assert!(options.config_dump_dropped());

    let settings = bound(&["--debug.config", "--debug"]);
    let options = LoggingOptions::from_settings(&settings).unwrap();
    assert!(!options.config_dump_dropped());
}

#[test]
fn test_every_setting_listed_after_binding() {
    let settings = bound(&["-w", "97", "--http-port", "9700"]);
    let lines: Vec<String> = settings.format_settings().collect();

    assert_eq!(lines.len(), settings.len());
    assert!(lines.iter().any(|l| l.starts_with("*pipeline.workers = 97")));
    assert!(lines.iter().any(|l| l.starts_with("*web_api.http.port = 9700")));
    assert!(lines.iter().any(|l| l == "pipeline.id = \"main\""));
}

#[tokio::test]
async fn test_bound_flags_drive_the_run() {
    let factory = MockFactory::new(Behavior::Exit(0));
    let created = factory.created.clone();
    let counters = factory.counters.clone();
    let settings = bound(&["-e", "input { stdin {} } output { stdout {} }", "--pipeline.unsafe_shutdown"]);

    assert_eq!(Runner::new(settings, factory).run().await, 0);
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_config_flags_is_usage_error() {
    let factory = MockFactory::new(Behavior::Exit(0));
    let created = factory.created.clone();

    assert_eq!(Runner::new(bound(&["-w", "4"]), factory).run().await, 1);
    assert_eq!(created.load(Ordering::SeqCst), 0);
}
