// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use std::env;
use std::time::Instant;
use the_sequencer::app::{Application, RunSummary, Termination};
use the_sequencer::config::{load_and_validate_config, ProcessorRegistry};
use the_sequencer::source::SyntheticSource;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let json = args.iter().skip(1).any(|arg| arg == "--json");
    let config_files: Vec<&String> = args.iter().skip(1).filter(|arg| *arg != "--json").collect();

    if config_files.len() != 1 {
        eprintln!("Usage: {} <config.yaml|config.toml> [--json]", args[0]);
        eprintln!("Example: {} configs/parallel-selection.yaml", args[0]);
        eprintln!("Example: {} configs/sequential-reference.toml --json", args[0]);
        std::process::exit(1);
    }
    let config_file = config_files[0].clone();

    let config = load_and_validate_config(&config_file)
        .with_context(|| format!("failed to load {}", config_file))?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, draining in-flight events");
                cancel.cancel();
            }
        });
    }

    let started = Instant::now();
    // the scheduler blocks on OS threads, keep it off the async workers
    let summary = tokio::task::spawn_blocking(move || -> anyhow::Result<RunSummary> {
        let registry = ProcessorRegistry::with_builtins();
        let app = Application::from_config(&config, &registry)?.with_cancellation(cancel);
        let mut source = SyntheticSource::from_config(&config.source);
        Ok(app.run(&mut source, |_event| {})?)
    })
    .await
    .context("processing thread failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Configuration: {}", config_file);
        println!("Termination:   {}", summary.termination);
        println!(
            "Events:        {} read, {} delivered, {} failed",
            summary.events_read,
            summary.events_delivered,
            summary.failed_events.len()
        );
        println!("Elapsed:       {:?}", started.elapsed());
        println!();
        println!("{}", summary.report);
    }

    if !summary.failed_events.is_empty() {
        bail!("{} events failed", summary.failed_events.len());
    }
    if summary.termination == Termination::Cancelled {
        bail!("processing was cancelled");
    }
    Ok(())
}
