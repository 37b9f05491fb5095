//! feed-updater CLI - Main entry point for CLI binary
//!
//! Runs update checks against a feed and manages the package cache.

use anyhow::{bail, Context};
use clap::Parser;
use feed_updater::engine::cli::formatter::{event_json, format_size, CliFormatter};
use feed_updater::engine::cli::{CacheAction, Cli, Commands, OutputFormat};
use feed_updater::engine::updater::{UpdateEvent, Updater};
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        CliFormatter::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config().context("loading configuration")?;
    let updater = config.build_updater()?;
    let json_output = cli.format == OutputFormat::Json;

    match cli.command {
        Commands::Check => {
            cmd_check(&updater, json_output).await?;
        }
        Commands::Cache { action } => {
            cmd_cache(action, &updater, json_output).await?;
        }
        Commands::Apply => {
            cmd_check(&updater, json_output).await?;
            cmd_apply(&updater, json_output)?;
        }
    }

    Ok(())
}

/// Run one cycle and print its events. Fails if the cycle reported an error.
async fn cmd_check(updater: &Updater, json: bool) -> anyhow::Result<()> {
    let mut events = updater.subscribe();
    let Some(cycle) = updater.check_for_updates()? else {
        bail!("an update check is already running");
    };
    cycle.await.context("update check task")?;

    let mut failed = false;
    loop {
        match events.try_recv() {
            Ok(event) => {
                failed |= matches!(event, UpdateEvent::Error(_));
                if json {
                    println!("{}", event_json(&event));
                } else {
                    CliFormatter::event(&event);
                }
            }
            Err(TryRecvError::Lagged(n)) => {
                tracing::warn!(missed = n, "dropped update events");
            }
            Err(_) => break,
        }
    }

    if failed {
        bail!("update check failed");
    }
    Ok(())
}

async fn cmd_cache(action: CacheAction, updater: &Updater, json: bool) -> anyhow::Result<()> {
    let cache = updater.cache();
    match action {
        CacheAction::List => {
            let entries = cache.list().await?;
            if json {
                println!("{}", serde_json::json!({ "dir": cache.dir(), "entries": entries }));
                return Ok(());
            }
            CliFormatter::header(&format!("Cache {}", cache.dir().display()));
            if entries.is_empty() {
                CliFormatter::info("Cache is empty");
            }
            for name in entries {
                let size = tokio::fs::metadata(cache.dir().join(&name))
                    .await
                    .map(|m| format_size(m.len()))
                    .unwrap_or_else(|_| "?".to_string());
                CliFormatter::item(&format!("{name} ({size})"));
            }
        }
        CacheAction::Clean { keep } => {
            let removed = updater.clean_cache(keep.as_deref()).await;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                CliFormatter::success(&format!("Removed {removed} cache entries"));
            }
        }
    }
    Ok(())
}

fn cmd_apply(updater: &Updater, json: bool) -> anyhow::Result<()> {
    let staged_version = updater.state().staged_version;
    let launched = updater.quit_and_install()?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "applied": launched, "version": staged_version })
        );
    } else if launched {
        let version = staged_version.as_deref().unwrap_or("unknown");
        CliFormatter::success(&format!("Update {version} launched"));
    } else {
        CliFormatter::warning("Nothing staged to apply");
    }
    Ok(())
}
