mod cli;
mod terminal;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use heartwatch_core::config::{self, Config};
use heartwatch_monitor::{send_heartbeat, Monitor};
use heartwatch_notify::Dispatcher;
use heartwatch_queue::{QueueConsumer, SqsQueue};

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    if let Command::Version = args.command {
        println!("heartwatch version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    config::load_dotenv();
    let mut config = Config::from_env();
    args.apply(&mut config);
    config.log_summary();

    match &args.command {
        Command::Send { name } => {
            let queue = SqsQueue::new(&config.aws, &config.queue)
                .await
                .context("failed to connect to heartbeat queue")?;
            let now = Utc::now().timestamp();
            send_heartbeat(&queue, name, now)
                .await
                .with_context(|| format!("failed to send heartbeat for '{name}'"))?;
        }
        Command::Poll => {
            let monitor = build_monitor(&config)?;
            let queue = SqsQueue::new(&config.aws, &config.queue)
                .await
                .context("failed to connect to heartbeat queue")?;
            let report = monitor
                .poll(&queue, Utc::now().timestamp())
                .await
                .context("poll failed")?;
            info!(
                received = report.received,
                recorded = report.recorded,
                stale = report.stale,
                rejected = report.rejected,
                notified = report.sweep.notified,
                "Poll complete"
            );
        }
        Command::Run => {
            let monitor = build_monitor(&config)?;
            let queue = SqsQueue::new(&config.aws, &config.queue)
                .await
                .context("failed to connect to heartbeat queue")?;
            match queue.health_check().await {
                Ok(health) => info!(%health, "Heartbeat queue reachable"),
                Err(e) => tracing::warn!(error = %e, "Heartbeat queue health check failed"),
            }
            monitor
                .run(&queue, async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
        }
        Command::Config(config_args) => {
            let monitor = build_monitor(&config)?;
            terminal::print_info(&format!("Setting config for {}", config_args.name))?;
            let record = monitor
                .configure(&config_args.name, &config_args.to_request(), Utc::now())
                .await
                .with_context(|| format!("failed to configure '{}'", config_args.name))?;
            terminal::print_records(std::slice::from_ref(&record))?;
        }
        Command::Show { name } => {
            let monitor = build_monitor(&config)?;
            let records = monitor
                .show(name.as_deref())
                .await
                .context("failed to read records")?;
            terminal::print_records(&records)?;
        }
        Command::Version => {}
    }

    Ok(())
}

fn build_monitor(config: &Config) -> Result<Monitor> {
    let store = heartwatch_storage::open_store(&config.storage).context("failed to open record store")?;
    let dispatcher = Dispatcher::from_config(&config.notify).context("failed to set up notification channels")?;
    info!(backend = store.backend_name(), topic = dispatcher.topic(), "Monitor ready");
    Ok(Monitor::new(store, dispatcher, config.monitor.clone())
        .with_batch_size(config.queue.max_batch_size))
}
