use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use vdm_core::{
    config::Config,
    cycle::CycleRunner,
    domain::CycleOutcome,
    scheduler::BotUpdateScheduler,
    status::StatusChecker,
};
use vdm_moca::{MocaBotClient, MocaTwitterClient};

#[derive(Parser)]
#[command(name = "vdm", version, about = "Keeps MocaBot bots trained on their screen names' latest tweets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create and update every bot in the screen name list once.
    UpdateBots,
    /// Update bots forever, once per interval, until Ctrl-C.
    KeepBotsUpdate {
        /// Seconds between cycles (defaults to VDM_UPDATE_INTERVAL_SECS).
        #[arg(long, short)]
        interval: Option<u64>,
    },
    /// Probe MocaTwitterUtil and MocaBot.
    ApiStatus,
    /// Print the version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("vdm ({})", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => run(command).await,
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    vdm_core::logging::init("vdm")?;
    let cfg = Arc::new(Config::load().context("loading configuration")?);

    let source = Arc::new(MocaTwitterClient::from_config(&cfg)?);
    let learning = Arc::new(MocaBotClient::from_config(&cfg)?);

    match command {
        Command::ApiStatus => {
            let st = StatusChecker::new(source, learning).check().await;
            println!("API Status: MocaTwitterUtil<{}>, MocaBot<{}>", st.source, st.learning);
            if !st.is_healthy() {
                std::process::exit(1);
            }
        }
        Command::UpdateBots => {
            let runner = CycleRunner::new(cfg, source, learning);
            match runner.run_once().await? {
                CycleOutcome::Completed(report) => {
                    let json = serde_json::to_string_pretty(&report)
                        .context("serializing cycle report")?;
                    println!("{json}");
                }
                CycleOutcome::Aborted(_) => {
                    anyhow::bail!("Please start MocaTwitterUtil and MocaBot api server.");
                }
                CycleOutcome::Skipped => {}
            }
        }
        Command::KeepBotsUpdate { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(cfg.update_interval);
            let runner = CycleRunner::new(cfg, source, learning);
            let scheduler = BotUpdateScheduler::new(runner, interval)?;

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    match tokio::signal::ctrl_c().await {
                        Ok(()) => {
                            tracing::info!("ctrl-c received, stopping");
                            cancel.cancel();
                        }
                        Err(e) => tracing::error!(error = %e, "cannot listen for ctrl-c"),
                    }
                }
            });
            scheduler.run(cancel).await;
        }
        Command::Version => {}
    }

    Ok(())
}
