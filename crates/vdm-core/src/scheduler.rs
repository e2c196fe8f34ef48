//! Interval scheduler for bot updates.
//!
//! - Sleeps `interval`, then fires one cycle as a detached tokio task
//! - Never awaits the fired cycle; its errors and panics stay inside the task
//! - Overlap is refused by the runner's run-lock, so a slow cycle makes the
//!   following ticks skip rather than race on the corpus files
//! - Stops only when the cancellation token fires

use std::time::Duration;

use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{cycle::CycleRunner, domain::CycleOutcome, errors::Error, Result};

#[derive(Clone)]
pub struct BotUpdateScheduler {
    runner: CycleRunner,
    interval: Duration,
}

impl BotUpdateScheduler {
    pub fn new(runner: CycleRunner, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Config("update interval must be > 0".to_string()));
        }
        Ok(Self { runner, interval })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Loop until `cancel` fires. Returns the number of ticks triggered.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "keep bots update started");
        let mut ticks = 0u64;
        loop {
            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = sleep(self.interval) => {
                ticks += 1;
                // detached: the handle is dropped on purpose
                let _ = self.trigger();
              }
            }
        }
        tracing::info!(ticks, "keep bots update stopped");
        ticks
    }

    /// Fire one cycle in the background.
    pub fn trigger(&self) -> JoinHandle<()> {
        let runner = self.runner.clone();
        tokio::spawn(async move {
            match runner.run_once().await {
                Ok(CycleOutcome::Completed(report)) => {
                    tracing::debug!(entities = report.entities.len(), "scheduled cycle completed");
                }
                Ok(CycleOutcome::Aborted(_)) | Ok(CycleOutcome::Skipped) => {}
                Err(e) => tracing::error!(error = %e, "scheduled cycle failed"),
            }
        })
    }
}
