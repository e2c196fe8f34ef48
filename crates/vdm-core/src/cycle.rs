//! One full pass over the registry: status check, then harvest → provision →
//! upload → persist for each entity in order.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;

use crate::{
    config::Config,
    corpus::{validate_entity, CorpusStore},
    domain::{CycleOutcome, CycleReport, EntityOutcome, EntityReport},
    errors::Error,
    harvest::Harvester,
    ports::{LearningService, SourceService},
    provision::Provisioner,
    registry::Registry,
    status::StatusChecker,
    upload::BatchUploader,
    Result,
};

#[derive(Clone)]
pub struct CycleRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    cfg: Arc<Config>,
    status: StatusChecker,
    harvester: Harvester,
    provisioner: Provisioner,
    uploader: BatchUploader,
    corpus: CorpusStore,
    running: AtomicBool,
}

/// Clears the run flag on drop, including when the cycle task panics.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CycleRunner {
    pub fn new(
        cfg: Arc<Config>,
        source: Arc<dyn SourceService>,
        learning: Arc<dyn LearningService>,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                status: StatusChecker::new(source.clone(), learning.clone()),
                harvester: Harvester::new(source, cfg.dedupe_within_harvest),
                provisioner: Provisioner::new(learning.clone(), cfg.provision_settle),
                uploader: BatchUploader::new(
                    learning,
                    cfg.study_chunk_size,
                    cfg.study_retries,
                    cfg.study_retry_backoff,
                ),
                corpus: CorpusStore::new(cfg.storage_dir.clone()),
                cfg,
                running: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Run one cycle unless another one is already in progress.
    ///
    /// `Err` is only returned when the registry cannot be read; every
    /// per-entity failure is recorded in the report instead.
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("previous bot update still running, skipping this cycle");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = RunGuard(&self.inner.running);

        let started_at = Utc::now();
        let status = self.inner.status.check().await;
        if !status.is_healthy() {
            let err = Error::DependencyUnhealthy {
                source_healthy: status.source,
                learning_healthy: status.learning,
            };
            tracing::error!(
                twitter = status.source,
                bot = status.learning,
                "{err}; start MocaTwitterUtil and MocaBot api servers"
            );
            return Ok(CycleOutcome::Aborted(status));
        }

        let registry = Registry::load(&self.inner.cfg.screen_name_list).await?;
        tracing::info!(entities = registry.len(), "bot update cycle started");

        let mut entities = Vec::with_capacity(registry.len());
        for entity in registry.iter() {
            let outcome = self.process_entity(entity).await;
            entities.push(EntityReport {
                entity: entity.to_string(),
                outcome,
            });
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            entities,
        };
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "bot update cycle finished"
        );
        Ok(CycleOutcome::Completed(report))
    }

    async fn process_entity(&self, entity: &str) -> EntityOutcome {
        let inner = &self.inner;

        if let Err(e) = validate_entity(entity) {
            tracing::error!(entity, stage = "validate", error = %e, "skipping entity");
            return EntityOutcome::Invalid {
                reason: e.to_string(),
            };
        }

        let mut corpus = match inner.corpus.load(entity).await {
            Ok(c) => c,
            Err(e) => {
                // an unreadable corpus must not be replaced by a partial one
                tracing::error!(entity, stage = "load", error = %e, "cannot read corpus, skipping entity");
                return EntityOutcome::LoadFailed {
                    reason: e.to_string(),
                };
            }
        };
        tracing::info!(entity, old = corpus.len(), "loaded corpus");

        let new = match inner.harvester.harvest(entity, &corpus).await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(entity, stage = "harvest", error = %e, "get latest tweets failed");
                return EntityOutcome::HarvestFailed {
                    reason: e.to_string(),
                };
            }
        };

        inner.provisioner.ensure(entity).await;

        if let Err(e) = inner.uploader.upload(entity, &new).await {
            tracing::error!(entity, stage = "upload", error = %e, "send text to MocaBot failed");
            let chunk = match &e {
                Error::UploadFailed { chunk, .. } => *chunk,
                _ => 0,
            };
            return EntityOutcome::UploadFailed {
                chunk,
                reason: e.to_string(),
            };
        }

        if new.is_empty() {
            tracing::info!(entity, total = corpus.len(), "no new tokens");
            return EntityOutcome::Unchanged {
                total: corpus.len(),
            };
        }

        let added = new.len();
        corpus.extend(new);
        if let Err(e) = inner.corpus.persist(entity, &corpus).await {
            tracing::error!(entity, stage = "persist", error = %e, "uploaded but could not save corpus");
            return EntityOutcome::PersistFailed {
                reason: e.to_string(),
            };
        }

        tracing::info!(entity, added, total = corpus.len(), "update bot successfully");
        EntityOutcome::Updated {
            added,
            total: corpus.len(),
        }
    }
}
