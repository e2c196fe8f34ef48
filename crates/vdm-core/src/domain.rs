use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health of both upstream services, valid for one cycle decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub source: bool,
    pub learning: bool,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        self.source && self.learning
    }
}

/// Raw HTTP-level reply from an upstream call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// One harvested record. Transient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarvestRecord {
    pub retweet: bool,
    pub text: String,
}

/// What happened to a single entity during one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntityOutcome {
    Updated { added: usize, total: usize },
    Unchanged { total: usize },
    LoadFailed { reason: String },
    HarvestFailed { reason: String },
    UploadFailed { chunk: usize, reason: String },
    PersistFailed { reason: String },
    Invalid { reason: String },
}

impl EntityOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. } | Self::Unchanged { .. })
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EntityReport {
    pub entity: String,
    #[serde(flatten)]
    pub outcome: EntityOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entities: Vec<EntityReport>,
}

impl CycleReport {
    pub fn succeeded(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entities.len() - self.succeeded()
    }
}

/// Result of one `CycleRunner::run_once()` call.
#[derive(Clone, Debug)]
pub enum CycleOutcome {
    /// Another cycle holds the run-lock; nothing was done.
    Skipped,
    /// A dependency probe failed; no entity was touched.
    Aborted(ServiceStatus),
    Completed(CycleReport),
}
