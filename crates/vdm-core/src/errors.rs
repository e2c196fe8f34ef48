use std::path::PathBuf;

/// Core error type.
///
/// Adapter crates map their transport errors into `External` so the cycle runner
/// can decide per stage whether a failure skips an entity or the whole cycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("external error: {0}")]
    External(String),

    #[error("dependency unhealthy: source={source_healthy}, learning={learning_healthy}")]
    DependencyUnhealthy {
        source_healthy: bool,
        learning_healthy: bool,
    },

    #[error("harvest failed for {entity}: {reason}")]
    HarvestFailed { entity: String, reason: String },

    #[error("upload failed for {entity} at chunk {chunk}: {reason}")]
    UploadFailed {
        entity: String,
        chunk: usize,
        reason: String,
    },

    #[error("invalid entity {entity:?}: {reason}")]
    InvalidEntity { entity: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
