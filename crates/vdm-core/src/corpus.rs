//! Per-entity persisted token corpus.
//!
//! One JSON array file per entity: `<storage_dir>/<entity>-bot-data.json`.
//! Writes go to a sibling temp file first and are renamed into place, so a reader
//! never sees a half-written corpus.

use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{errors::Error, Result};

const FILE_SUFFIX: &str = "-bot-data.json";

#[derive(Clone, Debug)]
pub struct CorpusStore {
    dir: PathBuf,
}

impl CorpusStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, entity: &str) -> Result<PathBuf> {
        validate_entity(entity)?;
        Ok(self.dir.join(format!("{entity}{FILE_SUFFIX}")))
    }

    /// Stored corpus, or an empty one if the entity has never been persisted.
    pub async fn load(&self, entity: &str) -> Result<Vec<String>> {
        let path = self.path_for(entity)?;
        let txt = match fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };
        if txt.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&txt)?)
    }

    /// Replace the entity's corpus file with `corpus`.
    pub async fn persist(&self, entity: &str, corpus: &[String]) -> Result<()> {
        let path = self.path_for(entity)?;
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(corpus)?;

        fs::create_dir_all(&self.dir).await?;
        fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(Error::Io(e));
        }
        Ok(())
    }
}

/// Entity names become file names, so anything that could escape the storage
/// directory is refused.
pub fn validate_entity(entity: &str) -> Result<()> {
    let reason = if entity.trim().is_empty() {
        Some("empty identifier")
    } else if entity.contains('/') || entity.contains('\\') {
        Some("contains a path separator")
    } else if entity.contains("..") {
        Some("contains '..'")
    } else if entity.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };

    match reason {
        Some(r) => Err(Error::InvalidEntity {
            entity: entity.to_string(),
            reason: r.to_string(),
        }),
        None => Ok(()),
    }
}
