//! Tracked screen names, read from a JSON array file.

use std::{collections::HashSet, io, path::Path};

use tokio::fs;

use crate::{errors::Error, Result};

/// Ordered, deduplicated list of entity identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<String>,
}

impl Registry {
    /// Read the registry file. A missing file is an empty registry.
    pub async fn load(path: &Path) -> Result<Self> {
        let txt = match fs::read_to_string(path).await {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "screen name list not found, nothing to update");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Vec<String> = serde_json::from_str(&txt)?;
        Ok(Self::from_entries(raw))
    }

    /// Keep the first occurrence of each identifier, byte for byte as given.
    pub fn from_entries(raw: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let entries = raw
            .into_iter()
            .filter(|s| seen.insert(s.clone()))
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
