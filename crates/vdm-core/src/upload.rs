//! Chunked, strictly sequential upload of new tokens to the learning service.

use std::{sync::Arc, time::Duration};

use crate::{errors::Error, ports::LearningService, Result};

/// Largest `message_list` the study endpoint accepts in one call.
pub const MAX_STUDY_CHUNK: usize = 8_000;

#[derive(Clone)]
pub struct BatchUploader {
    learning: Arc<dyn LearningService>,
    chunk_size: usize,
    retries: u32,
    backoff: Duration,
}

impl BatchUploader {
    pub fn new(
        learning: Arc<dyn LearningService>,
        chunk_size: usize,
        retries: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            learning,
            chunk_size: chunk_size.clamp(1, MAX_STUDY_CHUNK),
            retries,
            backoff,
        }
    }

    /// Upload `tokens` in order, `chunk_size` (never above [`MAX_STUDY_CHUNK`]) at a time.
    ///
    /// Stops at the first chunk that still fails after its retries; later chunks
    /// are never sent and earlier ones are not rolled back on the remote side.
    pub async fn upload(&self, entity: &str, tokens: &[String]) -> Result<()> {
        let total = tokens.len().div_ceil(self.chunk_size);
        for (idx, chunk) in tokens.chunks(self.chunk_size).enumerate() {
            self.send_chunk(entity, idx, chunk).await?;
            tracing::debug!(entity, chunk = idx + 1, of = total, size = chunk.len(), "chunk accepted");
        }
        Ok(())
    }

    async fn send_chunk(&self, entity: &str, idx: usize, chunk: &[String]) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            let reason = match self.learning.study(entity, chunk).await {
                Ok(resp) if resp.is_ok() => return Ok(()),
                Ok(resp) => format!(
                    "status {}, body: {}",
                    resp.status,
                    resp.body.chars().take(200).collect::<String>()
                ),
                Err(e) => e.to_string(),
            };

            if attempt >= self.retries {
                return Err(Error::UploadFailed {
                    entity: entity.to_string(),
                    chunk: idx,
                    reason,
                });
            }
            attempt += 1;
            tracing::warn!(entity, stage = "upload", chunk = idx, attempt, %reason, "study failed, retrying");
            if !self.backoff.is_zero() {
                tokio::time::sleep(self.retry_delay(attempt)).await;
            }
        }
    }

    /// Linear backoff, saturating instead of overflowing on large settings.
    fn retry_delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}
