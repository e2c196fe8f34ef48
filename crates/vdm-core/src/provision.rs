use std::{sync::Arc, time::Duration};

use crate::ports::LearningService;

/// Makes sure the remote bot for an entity exists before anything is uploaded.
#[derive(Clone)]
pub struct Provisioner {
    learning: Arc<dyn LearningService>,
    settle: Duration,
}

impl Provisioner {
    pub fn new(learning: Arc<dyn LearningService>, settle: Duration) -> Self {
        Self { learning, settle }
    }

    /// Send the idempotent create request, then wait `settle` so the remote side
    /// can finish creating the bot. Never fails: problems are logged as warnings
    /// and the upload stage decides whether the entity succeeds.
    pub async fn ensure(&self, entity: &str) {
        match self.learning.create_bot(entity).await {
            Ok(resp) if resp.is_ok() => {
                tracing::debug!(entity, "create-bot accepted");
            }
            Ok(resp) => {
                tracing::warn!(
                    entity,
                    stage = "provision",
                    status = resp.status,
                    "create-bot returned non-200, continuing"
                );
            }
            Err(e) => {
                tracing::warn!(entity, stage = "provision", error = %e, "create-bot failed, continuing");
            }
        }

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLearning;

    #[tokio::test]
    async fn non_200_is_not_fatal() {
        let learning = Arc::new(FakeLearning {
            create_status: Some(500),
            ..FakeLearning::healthy()
        });
        let p = Provisioner::new(learning.clone(), Duration::ZERO);
        p.ensure("alice").await;
        assert_eq!(learning.created(), vec!["alice"]);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_settle_delay() {
        let learning = Arc::new(FakeLearning::healthy());
        let p = Provisioner::new(learning, Duration::from_secs(3));
        let start = tokio::time::Instant::now();
        p.ensure("alice").await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
