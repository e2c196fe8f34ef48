use std::sync::Arc;

use crate::{
    domain::ServiceStatus,
    ports::{LearningService, SourceService},
};

/// Probes both upstream services before a cycle is allowed to proceed.
#[derive(Clone)]
pub struct StatusChecker {
    source: Arc<dyn SourceService>,
    learning: Arc<dyn LearningService>,
}

impl StatusChecker {
    pub fn new(source: Arc<dyn SourceService>, learning: Arc<dyn LearningService>) -> Self {
        Self { source, learning }
    }

    /// One probe per service, run concurrently. Never fails.
    pub async fn check(&self) -> ServiceStatus {
        let (source, learning) = tokio::join!(self.source.probe(), self.learning.probe());
        let status = ServiceStatus { source, learning };
        tracing::info!(
            twitter = status.source,
            bot = status.learning,
            "API status: MocaTwitterUtil<{}>, MocaBot<{}>",
            status.source,
            status.learning
        );
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLearning, FakeSource};

    #[tokio::test]
    async fn reports_each_service_independently() {
        let source = Arc::new(FakeSource::healthy());
        let learning = Arc::new(FakeLearning::default());
        let checker = StatusChecker::new(source.clone(), learning.clone());

        let st = checker.check().await;
        assert_eq!(
            st,
            ServiceStatus {
                source: true,
                learning: false
            }
        );
        assert!(!st.is_healthy());
        assert_eq!(source.probe_calls(), 1);
        assert_eq!(learning.probe_calls(), 1);
    }
}
