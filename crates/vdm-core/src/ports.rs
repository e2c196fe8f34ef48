use async_trait::async_trait;

use crate::{domain::ServiceResponse, Result};

/// Port for the upstream service that supplies raw tweets per screen name.
#[async_trait]
pub trait SourceService: Send + Sync {
    /// Liveness probe. Unreachable means `false`; never errors.
    async fn probe(&self) -> bool;

    /// Raw response body of the latest-tweets endpoint for `entity`.
    async fn latest_tweets(&self, entity: &str) -> Result<String>;
}

/// Port for the remote learning service that hosts one bot per entity.
#[async_trait]
pub trait LearningService: Send + Sync {
    /// Liveness probe. Unreachable means `false`; never errors.
    async fn probe(&self) -> bool;

    /// Idempotent create. The service no-ops when the bot already exists.
    async fn create_bot(&self, entity: &str) -> Result<ServiceResponse>;

    /// Feed one batch of messages to the entity's bot.
    async fn study(&self, entity: &str, messages: &[String]) -> Result<ServiceResponse>;
}
