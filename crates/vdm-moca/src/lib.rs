//! HTTP adapters for the Moca services.
//!
//! - `MocaTwitterClient` implements the source port (MocaTwitterUtil)
//! - `MocaBotClient` implements the learning port (MocaBot)

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use vdm_core::{
    config::Config,
    domain::ServiceResponse,
    errors::Error,
    ports::{LearningService, SourceService},
    Result,
};

const STATUS_PATH: &str = "/status";
const LATEST_TWEETS_PATH: &str = "/moca-twitter/get-latest-tweets";
const CREATE_BOT_PATH: &str = "/moca-bot/create-bot";
const STUDY_PATH: &str = "/moca-bot/study";

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::External(format!("http client build error: {e}")))
}

/// Reachability check: any HTTP answer counts as alive, only transport errors don't.
async fn probe(http: &reqwest::Client, url: &str) -> bool {
    match http.get(url).send().await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(url, error = %e, "status probe failed");
            false
        }
    }
}

async fn into_service_response(resp: reqwest::Response) -> Result<ServiceResponse> {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::External(format!("response body error: {e}")))?;
    Ok(ServiceResponse { status, body })
}

#[derive(Clone, Debug)]
pub struct MocaTwitterClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl MocaTwitterClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.twitter_url, &cfg.twitter_api_key, cfg.http_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl SourceService for MocaTwitterClient {
    async fn probe(&self) -> bool {
        probe(&self.http, &self.url(STATUS_PATH)).await
    }

    async fn latest_tweets(&self, entity: &str) -> Result<String> {
        let resp = self
            .http
            .get(self.url(LATEST_TWEETS_PATH))
            .header("API-KEY", &self.api_key)
            .header("SCREEN-NAME", entity)
            .send()
            .await
            .map_err(|e| Error::External(format!("get-latest-tweets request error: {e}")))?;

        let resp = into_service_response(resp).await?;
        if !resp.is_ok() {
            return Err(Error::External(format!(
                "get-latest-tweets failed: {} {}",
                resp.status,
                resp.body.chars().take(200).collect::<String>()
            )));
        }
        Ok(resp.body)
    }
}

/// JSON body for `create-bot`.
#[derive(Debug, Serialize)]
struct CreateBotRequest<'a> {
    api_key: &'a str,
    name: &'a str,
    root_pass: &'a str,
}

/// JSON body for `study`.
#[derive(Debug, Serialize)]
struct StudyRequest<'a> {
    api_key: &'a str,
    name: &'a str,
    message_list: &'a [String],
    root_pass: &'a str,
}

#[derive(Clone, Debug)]
pub struct MocaBotClient {
    base_url: String,
    api_key: String,
    root_pass: String,
    http: reqwest::Client,
}

impl MocaBotClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        root_pass: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            root_pass: root_pass.into(),
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.bot_url,
            &cfg.bot_api_key,
            &cfg.bot_root_pass,
            cfg.http_timeout,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ServiceResponse> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::External(format!("{path} request error: {e}")))?;
        into_service_response(resp).await
    }
}

#[async_trait]
impl LearningService for MocaBotClient {
    async fn probe(&self) -> bool {
        probe(&self.http, &self.url(STATUS_PATH)).await
    }

    async fn create_bot(&self, entity: &str) -> Result<ServiceResponse> {
        let body = CreateBotRequest {
            api_key: &self.api_key,
            name: entity,
            root_pass: &self.root_pass,
        };
        self.post_json(CREATE_BOT_PATH, &body).await
    }

    async fn study(&self, entity: &str, messages: &[String]) -> Result<ServiceResponse> {
        let body = StudyRequest {
            api_key: &self.api_key,
            name: entity,
            message_list: messages,
            root_pass: &self.root_pass,
        };
        self.post_json(STUDY_PATH, &body).await
    }
}
