//! Shared fakes for unit tests.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    config::Config,
    domain::ServiceResponse,
    errors::Error,
    ports::{LearningService, SourceService},
    Result,
};

/// Fresh directory under the system temp dir, unique per test name + pid + time.
pub fn scratch_dir(prefix: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("vdm-{prefix}-{pid}-{ts}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn test_config(dir: &std::path::Path) -> Config {
    Config {
        twitter_url: "http://twitter.test".into(),
        twitter_api_key: "tkey".into(),
        bot_url: "http://bot.test".into(),
        bot_api_key: "bkey".into(),
        bot_root_pass: "root".into(),
        screen_name_list: dir.join("screen_name_list.json"),
        storage_dir: dir.join("storage"),
        update_interval: Duration::from_secs(60),
        http_timeout: Duration::from_secs(1),
        provision_settle: Duration::ZERO,
        study_chunk_size: 8_000,
        study_retries: 0,
        study_retry_backoff: Duration::ZERO,
        dedupe_within_harvest: false,
    }
}

pub fn ok() -> ServiceResponse {
    ServiceResponse {
        status: 200,
        body: "success.".into(),
    }
}

pub fn status(code: u16) -> ServiceResponse {
    ServiceResponse {
        status: code,
        body: format!("status {code}"),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub healthy: bool,
    pub bodies: Mutex<HashMap<String, String>>,
    pub delay: Duration,
    pub probes: AtomicUsize,
    pub fetches: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn with_body(self, entity: &str, body: &str) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(entity.to_string(), body.to_string());
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceService for FakeSource {
    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.healthy
    }

    async fn latest_tweets(&self, entity: &str) -> Result<String> {
        self.fetches.lock().unwrap().push(entity.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.bodies
            .lock()
            .unwrap()
            .get(entity)
            .cloned()
            .ok_or_else(|| Error::External(format!("no tweets for {entity}")))
    }
}

/// Learning service fake. `study_script` is consumed front to back, one entry
/// per study call; once exhausted every call answers 200.
#[derive(Default)]
pub struct FakeLearning {
    pub healthy: bool,
    pub create_status: Option<u16>,
    pub study_script: Mutex<Vec<Result<ServiceResponse>>>,
    pub probes: AtomicUsize,
    pub creates: Mutex<Vec<String>>,
    pub studies: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeLearning {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn script(self, replies: Vec<Result<ServiceResponse>>) -> Self {
        *self.study_script.lock().unwrap() = replies;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<String> {
        self.creates.lock().unwrap().clone()
    }

    pub fn studied(&self) -> Vec<(String, Vec<String>)> {
        self.studies.lock().unwrap().clone()
    }
}

#[async_trait]
impl LearningService for FakeLearning {
    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.healthy
    }

    async fn create_bot(&self, entity: &str) -> Result<ServiceResponse> {
        self.creates.lock().unwrap().push(entity.to_string());
        Ok(status(self.create_status.unwrap_or(200)))
    }

    async fn study(&self, entity: &str, messages: &[String]) -> Result<ServiceResponse> {
        self.studies
            .lock()
            .unwrap()
            .push((entity.to_string(), messages.to_vec()));
        let mut script = self.study_script.lock().unwrap();
        if script.is_empty() {
            Ok(ok())
        } else {
            script.remove(0)
        }
    }
}
