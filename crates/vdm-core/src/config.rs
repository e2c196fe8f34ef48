use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, upload::MAX_STUDY_CHUNK, Result};

/// Typed configuration for the bot refresher.
///
/// Built once at startup and handed to each component; nothing reads the
/// environment after `load()` returns.
#[derive(Clone, Debug)]
pub struct Config {
    // Source service (MocaTwitterUtil)
    pub twitter_url: String,
    pub twitter_api_key: String,

    // Learning service (MocaBot)
    pub bot_url: String,
    pub bot_api_key: String,
    pub bot_root_pass: String,

    // Storage
    pub screen_name_list: PathBuf,
    pub storage_dir: PathBuf,

    // Scheduling
    pub update_interval: Duration,
    pub http_timeout: Duration,
    pub provision_settle: Duration,

    // Upload
    pub study_chunk_size: usize,
    pub study_retries: u32,
    pub study_retry_backoff: Duration,

    // Harvest
    pub dedupe_within_harvest: bool,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(|key| env::var(key).ok())?;
        ensure_storage_dir(&cfg.storage_dir)?;
        Ok(cfg)
    }

    /// Build from an arbitrary key lookup. Does not touch the filesystem.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).and_then(non_empty).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };
        let u64_or = |key: &str, default: u64| -> Result<u64> {
            match lookup(key).and_then(non_empty) {
                None => Ok(default),
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| Error::Config(format!("{key} must be an integer, got {v:?}"))),
            }
        };

        let twitter_url = trim_base_url(required("VDM_TWITTER_URL")?);
        let twitter_api_key = required("VDM_TWITTER_API_KEY")?;
        let bot_url = trim_base_url(required("VDM_BOT_URL")?);
        let bot_api_key = required("VDM_BOT_API_KEY")?;
        let bot_root_pass = required("VDM_BOT_ROOT_PASS")?;

        let screen_name_list = lookup("VDM_SCREEN_NAME_LIST")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("configs/screen_name_list.json"));
        let storage_dir = lookup("VDM_STORAGE_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("storage"));

        let update_interval = Duration::from_secs(u64_or("VDM_UPDATE_INTERVAL_SECS", 3600)?);
        if update_interval.is_zero() {
            return Err(Error::Config(
                "VDM_UPDATE_INTERVAL_SECS must be > 0".to_string(),
            ));
        }
        let http_timeout = Duration::from_millis(u64_or("VDM_HTTP_TIMEOUT_MS", 30_000)?);
        let provision_settle = Duration::from_millis(u64_or("VDM_PROVISION_SETTLE_MS", 3_000)?);

        let study_chunk_size = u64_or("VDM_STUDY_CHUNK_SIZE", MAX_STUDY_CHUNK as u64)?;
        if study_chunk_size == 0 || study_chunk_size > MAX_STUDY_CHUNK as u64 {
            return Err(Error::Config(format!(
                "VDM_STUDY_CHUNK_SIZE must be in 1..={MAX_STUDY_CHUNK}, got {study_chunk_size}"
            )));
        }
        let study_chunk_size = study_chunk_size as usize;
        let study_retries = u64_or("VDM_STUDY_RETRIES", 2)?.min(u32::MAX as u64) as u32;
        let study_retry_backoff =
            Duration::from_millis(u64_or("VDM_STUDY_RETRY_BACKOFF_MS", 1_000)?);

        let dedupe_within_harvest = lookup("VDM_DEDUPE_WITHIN_HARVEST")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            twitter_url,
            twitter_api_key,
            bot_url,
            bot_api_key,
            bot_root_pass,
            screen_name_list,
            storage_dir,
            update_interval,
            http_timeout,
            provision_settle,
            study_chunk_size,
            study_retries,
            study_retry_backoff,
            dedupe_within_harvest,
        })
    }
}

fn ensure_storage_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::InvalidPath {
            path: dir.to_path_buf(),
            reason: "storage dir exists but is not a directory".to_string(),
        });
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
