use crate::types::{BotError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:1234/v1";
pub const DEFAULT_LLM_MODEL: &str = "local-model";
pub const DEFAULT_SEARCH_QUERY: &str =
    r#"("brain waves" OR "EEG" OR "brain-computer interface" OR "electroencephalography")"#;
pub const DEFAULT_FETCH_INTERVAL_SECONDS: u64 = 1800;
pub const DEFAULT_FETCH_LIMIT: usize = 5;
pub const DEFAULT_NOTIFY_PAUSE_SECONDS: u64 = 2;
pub const DEFAULT_NO_UPDATE_MESSAGE: &str = "更新ないです";

/// Runtime configuration, assembled from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_webhook_url: String,
    /// Scopus is skipped entirely when no API key is configured.
    pub elsevier_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub search_query: String,
    pub fetch_interval: Duration,
    pub fetch_limit: usize,
    pub notify_pause: Duration,
    pub seen_set_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

impl BotConfig {
    /// Read configuration from environment variables, falling back to the
    /// defaults above. Only the Discord webhook URL is mandatory.
    pub fn from_env() -> Result<Self> {
        let discord_webhook_url = env::var("DISCORD_WEBHOOK_URL")
            .map_err(|_| BotError::Config("DISCORD_WEBHOOK_URL is not set".to_string()))?;

        let elsevier_api_key = env::var("ELSEVIER_API_KEY").ok().filter(|k| !k.is_empty());

        let fetch_interval_secs = match env::var("FETCH_INTERVAL_SECONDS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                BotError::Config(format!("FETCH_INTERVAL_SECONDS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_FETCH_INTERVAL_SECONDS,
        };

        Ok(Self {
            discord_webhook_url,
            elsevier_api_key,
            llm_base_url: env::var("LM_STUDIO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: env::var("LM_STUDIO_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            search_query: env::var("SEARCH_QUERY")
                .unwrap_or_else(|_| DEFAULT_SEARCH_QUERY.to_string()),
            fetch_interval: Duration::from_secs(fetch_interval_secs),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            notify_pause: Duration::from_secs(DEFAULT_NOTIFY_PAUSE_SECONDS),
            seen_set_path: env::var("SENT_PAPERS_LOG")
                .unwrap_or_else(|_| "sent_papers.json".to_string())
                .into(),
            checkpoint_path: env::var("LAST_CHECK_FILE")
                .unwrap_or_else(|_| "last_check.txt".to_string())
                .into(),
        })
    }
}
