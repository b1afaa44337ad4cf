use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream API a paper came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSource {
    ArXiv,
    Scopus,
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperSource::ArXiv => write!(f, "arXiv"),
            PaperSource::Scopus => write!(f, "Scopus"),
        }
    }
}

/// Canonical paper representation flowing through the pipeline.
///
/// `id` is the upstream identifier (arXiv entry id, Scopus `dc:identifier`)
/// and must be stable across fetches; it is the only field that outlives a
/// cycle, as a member of the seen-set once the paper has been notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub doi: Option<String>,
    /// Pre-formatted author list, as upstream reports it.
    pub authors: String,
    pub published_at: DateTime<Utc>,
    pub source: PaperSource,
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Feed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
