use crate::types::{PaperRecord, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for pulling paper records from an upstream source (arXiv, Scopus, ...)
#[async_trait]
pub trait FetchSource: Send + Sync {
    /// Human-readable name for this source, used in logs
    fn source_name(&self) -> String;

    /// Fetch the newest papers matching `query`, newest first, at most `limit`.
    ///
    /// When `since` is given, papers published at or before that instant are
    /// excluded. When it is `None` the source returns its default-sized
    /// recent window.
    async fn fetch(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<PaperRecord>>;
}

/// Trait for turning a paper into a displayable natural-language summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce the formatted summary for one paper. May take seconds.
    /// Errors are caught by the orchestrator and replaced with visible
    /// error text, so a failing summarizer never aborts a cycle.
    async fn summarize(&self, paper: &PaperRecord) -> Result<String>;
}

/// Trait for delivering notifications to the chat channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one paper with its summary. `Ok(())` means delivered.
    async fn notify(&self, paper: &PaperRecord, summary: &str) -> Result<()>;

    /// Deliver a plain text message (used for the "no updates" notice).
    async fn notify_plain(&self, message: &str) -> Result<()>;
}
