use crate::store::{CheckpointStore, SeenSetStore};
use crate::traits::{FetchSource, Notifier, Summarizer};
use crate::types::{PaperRecord, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Tunables for one pipeline instance. Everything except `query` has a
/// sensible default; tests zero out `notify_pause`.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Search query passed to every source.
    pub query: String,
    /// Maximum papers requested from each source per cycle.
    pub fetch_limit: usize,
    /// Pause after each successful notification, to stay under the
    /// webhook's rate limit.
    pub notify_pause: Duration,
    /// Time between cycle starts in `run_forever`.
    pub cycle_interval: Duration,
    /// Whether a cycle that notified nothing sends a plain notice.
    pub no_update_notice: bool,
    pub no_update_message: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            query: crate::config::DEFAULT_SEARCH_QUERY.to_string(),
            fetch_limit: crate::config::DEFAULT_FETCH_LIMIT,
            notify_pause: Duration::from_secs(crate::config::DEFAULT_NOTIFY_PAUSE_SECONDS),
            cycle_interval: Duration::from_secs(crate::config::DEFAULT_FETCH_INTERVAL_SECONDS),
            no_update_notice: true,
            no_update_message: crate::config::DEFAULT_NO_UPDATE_MESSAGE.to_string(),
        }
    }
}

/// Counters describing what one polling cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    /// Checkpoint that bounded this cycle's fetches, if any.
    pub checkpoint: Option<DateTime<Utc>>,
    /// Total records returned across all sources, before filtering.
    pub fetched: usize,
    /// Sources whose fetch failed and was skipped.
    pub sources_failed: usize,
    /// Records that survived the seen-set filter.
    pub candidates: usize,
    /// Candidates whose notification was delivered.
    pub notified: usize,
    /// Candidates whose notification failed; they stay out of the seen-set.
    pub notify_failures: usize,
    /// Candidates that went out with error text instead of a real summary.
    pub summary_failures: usize,
    /// Whether the "no updates" notice was sent this cycle.
    pub no_update_notice_sent: bool,
}

/// Terminal state of one candidate within a cycle. Only `Notified` mutates
/// the seen-set; a failed candidate stays eligible for a later cycle as long
/// as the checkpoint has not passed it.
enum CandidateOutcome {
    Notified { summary_degraded: bool },
    NotifyFailed { summary_degraded: bool },
}

/// The ingestion-and-notification pipeline: fetch from all sources, filter
/// against the seen-set, summarize and notify each candidate, then persist
/// the seen-set and checkpoint.
pub struct Pipeline {
    sources: Vec<Box<dyn FetchSource>>,
    summarizer: Box<dyn Summarizer>,
    notifier: Box<dyn Notifier>,
    seen_store: SeenSetStore,
    checkpoint_store: CheckpointStore,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        summarizer: Box<dyn Summarizer>,
        notifier: Box<dyn Notifier>,
        seen_store: SeenSetStore,
        checkpoint_store: CheckpointStore,
        options: PipelineOptions,
    ) -> Self {
        Self {
            sources: Vec::new(),
            summarizer,
            notifier,
            seen_store,
            checkpoint_store,
            options,
        }
    }

    pub fn add_source(&mut self, source: Box<dyn FetchSource>) {
        info!("Adding source to pipeline: {}", source.source_name());
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn FetchSource>) -> Self {
        self.add_source(source);
        self
    }

    /// Run exactly one polling cycle.
    ///
    /// Source and candidate failures are absorbed (they only show up in the
    /// report); an `Err` from this function means state persistence failed,
    /// in which case the checkpoint is not advanced so nothing already
    /// notified can be silently forgotten.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started_at = Utc::now();
        let mut seen = self.seen_store.load();
        let checkpoint = self.checkpoint_store.load();

        match checkpoint {
            Some(ts) => info!("Starting cycle, checking papers since {}", ts),
            None => info!("Starting cycle, no checkpoint yet, checking recent papers"),
        }

        // 1. Fetch from every source; one source failing must not starve the rest
        let mut fetched: Vec<PaperRecord> = Vec::new();
        let mut sources_failed = 0;
        for source in &self.sources {
            let name = source.source_name();
            match source
                .fetch(&self.options.query, checkpoint, self.options.fetch_limit)
                .await
            {
                Ok(papers) => {
                    info!("Fetched {} papers from {}", papers.len(), name);
                    fetched.extend(papers);
                }
                Err(e) => {
                    sources_failed += 1;
                    warn!("Fetch from {} failed, skipping this source: {}", name, e);
                }
            }
        }

        // 2. Filter against the seen-set loaded at cycle start. The filter
        // runs once, up front: the same id appearing in two sources within
        // one batch is processed twice.
        let total_fetched = fetched.len();
        let candidates: Vec<PaperRecord> = fetched
            .into_iter()
            .filter(|p| !seen.contains(&p.id))
            .collect();
        info!(
            "{} of {} fetched papers are new",
            candidates.len(),
            total_fetched
        );

        // 3. Drive each candidate through summarize-then-notify, sequentially
        let mut notified = 0;
        let mut notify_failures = 0;
        let mut summary_failures = 0;
        for paper in &candidates {
            info!("Processing new paper: {} ({})", paper.title, paper.source);
            match self.process_candidate(paper).await {
                CandidateOutcome::Notified { summary_degraded } => {
                    seen.insert(paper.id.clone());
                    notified += 1;
                    if summary_degraded {
                        summary_failures += 1;
                    }
                    if !self.options.notify_pause.is_zero() {
                        tokio::time::sleep(self.options.notify_pause).await;
                    }
                }
                CandidateOutcome::NotifyFailed { summary_degraded } => {
                    notify_failures += 1;
                    if summary_degraded {
                        summary_failures += 1;
                    }
                }
            }
        }

        // 4. Tell the channel when a cycle produced nothing
        let mut no_update_notice_sent = false;
        if notified == 0 && self.options.no_update_notice {
            info!("No new papers notified, sending no-update notice");
            match self.notifier.notify_plain(&self.options.no_update_message).await {
                Ok(()) => no_update_notice_sent = true,
                Err(e) => warn!("Failed to send no-update notice: {}", e),
            }
        }

        // 5. Persist. Seen-set first: if it cannot be made durable the
        // checkpoint must not advance, otherwise a crash here would re-fetch
        // a window we already notified from without the ids that were sent.
        if let Err(e) = self.seen_store.save(&seen) {
            error!("Failed to persist seen-set, leaving checkpoint untouched: {}", e);
            return Err(e);
        }
        let next_checkpoint = match checkpoint {
            // Never move the checkpoint backwards, even if the clock did
            Some(prev) if prev > started_at => prev,
            _ => started_at,
        };
        self.checkpoint_store.save(next_checkpoint)?;

        let report = CycleReport {
            started_at,
            checkpoint,
            fetched: total_fetched,
            sources_failed,
            candidates: candidates.len(),
            notified,
            notify_failures,
            summary_failures,
            no_update_notice_sent,
        };
        info!(
            "Cycle complete: {} notified, {} failed, {} fetched",
            report.notified, report.notify_failures, report.fetched
        );
        Ok(report)
    }

    /// Summarize-then-notify for one candidate. A summarizer error degrades
    /// the summary to visible error text rather than losing the paper; only
    /// the notify result decides whether the id enters the seen-set.
    async fn process_candidate(&self, paper: &PaperRecord) -> CandidateOutcome {
        let (summary, summary_degraded) = match self.summarizer.summarize(paper).await {
            Ok(summary) => (summary, false),
            Err(e) => {
                warn!("Summarization failed for {}: {}", paper.id, e);
                (format!("要約の生成に失敗しました: {e}"), true)
            }
        };

        match self.notifier.notify(paper, &summary).await {
            Ok(()) => CandidateOutcome::Notified { summary_degraded },
            Err(e) => {
                warn!(
                    "Notification failed for {}, will retry in a later cycle if still in range: {}",
                    paper.id, e
                );
                CandidateOutcome::NotifyFailed { summary_degraded }
            }
        }
    }

    /// Run cycles forever, sleeping `cycle_interval` between them.
    ///
    /// `shutdown` is only honored between cycles: it is checked before each
    /// cycle and raced against the inter-cycle sleep, never interrupting an
    /// in-flight notification.
    pub async fn run_forever(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting polling loop with {} sources, interval {:?}",
            self.sources.len(),
            self.options.cycle_interval
        );

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, stopping polling loop");
                return;
            }

            if let Err(e) = self.run_cycle().await {
                // Persistence failure: loudly logged, retried next cycle
                error!("Cycle failed: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.options.cycle_interval) => {}
                _ = shutdown.changed() => {
                    info!("Shutdown requested during sleep, stopping polling loop");
                    return;
                }
            }
        }
    }
}
