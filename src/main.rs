use anyhow::Context;
use clap::Parser;
use paperwave::{
    ArxivSource, BotConfig, CheckpointStore, DiscordNotifier, LmStudioSummarizer, Pipeline,
    PipelineOptions, ScopusSource, SeenSetStore,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "paperwave", about = "Academic paper notification bot")]
struct Cli {
    /// Run exactly one polling cycle and exit
    #[arg(long)]
    once: bool,

    /// Override the search query from the environment
    #[arg(long)]
    query: Option<String>,

    /// Override the polling interval in seconds
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = BotConfig::from_env().context("Failed to load configuration")?;

    let options = PipelineOptions {
        query: cli.query.unwrap_or_else(|| config.search_query.clone()),
        fetch_limit: config.fetch_limit,
        notify_pause: config.notify_pause,
        cycle_interval: cli
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(config.fetch_interval),
        ..PipelineOptions::default()
    };

    info!(
        "Starting paperwave (interval: {:?}, query: {})",
        options.cycle_interval, options.query
    );

    let mut pipeline = Pipeline::new(
        Box::new(LmStudioSummarizer::new(
            config.llm_base_url.clone(),
            config.llm_model.clone(),
        )),
        Box::new(DiscordNotifier::new(config.discord_webhook_url.clone())),
        SeenSetStore::new(&config.seen_set_path),
        CheckpointStore::new(&config.checkpoint_path),
        options,
    );

    pipeline.add_source(Box::new(ArxivSource::new()));
    match &config.elsevier_api_key {
        Some(key) => pipeline.add_source(Box::new(ScopusSource::new(key.clone()))),
        None => warn!("ELSEVIER_API_KEY not set, Scopus source disabled"),
    }

    if cli.once {
        let report = pipeline.run_cycle().await?;
        info!(
            "Single cycle finished: {} fetched, {} candidates, {} notified",
            report.fetched, report.candidates, report.notified
        );
        return Ok(());
    }

    // Shutdown is only honored between cycles; ctrl-c flips the flag and the
    // loop exits before the next fetch or during the inter-cycle sleep.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received ctrl-c, shutting down after the current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    pipeline.run_forever(shutdown_rx).await;
    info!("paperwave stopped");
    Ok(())
}
