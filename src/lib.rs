pub mod config;
pub mod notifier;
pub mod pipeline;
pub mod sources;
pub mod store;
pub mod summarizer;
pub mod traits;
pub mod types;

pub use config::BotConfig;
pub use notifier::DiscordNotifier;
pub use pipeline::{CycleReport, Pipeline, PipelineOptions};
pub use sources::{ArxivSource, ScopusSource};
pub use store::{CheckpointStore, SeenSetStore};
pub use summarizer::LmStudioSummarizer;
pub use traits::{FetchSource, Notifier, Summarizer};
pub use types::*;
