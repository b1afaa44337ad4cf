use crate::traits::Notifier;
use crate::types::{BotError, PaperRecord, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Discord caps embed descriptions at 4096 characters.
const EMBED_DESCRIPTION_LIMIT: usize = 4096;
const EMBED_COLOR_BLUE: u32 = 3_447_003;

/// Notifier that posts paper announcements to a Discord webhook as embeds.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            webhook_url,
        }
    }

    async fn post(&self, payload: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        // Discord answers 204 without ?wait=true, 200 with it
        let status = response.status();
        if status.as_u16() == 200 || status.as_u16() == 204 {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(BotError::Notify(format!("Discord webhook returned {status}: {text}")))
        }
    }
}

/// Clamps `text` to at most `max` characters, ending with an ellipsis when
/// anything was cut.
fn clamp_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clamped: String = text.chars().take(max.saturating_sub(3)).collect();
    clamped.push_str("...");
    clamped
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, paper: &PaperRecord, summary: &str) -> Result<()> {
        debug!("Sending Discord notification for {}", paper.id);

        let footer = format!(
            "Source: {} | DOI: {}",
            paper.source,
            paper.doi.as_deref().unwrap_or("N/A")
        );
        let payload = json!({
            "content": format!("**New Paper from {}!**\nDirect Link: {}", paper.source, paper.url),
            "embeds": [{
                "title": paper.title,
                "url": paper.url,
                "description": clamp_chars(summary, EMBED_DESCRIPTION_LIMIT),
                "color": EMBED_COLOR_BLUE,
                "footer": {"text": footer},
            }],
        });

        self.post(payload).await
    }

    async fn notify_plain(&self, message: &str) -> Result<()> {
        debug!("Sending plain Discord message");
        self.post(json!({"content": message})).await
    }
}
