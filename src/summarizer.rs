use crate::traits::Summarizer;
use crate::types::{BotError, PaperRecord, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "あなたは優秀な研究助手です。論文の内容を日本語で分かりやすく、指定されたフォーマットで正確に要約・翻訳してください。";

/// Summarizer backed by an OpenAI-compatible chat completion endpoint
/// (LM Studio by default). Produces a Japanese translated title, a
/// structured five-question summary, and an APA citation.
pub struct LmStudioSummarizer {
    client: Client,
    base_url: String,
    model: String,
}

impl LmStudioSummarizer {
    pub fn new(base_url: String, model: String) -> Self {
        // Local models can take a while on long abstracts
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn build_prompt(paper: &PaperRecord) -> String {
        format!(
            r#"以下の論文のタイトルと要約を日本語に翻訳し、指定されたフォーマットで要点をまとめてください。
また、APA形式の引用（英語のまま）も作成してください。

【メタデータ】
タイトル: {title}
著者: {authors}
公開日: {published}
DOI: {doi}
URL: {url}
要約 (Abstract): {abstract_text}

出力形式:
【日本語タイトル】
**（ここに日本語のタイトルを太字で記入）**

【詳細要約】
``・どんなもの?``
（回答）
``・先行研究と比べてどこがすごい?``
（回答）
``・技術や手法のキモはどこ?``
（回答）
``・どうやって有効だと検証した?``
（回答）
``・議論はある?``
（回答）

【APA引用】
（ここにAPA形式の引用文。DOIやURLも含めること。この項目のみ英語のままで出力してください）
"#,
            title = paper.title,
            authors = paper.authors,
            published = paper.published_at.format("%Y-%m-%d"),
            doi = paper.doi.as_deref().unwrap_or(""),
            url = paper.url,
            abstract_text = paper.abstract_text,
        )
    }
}

/// Removes `<think>...</think>` blocks that reasoning models may emit
/// before the actual answer.
fn strip_think_blocks(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("<think>") {
        result.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            // Unterminated block: drop everything after the opening tag
            None => {
                rest = "";
                break;
            }
        }
    }
    result.push_str(rest);
    result.trim().to_string()
}

#[async_trait]
impl Summarizer for LmStudioSummarizer {
    async fn summarize(&self, paper: &PaperRecord) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting summary for {} from {}", paper.id, url);

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_prompt(paper)},
            ],
            "temperature": 0.7,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Llm(format!("LLM API error {status}: {text}")));
        }

        let json: Value = response.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| BotError::Llm("No content in LLM response".to_string()))?;

        Ok(strip_think_blocks(content))
    }
}
