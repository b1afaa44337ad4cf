use crate::traits::FetchSource;
use crate::types::{BotError, PaperRecord, PaperSource, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Paper source backed by the arXiv Atom query API.
pub struct ArxivSource {
    client: Client,
}

impl ArxivSource {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    fn query_url(query: &str, limit: usize) -> Result<Url> {
        let url = Url::parse_with_params(
            ARXIV_API_URL,
            &[
                ("search_query", format!("all:{query}")),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
                ("max_results", limit.to_string()),
            ],
        )?;
        Ok(url)
    }
}

impl Default for ArxivSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps an arXiv Atom document to paper records, dropping entries published
/// at or before `since`.
fn parse_atom(content: &str, since: Option<DateTime<Utc>>) -> Result<Vec<PaperRecord>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| BotError::Feed(format!("Failed to parse arXiv feed: {e}")))?;

    let mut papers = Vec::new();
    for entry in feed.entries {
        let published_at = match entry.published {
            Some(ts) => ts.with_timezone(&Utc),
            None => {
                debug!("Skipping arXiv entry without publication date: {}", entry.id);
                continue;
            }
        };

        if let Some(since) = since {
            if published_at <= since {
                continue;
            }
        }

        let url = match entry.links.first() {
            Some(link) => link.href.clone(),
            None => {
                debug!("Skipping arXiv entry without link: {}", entry.id);
                continue;
            }
        };

        let authors: Vec<String> = entry.authors.into_iter().map(|a| a.name).collect();

        papers.push(PaperRecord {
            id: entry.id,
            title: entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string()),
            abstract_text: entry
                .summary
                .map(|s| s.content)
                .unwrap_or_else(|| "No abstract available.".to_string()),
            url,
            // The arxiv:doi extension is not part of the Atom model feed-rs
            // exposes, so the DOI stays unset for arXiv records
            doi: None,
            authors: authors.join(", "),
            published_at,
            source: PaperSource::ArXiv,
        });
    }

    Ok(papers)
}

#[async_trait]
impl FetchSource for ArxivSource {
    fn source_name(&self) -> String {
        "arXiv".to_string()
    }

    async fn fetch(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<PaperRecord>> {
        let url = Self::query_url(query, limit)?;
        debug!("Fetching arXiv feed: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BotError::Feed(format!(
                "arXiv API returned HTTP {}",
                response.status()
            )));
        }

        let content = response.text().await?;
        parse_atom(&content, since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query Results</title>
  <id>http://arxiv.org/api/example</id>
  <updated>2024-05-02T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2405.00001v1</id>
    <title>Decoding EEG Signals with Transformers</title>
    <summary>We present a transformer model for EEG decoding.</summary>
    <published>2024-05-01T12:00:00Z</published>
    <updated>2024-05-01T12:00:00Z</updated>
    <link href="http://arxiv.org/abs/2405.00001v1" rel="alternate"/>
    <author><name>Alice Example</name></author>
    <author><name>Bob Example</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2404.09999v2</id>
    <title>An Older BCI Paper</title>
    <summary>Older work on brain-computer interfaces.</summary>
    <published>2024-04-10T09:30:00Z</published>
    <updated>2024-04-11T09:30:00Z</updated>
    <link href="http://arxiv.org/abs/2404.09999v2" rel="alternate"/>
    <author><name>Carol Example</name></author>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_into_paper_records() {
        let papers = parse_atom(SAMPLE_FEED, None).unwrap();
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.id, "http://arxiv.org/abs/2405.00001v1");
        assert_eq!(first.title, "Decoding EEG Signals with Transformers");
        assert_eq!(first.url, "http://arxiv.org/abs/2405.00001v1");
        assert_eq!(first.authors, "Alice Example, Bob Example");
        assert_eq!(first.source, PaperSource::ArXiv);
        assert!(first.doi.is_none());
        assert_eq!(
            first.published_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn since_filter_drops_older_entries() {
        let since = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        let papers = parse_atom(SAMPLE_FEED, Some(since)).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].id, "http://arxiv.org/abs/2405.00001v1");
    }

    #[test]
    fn since_filter_is_exclusive_of_the_boundary() {
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let papers = parse_atom(SAMPLE_FEED, Some(since)).unwrap();
        assert!(papers.is_empty());
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let result = parse_atom("not a feed at all", None);
        assert!(matches!(result, Err(BotError::Feed(_))));
    }

    #[test]
    fn query_url_encodes_the_search_query() {
        let url = ArxivSource::query_url(r#""brain waves" OR EEG"#, 5).unwrap();
        let s = url.as_str();
        assert!(s.starts_with(ARXIV_API_URL));
        assert!(s.contains("max_results=5"));
        assert!(s.contains("sortBy=submittedDate"));
        assert!(!s.contains('"'));
    }
}
