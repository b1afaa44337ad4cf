use crate::traits::FetchSource;
use crate::types::{BotError, PaperRecord, PaperSource, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SCOPUS_SEARCH_URL: &str = "https://api.elsevier.com/content/search/scopus";
const ABSTRACT_RETRIEVAL_URL: &str = "https://api.elsevier.com/content/abstract/eid";
const NO_ABSTRACT_PLACEHOLDER: &str = "No abstract available.";

/// Paper source backed by the Elsevier Scopus Search API.
///
/// The STANDARD search view often omits abstracts, so entries without a
/// `dc:description` get a second request against the Abstract Retrieval API
/// before falling back to a placeholder.
pub struct ScopusSource {
    client: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "search-results")]
    search_results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entry: Vec<ScopusEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ScopusEntry {
    #[serde(rename = "dc:identifier")]
    identifier: Option<String>,
    #[serde(default)]
    eid: Option<String>,
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "dc:description")]
    description: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
    #[serde(default)]
    link: Vec<ScopusLink>,
}

#[derive(Debug, Deserialize)]
struct ScopusLink {
    #[serde(rename = "@ref")]
    link_ref: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// Scopus cover dates have day precision; unparseable dates collapse to the
/// minimum timestamp, which any checkpoint filters out.
fn parse_cover_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Maps one search hit to a paper record plus the eid to use for abstract
/// backfill when the hit carried no description. Entries without any usable
/// identifier, or published at or before `since`, map to `None`.
fn map_entry(
    entry: ScopusEntry,
    since: Option<DateTime<Utc>>,
) -> Option<(PaperRecord, Option<String>)> {
    let published_at = parse_cover_date(entry.cover_date.as_deref());
    if let Some(since) = since {
        if published_at <= since {
            return None;
        }
    }

    let id = entry
        .identifier
        .clone()
        .or_else(|| entry.eid.clone())
        .filter(|id| !id.is_empty())?;

    let url = entry
        .link
        .iter()
        .find(|l| l.link_ref.as_deref() == Some("scopus"))
        .and_then(|l| l.href.clone())
        .unwrap_or_default();

    let needs_abstract = entry.description.is_none();
    let backfill_eid = if needs_abstract { entry.eid.clone() } else { None };

    let record = PaperRecord {
        id,
        title: entry.title.unwrap_or_else(|| "No Title".to_string()),
        abstract_text: entry
            .description
            .unwrap_or_else(|| NO_ABSTRACT_PLACEHOLDER.to_string()),
        url,
        doi: entry.doi.filter(|d| !d.is_empty()),
        authors: entry.creator.unwrap_or_else(|| "Unknown Authors".to_string()),
        published_at,
        source: PaperSource::Scopus,
    };

    Some((record, backfill_eid))
}

impl ScopusSource {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, api_key }
    }

    /// Fetch the full abstract for one document from the Abstract Retrieval
    /// API. Any failure degrades to `None`; the record keeps its placeholder.
    async fn fetch_abstract(&self, eid: &str) -> Option<String> {
        let url = format!("{ABSTRACT_RETRIEVAL_URL}/{eid}");
        let response = self
            .client
            .get(&url)
            .header("X-ELS-APIKey", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Abstract retrieval for {} returned HTTP {}", eid, r.status());
                return None;
            }
            Err(e) => {
                warn!("Abstract retrieval for {} failed: {}", eid, e);
                return None;
            }
        };

        let json: Value = response.json().await.ok()?;
        json["abstracts-retrieval-response"]["coredata"]["dc:description"]
            .as_str()
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl FetchSource for ScopusSource {
    fn source_name(&self) -> String {
        "Scopus".to_string()
    }

    async fn fetch(
        &self,
        query: &str,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<PaperRecord>> {
        debug!("Searching Scopus for: {}", query);

        let response = self
            .client
            .get(SCOPUS_SEARCH_URL)
            .header("X-ELS-APIKey", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("query", format!("TITLE-ABS-KEY({query})")),
                ("count", limit.to_string()),
                ("sort", "-pubdate".to_string()),
                ("view", "STANDARD".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::Feed(format!(
                "Scopus API returned HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response.json().await?;

        let mut papers = Vec::new();
        for entry in parsed.search_results.entry {
            let Some((mut record, backfill_eid)) = map_entry(entry, since) else {
                continue;
            };
            if let Some(eid) = backfill_eid {
                debug!("Abstract missing for {}, trying individual retrieval", record.title);
                if let Some(text) = self.fetch_abstract(&eid).await {
                    record.abstract_text = text;
                }
            }
            papers.push(record);
        }

        Ok(papers)
    }
}
