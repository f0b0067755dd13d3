//! Web-search adapters.
//!
//! * [`DuckDuckGoSearch`] posts to the keyless HTML endpoint and scrapes the
//!   result blocks.
//! * [`TavilySearch`] calls the Tavily JSON API and needs `TAVILY_API_KEY`.

use crate::collab::{SearchHit, WebSearch};
use crate::error::WorkflowError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result").expect("valid result selector"));
static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("valid result link selector"));
static RESULT_SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("valid snippet selector"));

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, WorkflowError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| WorkflowError::Internal(format!("http client: {e}")))
}

/// Keyless DuckDuckGo search over the HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(timeout_secs: u64) -> Result<Self, WorkflowError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WorkflowError> {
        let failed = |detail: String| WorkflowError::Search {
            query: query.to_string(),
            detail,
        };

        let response = self
            .client
            .post(DDG_HTML_ENDPOINT)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;

        let hits = parse_duckduckgo_html(&body, max_results);
        debug!("DuckDuckGo '{}': {} hits", query, hits.len());
        Ok(hits)
    }
}

/// Pull result blocks out of the HTML endpoint's page.
///
/// Each `.result` block yields one hit; its snippet is looked up inside the
/// same block, so a result without one gets an empty body. Sponsored blocks
/// (`result--ad`) and blocks without a title link are skipped.
pub(crate) fn parse_duckduckgo_html(body: &str, max_results: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(body);
    document
        .select(&RESULT)
        .filter(|block| !block.value().classes().any(|c| c == "result--ad"))
        .filter_map(|block| {
            let link = block.select(&RESULT_LINK).next()?;
            let href = link.value().attr("href")?;
            Some(SearchHit {
                title: element_text(link),
                url: resolve_redirect(href),
                body: block
                    .select(&RESULT_SNIPPET)
                    .next()
                    .map(element_text)
                    .unwrap_or_default(),
            })
        })
        .take(max_results)
        .collect()
}

/// Decoded text content with runs of whitespace collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result links go through `//duckduckgo.com/l/?uddg=<target>`; return the
/// target when present.
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    reqwest::Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Tavily search API client.
#[derive(Clone)]
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for TavilySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilySearch").field("api_key", &"***").finish()
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self, WorkflowError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl WebSearch for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, WorkflowError> {
        let failed = |detail: String| WorkflowError::Search {
            query: query.to_string(),
            detail,
        };

        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&TavilyRequest {
                api_key: &self.api_key,
                query,
                max_results,
            })
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        let parsed: TavilyResponse = response.json().await.map_err(|e| failed(e.to_string()))?;

        debug!("Tavily '{}': {} hits", query, parsed.results.len());
        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                body: r.content,
            })
            .collect())
    }
}
