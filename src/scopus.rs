//! Elsevier Scopus API client and search paginator.
//!
//! Every request carries the `X-ELS-APIKey` header and asks for JSON.
//! Requests are issued one at a time; nothing here fans out.

use crate::config::ScopusConfig;
use crate::document::RawEntry;
use crate::error::{Result, ScopusError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Header carrying the Elsevier API key
const API_KEY_HEADER: &str = "X-ELS-APIKey";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Thin wrapper around a `reqwest::Client` bound to one API key.
#[derive(Debug, Clone)]
pub struct ScopusClient {
    client: Client,
    api_key: String,
    search_url: Url,
    abstract_url: String,
}

impl ScopusClient {
    pub fn new(config: &ScopusConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("rustscopus/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScopusError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let search_url = Url::parse(&config.search_url)
            .map_err(|e| ScopusError::Config(format!("invalid search URL: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            search_url,
            abstract_url: config.abstract_url.clone(),
        })
    }

    /// Abstract-retrieval URL for a DOI.
    pub fn abstract_url(&self, doi: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.abstract_url, doi.trim()))
            .map_err(|e| ScopusError::Parse(format!("invalid abstract URL for {}: {}", doi, e)))
    }

    /// GET an arbitrary API URL (e.g. a record's own link) and decode JSON.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let url = Url::parse(url)
            .map_err(|e| ScopusError::Parse(format!("invalid link {:?}: {}", url, e)))?;
        self.send(self.client.get(url)).await
    }

    /// Fetch one page of search results starting at `start`.
    pub async fn search_page(&self, query: &str, start: usize, count: usize) -> Result<SearchPage> {
        let request = self.client.get(self.search_url.clone()).query(&[
            ("query", query.to_string()),
            ("start", start.to_string()),
            ("count", count.to_string()),
        ]);
        let body: SearchEnvelope = serde_json::from_value(self.send(request).await?)
            .map_err(|e| ScopusError::Parse(format!("Failed to parse search response: {}", e)))?;

        let raw = body.results.map(|r| r.entry).unwrap_or_default();
        let returned = raw.len();
        let mut entries = Vec::with_capacity(returned);
        for value in raw {
            match serde_json::from_value::<RawEntry>(value) {
                // Scopus reports an empty result set as a single entry carrying `error`.
                Ok(entry) if entry.error.is_some() => {
                    debug!(error = ?entry.error, "Search returned an error entry");
                }
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(start = start, error = %e, "Skipping malformed search entry"),
            }
        }
        Ok(SearchPage { entries, returned })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ScopusError::Api {
                code: status.as_u16(),
                message: format!("Scopus API error: {} {}", status, text.trim()),
            });
        }

        Ok(response.json().await?)
    }
}

/// One page of search results.
#[derive(Debug, Default)]
pub struct SearchPage {
    /// Usable entries, in API order
    pub entries: Vec<RawEntry>,
    /// Entries the API sent, including skipped ones
    pub returned: usize,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "search-results")]
    results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entry: Vec<Value>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Everything collected by one paginated search.
#[derive(Debug, Default)]
pub struct Pagination {
    /// Raw entries in the order the API returned them
    pub entries: Vec<RawEntry>,
    /// Pages successfully fetched
    pub pages: usize,
    /// Error that stopped pagination early, if any
    pub interrupted: Option<ScopusError>,
}

/// Page through the search API until a short page or the first failure.
///
/// A failure keeps whatever was already collected.
pub async fn collect_entries(
    client: &ScopusClient,
    query: &str,
    page_size: usize,
) -> Pagination {
    let mut pagination = Pagination::default();
    let mut start = 0;

    info!(page_size = page_size, "Starting Scopus search");

    loop {
        debug!(start = start, "Fetching search page");
        match client.search_page(query, start, page_size).await {
            Ok(page) => {
                pagination.entries.extend(page.entries);
                pagination.pages += 1;
                // Short-page check uses the raw count; skipped entries still fill a page.
                if page.returned < page_size {
                    break;
                }
                start += page_size;
            }
            Err(e) => {
                warn!(start = start, error = %e, "Search page failed, keeping partial results");
                pagination.interrupted = Some(e);
                break;
            }
        }
    }

    info!(
        total = pagination.entries.len(),
        pages = pagination.pages,
        "Scopus search complete"
    );
    pagination
}
