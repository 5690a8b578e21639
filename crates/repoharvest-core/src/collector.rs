//! Paginated repository search
//!
//! Walks every query page by page, strictly in order, on a single
//! credential. A failed page ends that query only; everything gathered so
//! far is kept.

use tracing::{debug, info, warn};

use crate::client::GitHubClient;
use crate::credentials::Credential;
use crate::types::{PageRequest, RawRecord, SEARCH_PAGE_SIZE};

/// Pages fetched per query unless configured otherwise
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Configuration for the search collector
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Items requested per page (default: 100)
    pub per_page: u32,
    /// End a query at its first empty page instead of requesting the rest
    /// (default: false)
    pub stop_on_empty_page: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            per_page: SEARCH_PAGE_SIZE,
            stop_on_empty_page: false,
        }
    }
}

/// Drives repository search across queries and pages
#[derive(Debug, Clone)]
pub struct SearchCollector {
    client: GitHubClient,
    config: CollectorConfig,
}

impl SearchCollector {
    pub fn new(client: GitHubClient) -> Self {
        Self::with_config(client, CollectorConfig::default())
    }

    pub fn with_config(client: GitHubClient, config: CollectorConfig) -> Self {
        Self { client, config }
    }

    /// Run every query for pages `1..=max_pages`
    ///
    /// # Arguments
    /// * `queries` - Search strings, processed in order
    /// * `credential` - Token used for every page
    /// * `max_pages` - Highest page number requested per query
    ///
    /// # Returns
    /// All items, in query order then page order. Failures are logged and
    /// never returned.
    pub async fn collect<S: AsRef<str>>(
        &self,
        queries: &[S],
        credential: &Credential,
        max_pages: u32,
    ) -> Vec<RawRecord> {
        let mut records = Vec::new();

        for query in queries {
            let query = query.as_ref();
            if query.trim().is_empty() {
                warn!("Skipping blank search query");
                continue;
            }

            let before = records.len();
            let pages = self
                .collect_query(query, credential, max_pages, &mut records)
                .await;
            info!(
                query,
                pages,
                items = records.len() - before,
                total = records.len(),
                "Finished query"
            );
        }

        records
    }

    /// Fetch the pages of one query into `records`
    ///
    /// Returns the number of pages that were fetched successfully.
    async fn collect_query(
        &self,
        query: &str,
        credential: &Credential,
        max_pages: u32,
        records: &mut Vec<RawRecord>,
    ) -> u32 {
        let mut fetched = 0;

        for page in 1..=max_pages {
            let request = PageRequest {
                query,
                page,
                per_page: self.config.per_page,
            };

            match self.client.search_repositories(&request, credential).await {
                Ok(items) => {
                    fetched += 1;
                    debug!(query, page, items = items.len(), "Fetched search page");
                    let empty = items.is_empty();
                    records.extend(items);
                    if empty && self.config.stop_on_empty_page {
                        debug!(query, page, "Empty page, ending query");
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        query,
                        page,
                        kind = %e.kind(),
                        error = %e,
                        "Search page failed, abandoning remaining pages"
                    );
                    break;
                }
            }
        }

        fetched
    }
}
