//! Quota-aware HTTP client for the GitHub REST API
//!
//! Every request goes through the credential's [`QuotaGate`](crate::QuotaGate):
//! the gate is consulted before the request is sent and fed the quota headers
//! of whatever response comes back, so an exhausted budget delays the next
//! call on that credential rather than the one that observed it.

use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::credentials::Credential;
use crate::error::{HarvestError, Result};
use crate::quota::{QuotaSnapshot, resource_for_path, resource_from_headers};
use crate::types::{DetailKind, PageRequest, RawRecord};
use crate::url::{DEFAULT_BASE_URL, SEARCH_REPOSITORIES_PATH, build_detail_path, join_url};

const USER_AGENT: &str = concat!("repoharvest/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API endpoint (default: `https://api.github.com`)
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Retry attempts for transient errors (default: 0)
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 0,
        }
    }
}

/// HTTP client wrapper with quota tracking and optional retries
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl GitHubClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static(ACCEPT),
                );
                headers
            })
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a JSON document from a path on the API
    ///
    /// # Arguments
    /// * `path` - Absolute API path (e.g., "/users/octocat")
    /// * `query` - Query-string parameters
    /// * `credential` - Token to authorize with; its quota gate is updated
    ///
    /// # Errors
    /// - `Network` - Transport failure
    /// - `Http` - Non-2xx status
    /// - `MalformedResponse` - Body is not JSON
    pub async fn fetch_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        credential: &Credential,
    ) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        let resource = resource_for_path(path);
        let mut attempt = 0;

        loop {
            match self.do_fetch(&url, resource, query, credential).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s
                    let backoff = Duration::from_secs(1 << attempt.min(6));
                    debug!(
                        url = %url,
                        attempt = attempt + 1,
                        backoff_secs = backoff.as_secs(),
                        error = %e,
                        "Retrying transient failure"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Perform a single request attempt
    async fn do_fetch(
        &self,
        url: &str,
        resource: &str,
        query: &[(&str, String)],
        credential: &Credential,
    ) -> Result<Value> {
        credential.quota().acquire(resource).await;

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(credential.token())
            .send()
            .await?;

        if let Some(snapshot) = QuotaSnapshot::from_headers(response.headers()) {
            let resource = resource_from_headers(response.headers()).unwrap_or(resource);
            credential.quota().observe(resource, snapshot).await;
            if snapshot.remaining == 0 {
                warn!(
                    credential = credential.label(),
                    resource,
                    reset_at = snapshot.reset_at,
                    "Quota exhausted"
                );
            }
        }

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| HarvestError::MalformedResponse(format!("{url}: {e}")))
    }

    /// Fetch one page of repository search results
    ///
    /// # Returns
    /// The page's `items`, possibly empty
    ///
    /// # Errors
    /// Any `fetch_json` error, or `MalformedResponse` if the body has no
    /// `items` array
    pub async fn search_repositories(
        &self,
        request: &PageRequest<'_>,
        credential: &Credential,
    ) -> Result<Vec<RawRecord>> {
        let body = self
            .fetch_json(SEARCH_REPOSITORIES_PATH, &request.query_params(), credential)
            .await?;

        let Value::Object(mut body) = body else {
            return Err(HarvestError::MalformedResponse(
                "search response is not an object".to_string(),
            ));
        };
        let Some(Value::Array(items)) = body.remove("items") else {
            return Err(HarvestError::MalformedResponse(
                "search response has no items array".to_string(),
            ));
        };

        // Non-object entries carry nothing we can map
        Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect())
    }

    /// Fetch the detail record of a user or organization
    ///
    /// # Errors
    /// - `InvalidIdentifier` if `login` is not a valid login (no request is made)
    /// - Any `fetch_json` error
    /// - `MalformedResponse` if the body is not a JSON object
    pub async fn get_detail(
        &self,
        kind: DetailKind,
        login: &str,
        credential: &Credential,
    ) -> Result<RawRecord> {
        let path = build_detail_path(kind, login)?;
        match self.fetch_json(&path, &[], credential).await? {
            Value::Object(record) => Ok(record),
            other => Err(HarvestError::MalformedResponse(format!(
                "{kind} {login}: expected object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
