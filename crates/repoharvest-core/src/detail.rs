//! Concurrent user and organization lookups
//!
//! One task per unique identifier, at most `concurrency` of them in flight.
//! A failing identifier is logged and dropped; it never affects the others.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::client::GitHubClient;
use crate::credentials::CredentialPool;
use crate::error::{HarvestError, Result};
use crate::types::{DetailKind, RawRecord};

/// Worker pool size unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 100;

/// Outcome counts of one `fetch_all` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailReport {
    /// Unique identifiers dispatched
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Remove duplicate and blank identifiers, keeping first-seen order
pub fn dedup_identifiers<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .filter_map(|id| {
            let id = id.as_ref().trim();
            (!id.is_empty() && seen.insert(id.to_string())).then(|| id.to_string())
        })
        .collect()
}

/// Fans detail lookups out over a bounded worker pool
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    client: Arc<GitHubClient>,
    concurrency: usize,
}

impl DetailFetcher {
    /// # Errors
    /// `InvalidConfig` if `concurrency` is zero
    pub fn new(client: Arc<GitHubClient>, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(HarvestError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            client,
            concurrency,
        })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch the detail record of every identifier
    ///
    /// Result order is unspecified. Returns once every dispatched lookup has
    /// finished.
    pub async fn fetch_all<I, S>(
        &self,
        identifiers: I,
        kind: DetailKind,
        credentials: &CredentialPool,
    ) -> Vec<RawRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fetch_all_with_report(identifiers, kind, credentials)
            .await
            .0
    }

    /// Like [`fetch_all`](Self::fetch_all), also returning outcome counts
    pub async fn fetch_all_with_report<I, S>(
        &self,
        identifiers: I,
        kind: DetailKind,
        credentials: &CredentialPool,
    ) -> (Vec<RawRecord>, DetailReport)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique = dedup_identifiers(identifiers);
        let mut report = DetailReport {
            requested: unique.len(),
            ..DetailReport::default()
        };

        if unique.is_empty() {
            return (Vec::new(), report);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        info!(
            kind = %kind,
            count = unique.len(),
            concurrency = self.concurrency,
            "Fetching details"
        );

        let mut handles = Vec::with_capacity(unique.len());

        for (position, identifier) in unique.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let credential = credentials.credential_for(position).clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            identifier,
                            Err(HarvestError::InvalidConfig(
                                "worker pool closed unexpectedly".to_string(),
                            )),
                        );
                    }
                };

                let result = client.get_detail(kind, &identifier, &credential).await;
                (identifier, result)
            });

            handles.push(handle);
        }

        let mut records = Vec::with_capacity(handles.len());

        for handle in handles {
            match handle.await {
                Ok((identifier, Ok(record))) => {
                    debug!(kind = %kind, identifier = %identifier, "Fetched detail");
                    report.succeeded += 1;
                    records.push(record);
                }
                Ok((identifier, Err(e))) => {
                    warn!(
                        kind = %kind,
                        identifier = %identifier,
                        error_kind = %e.kind(),
                        error = %e,
                        "Detail fetch failed"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    error!(kind = %kind, error = %e, "Detail task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            kind = %kind,
            succeeded = report.succeeded,
            failed = report.failed,
            "Finished details"
        );

        (records, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_identifiers() {
        let unique = dedup_identifiers(["alice", "bob", "alice", " bob ", "", "carol", "   "]);
        assert_eq!(unique, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_dedup_identifiers_is_case_sensitive() {
        let unique = dedup_identifiers(vec!["Alice".to_string(), "alice".to_string()]);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let client = Arc::new(GitHubClient::new().unwrap());
        assert!(matches!(
            DetailFetcher::new(client, 0),
            Err(HarvestError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_input_returns_immediately() {
        let client = Arc::new(GitHubClient::new().unwrap());
        let fetcher = DetailFetcher::new(client, DEFAULT_CONCURRENCY).unwrap();
        let pool = CredentialPool::single(crate::Credential::new("t", "t"));
        let (records, report) = fetcher
            .fetch_all_with_report(Vec::<String>::new(), DetailKind::User, &pool)
            .await;
        assert!(records.is_empty());
        assert_eq!(report, DetailReport::default());
    }
}
