//! End-to-end harvest run
//!
//! Combines the search collector, owner extraction, the detail fetcher and
//! the CSV sink. Each stage is isolated: a stage that collects nothing or
//! fails to write its file does not stop the stages after it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use crate::client::{ClientConfig, GitHubClient};
use crate::collector::{CollectorConfig, DEFAULT_MAX_PAGES, SearchCollector};
use crate::credentials::{AssignmentPolicy, Credential, CredentialPool};
use crate::detail::{DEFAULT_CONCURRENCY, DetailFetcher, DetailReport};
use crate::error::Result;
use crate::owners::extract_owners;
use crate::rows::{OrganizationRow, RepositoryRow, TabularRow, UserRow, to_rows};
use crate::sink::write_csv_file;
use crate::types::{DetailKind, RawRecord};

/// Default repositories output file
pub const REPOSITORIES_FILE: &str = "repositories_data.csv";
/// Default users output file
pub const USERS_FILE: &str = "users_data.csv";
/// Default organizations output file
pub const ORGANIZATIONS_FILE: &str = "organizations_data.csv";

/// What to harvest and where to write it
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Search queries, run in order
    pub queries: Vec<String>,
    /// Pages requested per query (default: 10)
    pub max_pages: u32,
    /// Detail worker pool size (default: 100)
    pub concurrency: usize,
    pub collector: CollectorConfig,
    /// Split of detail lookups across the two credentials
    pub assignment: AssignmentPolicy,
    /// Directory the output files are created in (default: current directory)
    pub output_dir: PathBuf,
    pub repositories_file: String,
    pub users_file: String,
    pub organizations_file: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            collector: CollectorConfig::default(),
            assignment: AssignmentPolicy::default(),
            output_dir: PathBuf::from("."),
            repositories_file: REPOSITORIES_FILE.to_string(),
            users_file: USERS_FILE.to_string(),
            organizations_file: ORGANIZATIONS_FILE.to_string(),
        }
    }
}

/// Counts and files produced by one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub repositories: usize,
    pub users: DetailReport,
    pub organizations: DetailReport,
    /// Files written successfully
    pub files_written: Vec<PathBuf>,
}

/// Main harvesting API
///
/// Holds the HTTP client; credentials are passed per run.
pub struct Harvester {
    client: Arc<GitHubClient>,
}

impl Harvester {
    /// Create a new harvester with default client configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new harvester with custom client configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = GitHubClient::with_config(config)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Run a full harvest
    ///
    /// Searches with the primary credential, then looks up the owners of the
    /// found repositories with both credentials according to
    /// `config.assignment`, writing one CSV per stage.
    ///
    /// # Errors
    /// `InvalidConfig` for a zero worker pool or split threshold. Fetch and
    /// write failures are logged and reflected in the summary instead.
    pub async fn run(
        &self,
        config: &HarvestConfig,
        primary: Credential,
        secondary: Credential,
    ) -> Result<HarvestSummary> {
        let detail_fetcher = DetailFetcher::new(Arc::clone(&self.client), config.concurrency)?;
        let pool = CredentialPool::new(vec![primary.clone(), secondary], config.assignment)?;
        let collector =
            SearchCollector::with_config((*self.client).clone(), config.collector.clone());

        let mut summary = HarvestSummary::default();

        info!(
            queries = config.queries.len(),
            max_pages = config.max_pages,
            "Searching repositories"
        );
        let repositories = collector
            .collect(&config.queries, &primary, config.max_pages)
            .await;
        summary.repositories = repositories.len();
        write_stage::<RepositoryRow>(
            &config.output_dir,
            &config.repositories_file,
            &repositories,
            &mut summary,
        );

        let owners = extract_owners(&repositories);
        info!(
            users = owners.users.len(),
            organizations = owners.organizations.len(),
            "Extracted owners"
        );

        let (users, report) = detail_fetcher
            .fetch_all_with_report(&owners.users, DetailKind::User, &pool)
            .await;
        summary.users = report;
        write_stage::<UserRow>(&config.output_dir, &config.users_file, &users, &mut summary);

        let (organizations, report) = detail_fetcher
            .fetch_all_with_report(&owners.organizations, DetailKind::Organization, &pool)
            .await;
        summary.organizations = report;
        write_stage::<OrganizationRow>(
            &config.output_dir,
            &config.organizations_file,
            &organizations,
            &mut summary,
        );

        Ok(summary)
    }
}

fn write_stage<T: TabularRow>(
    dir: &Path,
    file_name: &str,
    records: &[RawRecord],
    summary: &mut HarvestSummary,
) {
    let path = dir.join(file_name);
    let rows: Vec<T> = to_rows(records);
    match write_csv_file(&path, &rows) {
        Ok(_) => summary.files_written.push(path),
        Err(e) => error!(path = %path.display(), error = %e, "Failed to write output file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;

    #[test]
    fn test_harvester_creation() {
        let harvester = Harvester::new();
        assert!(harvester.is_ok());
    }

    #[test]
    fn test_harvester_with_custom_config() {
        let config = ClientConfig {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 60,
            max_retries: 2,
        };
        let harvester = Harvester::with_config(config);
        assert!(harvester.is_ok());
    }

    #[test]
    fn test_harvest_config_default() {
        let config = HarvestConfig::default();
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.repositories_file, "repositories_data.csv");
        assert_eq!(config.users_file, "users_data.csv");
        assert_eq!(config.organizations_file, "organizations_data.csv");
        assert_eq!(config.output_dir, PathBuf::from("."));
    }

    #[tokio::test]
    async fn test_run_rejects_zero_concurrency() {
        let harvester = Harvester::new().unwrap();
        let config = HarvestConfig {
            concurrency: 0,
            ..HarvestConfig::default()
        };
        let result = harvester
            .run(&config, Credential::new("a", "1"), Credential::new("b", "2"))
            .await;
        assert!(matches!(result, Err(HarvestError::InvalidConfig(_))));
    }
}
