//! GitHub repository metadata harvester core library
//!
//! Provides a rate-limited, paginated, concurrent fetch engine for the
//! GitHub REST API and the glue to persist its results as CSV.
//!
//! # Overview
//!
//! - Quota-aware HTTP client that waits out exhausted rate limits per credential
//! - Paginated search collector that isolates failures per query
//! - Concurrent detail fetcher with a bounded worker pool and per-identifier
//!   failure isolation
//! - Row mapping with `"N/A"` / `0` defaults and a CSV sink
//!
//! # Example
//!
//! ```no_run
//! use repoharvest_core::{CredentialProvider, HarvestConfig, Harvester, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let (primary, secondary) = CredentialProvider::from_env().get_credentials()?;
//!     let harvester = Harvester::new()?;
//!
//!     let config = HarvestConfig {
//!         queries: vec!["language:rust stars:>1000".to_string()],
//!         ..HarvestConfig::default()
//!     };
//!     let summary = harvester.run(&config, primary, secondary).await?;
//!     println!("{} repositories", summary.repositories);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Quota handling
//!
//! Each [`Credential`] carries a [`QuotaGate`] shared by all its clones.
//! When a response reports zero remaining requests, the next request on that
//! credential and quota bucket (search or core) sleeps until the reported
//! reset time. Other credentials, other buckets, and other tasks not using
//! the exhausted one keep running.

mod client;
mod collector;
mod credentials;
mod detail;
mod error;
mod harvester;
mod owners;
pub mod quota;
pub mod rows;
pub mod sink;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, GitHubClient};

// Re-export error types
pub use error::{ErrorKind, HarvestError, Result};

// Re-export credential types
pub use credentials::{
    AssignmentPolicy, Credential, CredentialPool, CredentialProvider, DEFAULT_SPLIT_THRESHOLD,
    PRIMARY_TOKEN_VAR, SECONDARY_TOKEN_VAR,
};

// Re-export the fetch engine
pub use collector::{CollectorConfig, DEFAULT_MAX_PAGES, SearchCollector};
pub use detail::{DEFAULT_CONCURRENCY, DetailFetcher, DetailReport, dedup_identifiers};
pub use owners::{Owners, extract_owners};
pub use quota::{QuotaGate, QuotaSnapshot, QuotaState};

// Re-export main harvest API
pub use harvester::{
    HarvestConfig, HarvestSummary, Harvester, ORGANIZATIONS_FILE, REPOSITORIES_FILE, USERS_FILE,
};

// Re-export data types
pub use rows::{OrganizationRow, RepositoryRow, TabularRow, UserRow};
pub use types::{DetailKind, PageRequest, RawRecord, SEARCH_PAGE_SIZE};
