//! Core data types for repoharvest
//!
//! Contains the records and request descriptors passed between the fetcher,
//! the collector and the detail fetcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped object returned by the API for one repository, user or organization
pub type RawRecord = serde_json::Map<String, Value>;

/// Items requested per search page (the platform's maximum)
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// Which detail endpoint an identifier is looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    User,
    Organization,
}

impl DetailKind {
    /// Path prefix of the detail endpoint
    pub fn path_prefix(self) -> &'static str {
        match self {
            DetailKind::User => "/users",
            DetailKind::Organization => "/orgs",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetailKind::User => "user",
            DetailKind::Organization => "organization",
        }
    }
}

impl std::fmt::Display for DetailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of one search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// Search string, passed through untouched
    pub query: &'a str,
    /// 1-based page number
    pub page: u32,
    /// Items per page
    pub per_page: u32,
}

impl<'a> PageRequest<'a> {
    pub fn new(query: &'a str, page: u32) -> Self {
        Self {
            query,
            page,
            per_page: SEARCH_PAGE_SIZE,
        }
    }

    /// Query-string parameters for the search endpoint
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}
