//! URL helper functions for the GitHub REST API
//!
//! Provides endpoint paths and identifier validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{HarvestError, Result};
use crate::types::DetailKind;

/// Public GitHub REST API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Repository search endpoint
pub const SEARCH_REPOSITORIES_PATH: &str = "/search/repositories";

/// Longest login GitHub accepts
const MAX_LOGIN_LEN: usize = 39;

// Legacy accounts may contain consecutive or trailing hyphens, so only the
// leading character is constrained.
static LOGIN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").ok());

/// Checks whether `login` is a syntactically valid user or organization name
///
/// # Example
/// ```
/// use repoharvest_core::url::is_valid_login;
/// assert!(is_valid_login("rust-lang"));
/// assert!(!is_valid_login("../admin"));
/// ```
pub fn is_valid_login(login: &str) -> bool {
    let Some(pattern) = LOGIN_PATTERN.as_ref() else {
        return false;
    };
    login.len() <= MAX_LOGIN_LEN && pattern.is_match(login)
}

/// Builds the detail path for a user or organization
///
/// # Arguments
/// * `kind` - Which endpoint to use
/// * `login` - User or organization name
///
/// # Errors
/// `InvalidIdentifier` if `login` is not a valid login
///
/// # Example
/// ```
/// use repoharvest_core::DetailKind;
/// use repoharvest_core::url::build_detail_path;
/// let path = build_detail_path(DetailKind::Organization, "rust-lang").unwrap();
/// assert_eq!(path, "/orgs/rust-lang");
/// ```
pub fn build_detail_path(kind: DetailKind, login: &str) -> Result<String> {
    if !is_valid_login(login) {
        return Err(HarvestError::InvalidIdentifier(login.to_string()));
    }
    Ok(format!("{}/{}", kind.path_prefix(), urlencoding::encode(login)))
}

/// Joins a base URL and an absolute path without doubling the slash
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
