//! Owner extraction from repository records

use std::collections::HashSet;

use crate::types::RawRecord;

/// Unique owners of a set of repositories, split by account type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Owners {
    pub users: Vec<String>,
    pub organizations: Vec<String>,
}

/// Collect the distinct `owner.login` values of `records`
///
/// Owners whose `owner.type` is `"Organization"` go to `organizations`;
/// every other owner with a login is treated as a user. Records without an
/// owner login are skipped. First-seen order is kept.
pub fn extract_owners(records: &[RawRecord]) -> Owners {
    let mut owners = Owners::default();
    let mut seen = HashSet::new();

    for record in records {
        let Some(owner) = record.get("owner") else {
            continue;
        };
        let Some(login) = owner.get("login").and_then(|v| v.as_str()) else {
            continue;
        };
        let login = login.trim();
        if login.is_empty() || !seen.insert(login.to_string()) {
            continue;
        }

        match owner.get("type").and_then(|v| v.as_str()) {
            Some("Organization") => owners.organizations.push(login.to_string()),
            _ => owners.users.push(login.to_string()),
        }
    }

    owners
}
