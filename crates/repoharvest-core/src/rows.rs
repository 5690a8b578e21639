//! Flattening of raw API records into tabular rows
//!
//! Missing, null or empty text fields become `"N/A"`; missing or
//! non-numeric counters become `0`.

use serde::Serialize;
use serde_json::Value;

use crate::types::RawRecord;

/// Placeholder written for absent text fields
pub const MISSING_TEXT: &str = "N/A";

/// A flat row with a fixed column order
pub trait TabularRow: Serialize {
    /// Column names, in serialization order
    const HEADERS: &'static [&'static str];

    /// Map a raw record, filling defaults for missing fields
    fn from_record(record: &RawRecord) -> Self;
}

/// Map every record to a row
pub fn to_rows<T: TabularRow>(records: &[RawRecord]) -> Vec<T> {
    records.iter().map(T::from_record).collect()
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => MISSING_TEXT.to_string(),
    }
}

fn count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn nested<'a>(record: &'a RawRecord, outer: &str, inner: &str) -> Option<&'a Value> {
    record.get(outer)?.get(inner)
}

fn joined(value: Option<&Value>) -> String {
    let parts: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    if parts.is_empty() {
        MISSING_TEXT.to_string()
    } else {
        parts.join(";")
    }
}

/// One repository search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRow {
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub owner_type: String,
    pub html_url: String,
    pub description: String,
    pub language: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub watchers_count: u64,
    pub created_at: String,
    pub updated_at: String,
    pub license: String,
    /// Topics joined with `;`
    pub topics: String,
}

impl TabularRow for RepositoryRow {
    const HEADERS: &'static [&'static str] = &[
        "name",
        "full_name",
        "owner",
        "owner_type",
        "html_url",
        "description",
        "language",
        "stargazers_count",
        "forks_count",
        "open_issues_count",
        "watchers_count",
        "created_at",
        "updated_at",
        "license",
        "topics",
    ];

    fn from_record(record: &RawRecord) -> Self {
        Self {
            name: text(record.get("name")),
            full_name: text(record.get("full_name")),
            owner: text(nested(record, "owner", "login")),
            owner_type: text(nested(record, "owner", "type")),
            html_url: text(record.get("html_url")),
            description: text(record.get("description")),
            language: text(record.get("language")),
            stargazers_count: count(record.get("stargazers_count")),
            forks_count: count(record.get("forks_count")),
            open_issues_count: count(record.get("open_issues_count")),
            watchers_count: count(record.get("watchers_count")),
            created_at: text(record.get("created_at")),
            updated_at: text(record.get("updated_at")),
            license: text(nested(record, "license", "name")),
            topics: joined(record.get("topics")),
        }
    }
}

/// One user detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub login: String,
    pub name: String,
    pub company: String,
    pub blog: String,
    pub location: String,
    pub email: String,
    pub bio: String,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: String,
}

impl TabularRow for UserRow {
    const HEADERS: &'static [&'static str] = &[
        "login",
        "name",
        "company",
        "blog",
        "location",
        "email",
        "bio",
        "public_repos",
        "followers",
        "following",
        "created_at",
    ];

    fn from_record(record: &RawRecord) -> Self {
        Self {
            login: text(record.get("login")),
            name: text(record.get("name")),
            company: text(record.get("company")),
            blog: text(record.get("blog")),
            location: text(record.get("location")),
            email: text(record.get("email")),
            bio: text(record.get("bio")),
            public_repos: count(record.get("public_repos")),
            followers: count(record.get("followers")),
            following: count(record.get("following")),
            created_at: text(record.get("created_at")),
        }
    }
}

/// One organization detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationRow {
    pub login: String,
    pub name: String,
    pub description: String,
    pub blog: String,
    pub location: String,
    pub email: String,
    pub public_repos: u64,
    pub followers: u64,
    pub created_at: String,
}

impl TabularRow for OrganizationRow {
    const HEADERS: &'static [&'static str] = &[
        "login",
        "name",
        "description",
        "blog",
        "location",
        "email",
        "public_repos",
        "followers",
        "created_at",
    ];

    fn from_record(record: &RawRecord) -> Self {
        Self {
            login: text(record.get("login")),
            name: text(record.get("name")),
            description: text(record.get("description")),
            blog: text(record.get("blog")),
            location: text(record.get("location")),
            email: text(record.get("email")),
            public_repos: count(record.get("public_repos")),
            followers: count(record.get("followers")),
            created_at: text(record.get("created_at")),
        }
    }
}
