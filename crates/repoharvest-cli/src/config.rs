//! Conversion of command-line arguments into harvest configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use repoharvest_core::{AssignmentPolicy, ClientConfig, CollectorConfig, HarvestConfig};

use crate::Cli;

/// Read queries from a file, one per line
///
/// Blank lines and lines starting with `#` are ignored.
pub fn read_queries_file(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries file {}", path.display()))?;
    Ok(parse_queries(&contents))
}

fn parse_queries(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

impl Cli {
    /// All queries: `--query` values first, then the queries file
    pub fn queries(&self) -> Result<Vec<String>> {
        let mut queries = self.query.clone();
        if let Some(path) = &self.queries_file {
            queries.extend(read_queries_file(path)?);
        }
        if queries.is_empty() {
            bail!("No search queries given; use --query or --queries-file");
        }
        Ok(queries)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }

    pub fn harvest_config(&self) -> Result<HarvestConfig> {
        let assignment = if self.round_robin {
            AssignmentPolicy::RoundRobin
        } else {
            AssignmentPolicy::Threshold {
                first: self.split_threshold,
            }
        };

        Ok(HarvestConfig {
            queries: self.queries()?,
            max_pages: self.pages,
            concurrency: self.concurrency,
            collector: CollectorConfig {
                stop_on_empty_page: self.stop_on_empty_page,
                ..CollectorConfig::default()
            },
            assignment,
            output_dir: self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            repositories_file: self.repos_out.clone(),
            users_file: self.users_out.clone(),
            organizations_file: self.orgs_out.clone(),
        })
    }
}
