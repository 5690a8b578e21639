//! API credentials and their assignment to work items
//!
//! A [`Credential`] pairs a bearer token with the [`QuotaGate`] tracking its
//! budget. Cloning a credential shares the gate, so every task holding a
//! clone sees the same quota.

use std::fmt;
use std::sync::Arc;

use crate::error::{HarvestError, Result};
use crate::quota::QuotaGate;

/// Environment variable holding the primary token
pub const PRIMARY_TOKEN_VAR: &str = "GITHUB_TOKEN_1";

/// Environment variable holding the secondary token
pub const SECONDARY_TOKEN_VAR: &str = "GITHUB_TOKEN_2";

/// Identifiers handled by one credential before the next takes over
///
/// Matches the hourly core quota of a single authenticated token.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 5000;

/// A bearer token plus its shared quota state
#[derive(Clone)]
pub struct Credential {
    label: String,
    token: String,
    quota: Arc<QuotaGate>,
}

impl Credential {
    /// Create a credential with a fresh quota gate
    ///
    /// # Arguments
    /// * `label` - Name used in logs in place of the token
    /// * `token` - Bearer token sent in the `Authorization` header
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
            quota: Arc::new(QuotaGate::new()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Quota gate shared by every clone of this credential
    pub fn quota(&self) -> &QuotaGate {
        &self.quota
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("label", &self.label)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Loads the two tokens the harvester runs with
///
/// The lookup function is injectable so the loading rules can be exercised
/// without touching the process environment.
pub struct CredentialProvider<F> {
    lookup: F,
    primary_var: String,
    secondary_var: String,
}

impl CredentialProvider<fn(&str) -> Option<String>> {
    /// Read tokens from the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(env_lookup)
    }
}

impl<F> CredentialProvider<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Read tokens through a custom lookup function
    pub fn with_lookup(lookup: F) -> Self {
        Self {
            lookup,
            primary_var: PRIMARY_TOKEN_VAR.to_string(),
            secondary_var: SECONDARY_TOKEN_VAR.to_string(),
        }
    }

    /// Override the variable names the tokens are read from
    pub fn with_var_names(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.primary_var = primary.into();
        self.secondary_var = secondary.into();
        self
    }

    /// Load both tokens
    ///
    /// # Errors
    /// `MissingCredential` naming the first variable that is unset or blank
    pub fn get_credentials(&self) -> Result<(Credential, Credential)> {
        let primary = self.load(&self.primary_var)?;
        let secondary = self.load(&self.secondary_var)?;
        Ok((primary, secondary))
    }

    fn load(&self, var: &str) -> Result<Credential> {
        match (self.lookup)(var) {
            Some(token) if !token.trim().is_empty() => Ok(Credential::new(var, token.trim())),
            _ => Err(HarvestError::MissingCredential(var.to_string())),
        }
    }
}

/// How identifier positions map onto credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentPolicy {
    /// The first `first` positions use credential 0, the next `first` use
    /// credential 1, and so on; overflow stays on the last credential
    Threshold { first: usize },
    /// Position `i` uses credential `i % n`
    RoundRobin,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        AssignmentPolicy::Threshold {
            first: DEFAULT_SPLIT_THRESHOLD,
        }
    }
}

/// Credentials work is partitioned across
#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    policy: AssignmentPolicy,
}

impl CredentialPool {
    /// # Errors
    /// `InvalidConfig` if the pool is empty or the threshold is zero
    pub fn new(credentials: Vec<Credential>, policy: AssignmentPolicy) -> Result<Self> {
        if credentials.is_empty() {
            return Err(HarvestError::InvalidConfig(
                "credential pool cannot be empty".to_string(),
            ));
        }
        if policy == (AssignmentPolicy::Threshold { first: 0 }) {
            return Err(HarvestError::InvalidConfig(
                "credential split threshold must be at least 1".to_string(),
            ));
        }
        Ok(Self { credentials, policy })
    }

    /// Pool with a single credential used for every position
    pub fn single(credential: Credential) -> Self {
        Self {
            credentials: vec![credential],
            policy: AssignmentPolicy::RoundRobin,
        }
    }

    /// Credential for the identifier at `position`
    pub fn credential_for(&self, position: usize) -> &Credential {
        let last = self.credentials.len() - 1;
        let index = match self.policy {
            AssignmentPolicy::Threshold { first } => (position / first).min(last),
            AssignmentPolicy::RoundRobin => position % self.credentials.len(),
        };
        &self.credentials[index]
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
