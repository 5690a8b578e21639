//! Per-credential quota tracking
//!
//! The API reports the remaining request budget and the epoch second at
//! which it resets on every response. [`QuotaGate`] keeps the latest view of
//! that budget for one credential and makes callers wait when it is spent.
//! Every task using the same credential shares one gate.
//!
//! Search and the other REST endpoints draw from separate buckets with their
//! own reset times, so the gate tracks each bucket on its own.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info};

/// Header carrying the number of requests left in the current window
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the epoch second at which the window resets
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Header naming the bucket a response was counted against
pub const RESOURCE_HEADER: &str = "x-ratelimit-resource";

/// Bucket of the user, organization and other REST endpoints
pub const CORE_RESOURCE: &str = "core";

/// Bucket of the search endpoints
pub const SEARCH_RESOURCE: &str = "search";

/// Bucket a request to `path` is expected to count against
pub fn resource_for_path(path: &str) -> &'static str {
    if path.starts_with("/search/") {
        SEARCH_RESOURCE
    } else {
        CORE_RESOURCE
    }
}

/// Bucket named by a response's [`RESOURCE_HEADER`], if any
pub fn resource_from_headers(headers: &HeaderMap) -> Option<&str> {
    let resource = headers.get(RESOURCE_HEADER)?.to_str().ok()?.trim();
    (!resource.is_empty()).then_some(resource)
}

/// Quota values reported by a single response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub remaining: u64,
    pub reset_at: i64,
}

impl QuotaSnapshot {
    /// Read the quota headers, if both are present and numeric
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = headers
            .get(REMAINING_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        let reset_at = headers
            .get(RESET_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<i64>()
            .ok()?;

        Some(Self { remaining, reset_at })
    }
}

/// How long to wait for a window resetting at `reset_at`, seen at `now`
///
/// One extra second covers the partial second the reset timestamp truncates.
/// A reset time that is already in the past (elapsed, or clock skew) yields
/// zero.
pub fn wait_duration(reset_at: i64, now: i64) -> Duration {
    if reset_at <= now {
        return Duration::ZERO;
    }
    let secs = reset_at.saturating_sub(now).unsigned_abs().saturating_add(1);
    Duration::from_secs(secs)
}

/// Last known quota of one credential
///
/// `None` fields mean no response has been seen in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuotaState {
    pub remaining: Option<u64>,
    pub reset_at: Option<i64>,
}

impl QuotaState {
    /// True when the last response said no requests are left
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Wait required before the next request, seen at `now`
    ///
    /// Returns `None` when a request may go out immediately.
    pub fn pending_wait(&self, now: i64) -> Option<Duration> {
        if !self.is_exhausted() {
            return None;
        }
        let wait = wait_duration(self.reset_at?, now);
        (!wait.is_zero()).then_some(wait)
    }

    /// Fold a response's quota values into this state
    ///
    /// Within one window the remaining count only goes down, so responses
    /// arriving out of order cannot hand back units already reserved. A later
    /// reset timestamp starts a new window; an earlier one is stale.
    pub fn observe(&mut self, snapshot: QuotaSnapshot) {
        match self.reset_at {
            Some(reset_at) if snapshot.reset_at < reset_at => {}
            Some(reset_at) if snapshot.reset_at == reset_at => {
                let remaining = self
                    .remaining
                    .map_or(snapshot.remaining, |r| r.min(snapshot.remaining));
                self.remaining = Some(remaining);
            }
            _ => {
                self.remaining = Some(snapshot.remaining);
                self.reset_at = Some(snapshot.reset_at);
            }
        }
    }

    /// Spend one unit of the known budget
    fn reserve(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Synchronized quota state shared by every task using one credential
///
/// Callers go through [`QuotaGate::acquire`] before each request and report
/// the response headers through [`QuotaGate::observe`] afterwards, both
/// naming the bucket involved. The lock is never held across a sleep, so
/// responses can still be recorded while other tasks wait out a reset.
#[derive(Debug, Default)]
pub struct QuotaGate {
    buckets: Mutex<HashMap<String, QuotaState>>,
}

impl QuotaGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `resource` may be used, then reserve a unit of it
    ///
    /// If the last response for that bucket exhausted the quota, the calling
    /// task sleeps until the reset time plus one second. Other tasks on the
    /// runtime, and other buckets of the same credential, are unaffected.
    pub async fn acquire(&self, resource: &str) {
        loop {
            let (wait, reset_at) = {
                let mut buckets = self.buckets.lock().await;
                let state = buckets.entry(resource.to_string()).or_default();
                match state.pending_wait(Utc::now().timestamp()) {
                    Some(wait) => (wait, state.reset_at),
                    None => {
                        if state.is_exhausted() {
                            // reset already passed
                            *state = QuotaState::default();
                        }
                        state.reserve();
                        return;
                    }
                }
            };

            info!(
                resource,
                wait_secs = wait.as_secs(),
                reset_at = reset_at.unwrap_or_default(),
                "Quota exhausted, waiting for reset"
            );
            sleep(wait).await;

            let mut buckets = self.buckets.lock().await;
            if let Some(state) = buckets.get_mut(resource)
                && state.is_exhausted()
                && state.reset_at == reset_at
            {
                debug!(resource, "Quota window rolled over");
                *state = QuotaState::default();
            }
        }
    }

    /// Record the quota a response reported for `resource`
    pub async fn observe(&self, resource: &str, snapshot: QuotaSnapshot) {
        self.buckets
            .lock()
            .await
            .entry(resource.to_string())
            .or_default()
            .observe(snapshot);
    }

    /// Current view of one bucket
    pub async fn state(&self, resource: &str) -> QuotaState {
        self.buckets
            .lock()
            .await
            .get(resource)
            .copied()
            .unwrap_or_default()
    }
}
