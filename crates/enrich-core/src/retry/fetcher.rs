//! Lookup with bounded retries. Never fails: exhausted keys yield no value.

use std::sync::Arc;
use std::time::Duration;

use super::classify::classify;
use super::policy::{ErrorKind, RetryDecision, RetryPolicy};
use crate::lookup::{LookupClient, Rating};

/// Result of fetching one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOutcome {
    /// Rating, or `None` for "no match" and for "gave up after retries".
    pub value: Option<Rating>,
    /// Lookup calls made for this key.
    pub attempts: u32,
    /// Failed attempts that were classified as throttling.
    pub throttled: u32,
    /// True when every attempt failed.
    pub exhausted: bool,
}

impl FetchOutcome {
    /// Failed attempts (each one followed by a retry delay).
    pub fn failures(&self) -> u32 {
        if self.exhausted {
            self.attempts
        } else {
            self.attempts.saturating_sub(1)
        }
    }
}

/// A failed attempt, reported to the caller before the retry delay.
#[derive(Debug, Clone)]
pub struct RetryNotice<'a> {
    pub key: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub kind: ErrorKind,
    pub error: String,
    pub delay: Duration,
    /// False when this was the last attempt.
    pub will_retry: bool,
}

/// Wraps a [`LookupClient`] with the fixed-delay retry policy.
///
/// Clone is cheap; clones share the client.
#[derive(Clone)]
pub struct RetryingFetcher {
    client: Arc<dyn LookupClient>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Arc<dyn LookupClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `key`, retrying every lookup failure until the attempt budget is spent.
    pub fn fetch(&self, key: &str) -> FetchOutcome {
        self.fetch_with(key, |_| {})
    }

    /// Like [`fetch`](Self::fetch), calling `on_failure` after each failed attempt.
    /// Blocks the calling thread for the retry delay.
    pub fn fetch_with<F>(&self, key: &str, mut on_failure: F) -> FetchOutcome
    where
        F: FnMut(&RetryNotice<'_>),
    {
        let mut attempt = 1u32;
        let mut throttled = 0u32;
        loop {
            match self.client.lookup(key) {
                Ok(value) => {
                    if value.is_none() {
                        tracing::debug!(key, attempt, "no match");
                    }
                    return FetchOutcome {
                        value,
                        attempts: attempt,
                        throttled,
                        exhausted: false,
                    };
                }
                Err(e) => {
                    let kind = classify(&e);
                    if kind == ErrorKind::Throttled {
                        throttled += 1;
                    }
                    let decision = self.policy.decide(attempt);
                    let will_retry = matches!(decision, RetryDecision::RetryAfter(_));
                    tracing::warn!(
                        key,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        ?kind,
                        error = %e,
                        "lookup failed{}",
                        if will_retry { ", retrying" } else { ", giving up" }
                    );
                    on_failure(&RetryNotice {
                        key,
                        attempt,
                        max_attempts: self.policy.max_attempts,
                        kind,
                        error: e.to_string(),
                        delay: decision.delay(),
                        will_retry,
                    });
                    std::thread::sleep(decision.delay());
                    if !will_retry {
                        return FetchOutcome {
                            value: None,
                            attempts: attempt,
                            throttled,
                            exhausted: true,
                        };
                    }
                    attempt += 1;
                }
            }
        }
    }
}
