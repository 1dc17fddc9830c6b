//! In-process policy engine.
//!
//! Checks run in a fixed order: bot signatures, then shield patterns, then
//! the rate-limit bucket. A request denied as a bot never consumes
//! rate-limit budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use regex::RegexSet;
use tokio::sync::broadcast;

use crate::config::GateConfig;
use crate::gate::classifier::{ClassifierError, PolicyClassifier, RequestFacts};
use crate::gate::decision::{DenyReason, PolicyDecision};

/// A simple token bucket: capacity = tier maximum, refill rate spreads the
/// tier budget over its window, approximating a sliding window.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_update.elapsed()
    }
}

/// In-process [`PolicyClassifier`].
pub struct LocalPolicyEngine {
    bot_signatures: RegexSet,
    bot_allowlist: RegexSet,
    shield_patterns: RegexSet,
    buckets: DashMap<String, TokenBucket>,
}

impl LocalPolicyEngine {
    /// Build the engine from gate configuration. Patterns are validated by
    /// config validation; a failure here means the engine was constructed
    /// from an unvalidated config.
    pub fn from_config(config: &GateConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            bot_signatures: RegexSet::new(&config.bot_signatures)?,
            bot_allowlist: RegexSet::new(&config.bot_allowlist)?,
            shield_patterns: RegexSet::new(&config.shield_patterns)?,
            buckets: DashMap::new(),
        })
    }

    fn is_bot(&self, user_agent: &str) -> bool {
        self.bot_signatures.is_match(user_agent) && !self.bot_allowlist.is_match(user_agent)
    }

    fn is_attack(&self, path: &str, query: Option<&str>) -> bool {
        if self.shield_patterns.is_match(path) {
            return true;
        }
        query.is_some_and(|q| self.shield_patterns.is_match(q))
    }

    // The tier arrives with the request facts; the gate resolved it from
    // the caller's role before asking for a decision.
    fn within_rate_limit(&self, facts: &RequestFacts) -> bool {
        let capacity = f64::from(facts.tier.max_requests);
        let refill_rate = capacity / facts.tier.window_secs as f64;

        let mut bucket = self
            .buckets
            .entry(facts.caller.clone())
            .or_insert_with(|| TokenBucket::new(capacity));
        bucket.try_acquire(capacity, refill_rate)
    }

    /// Drop buckets idle longer than `ttl`. Called periodically by the
    /// bucket janitor so one-off callers do not accumulate forever.
    pub fn prune_idle(&self, ttl: Duration) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.idle_for() < ttl);
        before - self.buckets.len()
    }

    /// Number of live rate-limit buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Spawn a background task that prunes idle rate-limit buckets until
/// shutdown is signalled.
pub fn spawn_bucket_janitor(
    engine: Arc<LocalPolicyEngine>,
    interval: Duration,
    ttl: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick fires immediately; nothing to prune yet.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let dropped = engine.prune_idle(ttl);
                    if dropped > 0 {
                        tracing::debug!(dropped, remaining = engine.bucket_count(),
                            "Pruned idle rate-limit buckets");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Bucket janitor shutting down");
                    return;
                }
            }
        }
    });
}

#[async_trait]
impl PolicyClassifier for LocalPolicyEngine {
    async fn evaluate(&self, facts: &RequestFacts) -> Result<PolicyDecision, ClassifierError> {
        if let Some(agent) = facts.user_agent.as_deref() {
            if self.is_bot(agent) {
                return Ok(PolicyDecision::Deny(DenyReason::Bot));
            }
        }

        if self.is_attack(&facts.path, facts.query.as_deref()) {
            return Ok(PolicyDecision::Deny(DenyReason::Shield));
        }

        if !self.within_rate_limit(facts) {
            return Ok(PolicyDecision::Deny(DenyReason::RateLimit));
        }

        Ok(PolicyDecision::Allow)
    }
}
