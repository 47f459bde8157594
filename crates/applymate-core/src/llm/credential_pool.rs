//! Credential pool with per-credential usage windows.
//!
//! Each API credential gets its own provider instance plus four sliding
//! windows (requests/minute, requests/day, tokens/minute, tokens/day).
//! Selection is round-robin from an owned cursor, skipping credentials whose
//! windows are at a ceiling. When every credential is saturated the pool
//! degrades to the first one instead of failing; the downstream rate-limit
//! retry in [`CredentialPool::complete`] deals with the rejection.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use applymate_types::config::UsageLimits;
use applymate_types::error::ConfigError;
use applymate_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::box_provider::BoxLlmProvider;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(86_400);

/// Identifier of a pooled credential (`key_1`, `key_2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CredentialId(String);

impl CredentialId {
    fn for_index(index: usize) -> Self {
        Self(format!("key_{}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timestamped events pruned to a fixed horizon.
#[derive(Debug)]
struct SlidingWindow {
    horizon: Duration,
    events: VecDeque<(Instant, u64)>,
}

impl SlidingWindow {
    fn new(horizon: Duration) -> Self {
        Self {
            horizon,
            events: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some((at, _)) = self.events.front() {
            if now.saturating_duration_since(*at) >= self.horizon {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    fn push(&mut self, now: Instant, amount: u64) {
        self.events.push_back((now, amount));
    }

    fn count(&self) -> usize {
        self.events.len()
    }

    fn total(&self) -> u64 {
        self.events.iter().map(|(_, amount)| amount).sum()
    }
}

/// The four usage windows tracked for one credential.
#[derive(Debug)]
pub struct CredentialUsageWindow {
    requests_minute: SlidingWindow,
    requests_day: SlidingWindow,
    tokens_minute: SlidingWindow,
    tokens_day: SlidingWindow,
}

impl CredentialUsageWindow {
    fn new() -> Self {
        Self {
            requests_minute: SlidingWindow::new(MINUTE),
            requests_day: SlidingWindow::new(DAY),
            tokens_minute: SlidingWindow::new(MINUTE),
            tokens_day: SlidingWindow::new(DAY),
        }
    }

    fn prune(&mut self, now: Instant) {
        self.requests_minute.prune(now);
        self.requests_day.prune(now);
        self.tokens_minute.prune(now);
        self.tokens_day.prune(now);
    }

    fn record(&mut self, now: Instant, tokens: u64) {
        self.requests_minute.push(now, 1);
        self.requests_day.push(now, 1);
        self.tokens_minute.push(now, tokens);
        self.tokens_day.push(now, tokens);
    }

    /// Usable only while all four windows are below their ceilings.
    /// Callers prune first.
    fn is_usable(&self, limits: &UsageLimits) -> bool {
        self.requests_minute.count() < limits.requests_per_minute
            && self.requests_day.count() < limits.requests_per_day
            && self.tokens_minute.total() < limits.tokens_per_minute
            && self.tokens_day.total() < limits.tokens_per_day
    }
}

/// Usage snapshot for one credential, rendered as `used/limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStats {
    pub key_id: CredentialId,
    pub rpm: String,
    pub rpd: String,
    pub tpm: String,
    pub tpd: String,
    pub available: bool,
}

/// A credential-bound provider handed out by the pool.
pub struct PooledCredential {
    pub id: CredentialId,
    pub provider: BoxLlmProvider,
}

/// Result of a completion routed through the pool.
#[derive(Debug)]
pub struct PoolCompletion {
    pub response: CompletionResponse,
    /// The credential that served the request.
    pub credential: CredentialId,
    /// Number of attempts made, including the successful one.
    pub attempts: usize,
}

struct PoolState {
    cursor: usize,
    usage: Vec<CredentialUsageWindow>,
}

/// Owns every model credential and decides which one serves the next call.
///
/// Safe to share across tasks: the cursor and usage windows sit behind a
/// short synchronous lock that is never held across an await.
pub struct CredentialPool {
    credentials: Vec<PooledCredential>,
    limits: UsageLimits,
    state: Mutex<PoolState>,
}

impl CredentialPool {
    /// Build a pool from one provider per credential, in configuration order.
    pub fn new(providers: Vec<BoxLlmProvider>, limits: UsageLimits) -> Result<Self, ConfigError> {
        if providers.is_empty() {
            return Err(ConfigError::MissingCredentials(
                "credential pool needs at least one API key".to_string(),
            ));
        }

        let usage = providers.iter().map(|_| CredentialUsageWindow::new()).collect();
        let credentials = providers
            .into_iter()
            .enumerate()
            .map(|(index, provider)| PooledCredential {
                id: CredentialId::for_index(index),
                provider,
            })
            .collect();

        Ok(Self {
            credentials,
            limits,
            state: Mutex::new(PoolState { cursor: 0, usage }),
        })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn limits(&self) -> &UsageLimits {
        &self.limits
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pick the next usable credential, round-robin from the cursor.
    pub fn select(&self) -> &PooledCredential {
        self.select_at(Instant::now())
    }

    fn select_at(&self, now: Instant) -> &PooledCredential {
        let mut state = self.lock();
        let len = self.credentials.len();

        for _ in 0..len {
            let index = state.cursor;
            state.cursor = (state.cursor + 1) % len;

            let window = &mut state.usage[index];
            window.prune(now);
            if window.is_usable(&self.limits) {
                return &self.credentials[index];
            }
        }

        tracing::warn!(
            credentials = len,
            "All credentials at their usage ceilings, falling back to the first"
        );
        &self.credentials[0]
    }

    /// Record one request and its token cost against a credential.
    pub fn record_usage(&self, id: &CredentialId, tokens: u64) {
        self.record_usage_at(id, tokens, Instant::now());
    }

    fn record_usage_at(&self, id: &CredentialId, tokens: u64, now: Instant) {
        let Some(index) = self.credentials.iter().position(|c| &c.id == id) else {
            tracing::debug!(credential = %id, "Usage recorded for unknown credential, ignoring");
            return;
        };
        let mut state = self.lock();
        let window = &mut state.usage[index];
        window.record(now, tokens);
        window.prune(now);
    }

    /// Current usage of every credential.
    pub fn stats(&self) -> Vec<CredentialStats> {
        self.stats_at(Instant::now())
    }

    fn stats_at(&self, now: Instant) -> Vec<CredentialStats> {
        let mut state = self.lock();
        let limits = self.limits;
        self.credentials
            .iter()
            .zip(state.usage.iter_mut())
            .map(|(credential, window)| {
                window.prune(now);
                CredentialStats {
                    key_id: credential.id.clone(),
                    rpm: format!("{}/{}", window.requests_minute.count(), limits.requests_per_minute),
                    rpd: format!("{}/{}", window.requests_day.count(), limits.requests_per_day),
                    tpm: format!("{}/{}", window.tokens_minute.total(), limits.tokens_per_minute),
                    tpd: format!("{}/{}", window.tokens_day.total(), limits.tokens_per_day),
                    available: window.is_usable(&limits),
                }
            })
            .collect()
    }

    /// Run a completion, rotating credentials on rate-limit failures.
    ///
    /// At most `min(pool size, max_attempts)` attempts are made. Each attempt
    /// selects a fresh credential, so a retry lands on a different key
    /// whenever another one is usable. Any failure other than a rate limit is
    /// returned immediately. On success, usage is recorded against the
    /// serving credential: the reported token total when the backend sends
    /// one, otherwise the serialized-prompt estimate.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        max_attempts: usize,
    ) -> Result<PoolCompletion, LlmError> {
        let attempts_allowed = self.len().min(max_attempts).max(1);
        let mut last_error = None;

        for attempt in 1..=attempts_allowed {
            let credential = self.select();

            match credential.provider.complete(request).await {
                Ok(response) => {
                    let tokens = match response.usage.total() {
                        0 => request.estimated_tokens(),
                        reported => reported,
                    };
                    self.record_usage(&credential.id, u64::from(tokens));

                    return Ok(PoolCompletion {
                        response,
                        credential: credential.id.clone(),
                        attempts: attempt,
                    });
                }
                Err(err) if err.is_rate_limit() => {
                    tracing::warn!(
                        credential = %credential.id,
                        attempt,
                        attempts_allowed,
                        error = %err,
                        "Credential rate limited, rotating"
                    );
                    last_error = Some(err);
                }
                Err(err) => {
                    tracing::error!(
                        credential = %credential.id,
                        error = %err,
                        "Model call failed, not retrying"
                    );
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retry_after_ms: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{ScriptedProvider, final_answer};

    fn pool_of(n: usize) -> CredentialPool {
        let providers = (0..n)
            .map(|i| BoxLlmProvider::new(ScriptedProvider::named(&format!("p{i}"))))
            .collect();
        CredentialPool::new(providers, UsageLimits::default()).unwrap()
    }

    fn saturate_minute(pool: &CredentialPool, id: &CredentialId, now: Instant) {
        for _ in 0..pool.limits().requests_per_minute {
            pool.record_usage_at(id, 1, now);
        }
    }

    #[test]
    fn empty_pool_is_a_config_error() {
        let err = CredentialPool::new(Vec::new(), UsageLimits::default()).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredentials(_)));
    }

    #[test]
    fn ids_follow_configuration_order() {
        let pool = pool_of(3);
        let ids: Vec<_> = pool.stats().into_iter().map(|s| s.key_id.to_string()).collect();
        assert_eq!(ids, ["key_1", "key_2", "key_3"]);
    }

    #[test]
    fn round_robin_advances_cursor() {
        let pool = pool_of(3);
        let picks: Vec<_> = (0..4).map(|_| pool.select().id.to_string()).collect();
        assert_eq!(picks, ["key_1", "key_2", "key_3", "key_1"]);
    }

    #[test]
    fn saturated_credential_is_skipped() {
        let pool = pool_of(2);
        let now = Instant::now();
        let a = CredentialId::for_index(0);
        saturate_minute(&pool, &a, now);

        assert_eq!(pool.select_at(now).id.as_str(), "key_2");
        // Cursor wrapped past key_2; key_1 is still saturated.
        assert_eq!(pool.select_at(now).id.as_str(), "key_2");
    }

    #[test]
    fn all_saturated_falls_back_to_first() {
        let pool = pool_of(2);
        let now = Instant::now();
        let a = CredentialId::for_index(0);
        let b = CredentialId::for_index(1);
        saturate_minute(&pool, &a, now);
        assert_eq!(pool.select_at(now).id, b);

        saturate_minute(&pool, &b, now);
        assert_eq!(pool.select_at(now).id, a);
    }

    #[test]
    fn token_ceiling_blocks_credential() {
        let pool = pool_of(2);
        let now = Instant::now();
        let a = CredentialId::for_index(0);
        pool.record_usage_at(&a, pool.limits().tokens_per_minute, now);

        assert_eq!(pool.select_at(now).id.as_str(), "key_2");
    }

    #[test]
    fn minute_window_expires() {
        let pool = pool_of(1);
        let start = Instant::now();
        let a = CredentialId::for_index(0);
        saturate_minute(&pool, &a, start);
        assert!(!pool.stats_at(start)[0].available);

        let later = start + Duration::from_secs(61);
        let stats = pool.stats_at(later);
        assert!(stats[0].available);
        assert_eq!(stats[0].rpm, "0/30");
        // Day windows still hold the events.
        assert_eq!(stats[0].rpd, "30/1000");
    }

    #[test]
    fn stats_render_used_over_limit() {
        let pool = pool_of(1);
        let now = Instant::now();
        pool.record_usage_at(&CredentialId::for_index(0), 1200, now);

        let stats = pool.stats_at(now);
        assert_eq!(stats[0].rpm, "1/30");
        assert_eq!(stats[0].tpm, "1200/30000");
        assert_eq!(stats[0].tpd, "1200/500000");
        assert!(stats[0].available);
    }

    #[test]
    fn unknown_credential_usage_is_ignored() {
        let pool = pool_of(1);
        pool.record_usage(&CredentialId("key_9".into()), 10);
        assert_eq!(pool.stats()[0].rpm, "0/30");
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".into(),
            messages: vec![applymate_types::llm::Message::user("hi")],
            system: None,
            max_tokens: 64,
            temperature: Some(0.0),
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    #[tokio::test]
    async fn complete_rotates_on_rate_limit() {
        let limited = ScriptedProvider::named("limited")
            .then_err(LlmError::RateLimited { retry_after_ms: Some(100) });
        let healthy = ScriptedProvider::named("healthy").then_ok(final_answer("hello"));
        let pool = CredentialPool::new(
            vec![BoxLlmProvider::new(limited), BoxLlmProvider::new(healthy)],
            UsageLimits::default(),
        )
        .unwrap();

        let result = pool.complete(&request(), 3).await.unwrap();
        assert_eq!(result.response.content, "hello");
        assert_eq!(result.credential.as_str(), "key_2");
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn complete_does_not_retry_other_errors() {
        let broken = ScriptedProvider::named("broken").then_err(LlmError::AuthenticationFailed);
        let healthy = ScriptedProvider::named("healthy").then_ok(final_answer("hello"));
        let healthy_calls = healthy.calls();
        let pool = CredentialPool::new(
            vec![BoxLlmProvider::new(broken), BoxLlmProvider::new(healthy)],
            UsageLimits::default(),
        )
        .unwrap();

        let err = pool.complete(&request(), 3).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthenticationFailed));
        assert_eq!(healthy_calls.count(), 0);
    }

    #[tokio::test]
    async fn retries_bounded_by_pool_size() {
        let only = ScriptedProvider::named("only")
            .then_err(LlmError::RateLimited { retry_after_ms: None })
            .then_ok(final_answer("too late"));
        let calls = only.calls();
        let pool = CredentialPool::new(vec![BoxLlmProvider::new(only)], UsageLimits::default())
            .unwrap();

        let err = pool.complete(&request(), 3).await.unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(calls.count(), 1);
    }

    #[tokio::test]
    async fn success_records_reported_usage() {
        let mut response = final_answer("ok");
        response.usage.input_tokens = 400;
        response.usage.output_tokens = 100;
        let provider = ScriptedProvider::named("p").then_ok(response);
        let pool = CredentialPool::new(vec![BoxLlmProvider::new(provider)], UsageLimits::default())
            .unwrap();

        pool.complete(&request(), 3).await.unwrap();
        let stats = pool.stats();
        assert_eq!(stats[0].rpm, "1/30");
        assert_eq!(stats[0].tpm, "500/30000");
    }

    #[tokio::test]
    async fn success_without_usage_records_prompt_estimate() {
        let provider = ScriptedProvider::named("p").then_ok(final_answer("ok"));
        let pool = CredentialPool::new(vec![BoxLlmProvider::new(provider)], UsageLimits::default())
            .unwrap();
        let req = request();

        pool.complete(&req, 3).await.unwrap();
        let expected = format!("{}/30000", req.estimated_tokens());
        assert_eq!(pool.stats()[0].tpm, expected);
    }
}
