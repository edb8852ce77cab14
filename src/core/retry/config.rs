use super::types::*;
use super::utils::*;
use std::time::Duration;

const SERVER_ERROR_CODES: [u16; 5] = [500, 502, 503, 504, 522];
const TIMEOUT_CODES: [u16; 2] = [408, 524];

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
            conditions: Vec::new(),
        }
    }
}

impl CategoryConfig {
    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        calculate_delay(self, attempt)
    }

    fn for_status_codes(max_retries: usize, codes: &[u16]) -> Self {
        Self {
            max_retries,
            conditions: codes.iter().copied().map(RetryCondition::StatusCode).collect(),
            ..Default::default()
        }
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetryConfig {
    /// Retries transient failures twice: 408, 429, 500, 502, 503, 504,
    /// 522 and 524, plus timeouts and connection failures.
    pub fn transient_errors() -> Self {
        let mut config = Self::default();
        config.categories.insert(
            RetryCategory::ServerError,
            CategoryConfig::for_status_codes(2, &SERVER_ERROR_CODES),
        );
        let mut timeout = CategoryConfig::for_status_codes(2, &TIMEOUT_CODES);
        timeout.conditions.push(RetryCondition::Transport);
        config.categories.insert(RetryCategory::Timeout, timeout);
        config.categories.insert(
            RetryCategory::RateLimit,
            CategoryConfig::for_status_codes(2, &[429]),
        );
        config
    }

    /// Returns the category and delay of the next retry, recording it in
    /// `state`, or `None` when the response should be kept.
    pub fn should_retry(
        &self,
        status: u16,
        content: &str,
        state: &mut RetryState,
    ) -> Option<(RetryCategory, Duration)> {
        self.next_retry(state, |condition| {
            retry_condition_should_apply(condition, status, content)
        })
    }

    /// Like `should_retry`, for a request that failed before any response
    /// arrived.
    pub fn should_retry_transport(
        &self,
        state: &mut RetryState,
    ) -> Option<(RetryCategory, Duration)> {
        self.next_retry(state, |condition| {
            matches!(condition, RetryCondition::Transport)
        })
    }

    /// Whether any category matches on the response body.
    pub fn inspects_content(&self) -> bool {
        self.categories
            .values()
            .flat_map(|category| &category.conditions)
            .any(|condition| matches!(condition, RetryCondition::Content(_)))
    }

    fn next_retry(
        &self,
        state: &mut RetryState,
        applies: impl Fn(&RetryCondition) -> bool,
    ) -> Option<(RetryCategory, Duration)> {
        for (category, config) in &self.categories {
            let current_retries = state.counts.get(category).copied().unwrap_or(0);
            if current_retries >= config.max_retries {
                continue;
            }

            if config.conditions.iter().any(&applies) {
                state.counts.insert(category.clone(), current_retries + 1);
                state.total_retries += 1;
                let delay = calculate_delay(config, current_retries);
                return Some((category.clone(), delay));
            }
        }
        None
    }
}
