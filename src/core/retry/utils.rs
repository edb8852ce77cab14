use super::types::*;
use regex::Regex;
use std::time::Duration;

pub fn retry_condition_should_apply(condition: &RetryCondition, status: u16, content: &str) -> bool {
    match condition {
        RetryCondition::StatusCode(code) => *code == status,
        RetryCondition::Content(content_condition) => {
            check_content_condition(content_condition, content)
        }
        RetryCondition::Transport => false,
    }
}

fn check_content_condition(condition: &ContentRetryCondition, content: &str) -> bool {
    if condition.is_regex {
        Regex::new(&condition.pattern)
            .map(|re| re.is_match(content))
            .unwrap_or(false)
    } else {
        content
            .to_lowercase()
            .contains(&condition.pattern.to_lowercase())
    }
}

pub fn calculate_delay(config: &CategoryConfig, attempt: usize) -> Duration {
    if attempt == 0 {
        return config.initial_delay;
    }

    let delay = match config.backoff_policy {
        BackoffPolicy::Constant => config.initial_delay,
        BackoffPolicy::Linear => config.initial_delay.mul_f32((attempt + 1) as f32),
        BackoffPolicy::Exponential { factor } => {
            config.initial_delay.mul_f32(factor.powi(attempt as i32))
        }
    };

    std::cmp::min(delay, config.max_delay)
}
