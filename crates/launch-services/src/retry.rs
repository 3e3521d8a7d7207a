use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_BACKOFF_MS: u64 = 200;
const MAX_BACKOFF_SHIFT: usize = 6;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);
static JITTER_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Transport retry policy shared by every service client.
///
/// `max_retries = 0` sends each request exactly once.
pub struct RetryPolicy {
    pub max_retries: usize,
    pub retry_budget_ms: u64,
    pub retry_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_budget_ms: 0,
            retry_jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    /// Delay before the next attempt, or `None` when the budget is spent.
    pub(crate) fn next_delay_ms(
        &self,
        attempt: usize,
        elapsed_ms: u64,
        retry_after_ms: Option<u64>,
    ) -> Option<u64> {
        if attempt >= self.max_retries {
            return None;
        }
        let backoff_ms = next_backoff_ms_with_jitter(attempt, self.retry_jitter);
        let delay_ms = match retry_after_ms {
            Some(retry_after_ms) => backoff_ms.max(retry_after_ms),
            None => backoff_ms,
        };
        if self.retry_budget_ms != 0
            && elapsed_ms.saturating_add(delay_ms) > self.retry_budget_ms
        {
            return None;
        }
        Some(delay_ms)
    }
}

/// Rate limiting is retried for every method. Timeouts and server errors are
/// retried only for idempotent methods, since a non-idempotent create may
/// already have been applied. Conflicts are never retried.
pub fn should_retry_status(status: u16, idempotent: bool) -> bool {
    match status {
        429 => true,
        408 | 425 => idempotent,
        status => status >= 500 && idempotent,
    }
}

pub fn next_backoff_ms(attempt: usize) -> u64 {
    BASE_BACKOFF_MS.saturating_mul(1_u64 << attempt.min(MAX_BACKOFF_SHIFT))
}

pub fn next_backoff_ms_with_jitter(attempt: usize, jitter_enabled: bool) -> u64 {
    let base = next_backoff_ms(attempt);
    if !jitter_enabled || base <= 1 {
        return base;
    }

    // Bounded jitter in [50%, 100%] of the deterministic backoff.
    let low = base / 2;
    let width = base.saturating_sub(low);
    let seed = JITTER_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mixed = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17) ^ 0xA24B_AED4_963E_E407;
    low.saturating_add(mixed % width.saturating_add(1))
}

pub fn parse_retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(seconds.saturating_mul(1000));
    }

    let retry_at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    let delay_ms = retry_at.signed_duration_since(Utc::now()).num_milliseconds();
    if delay_ms <= 0 {
        return Some(0);
    }
    u64::try_from(delay_ms).ok()
}

pub fn is_retryable_http_error(error: &reqwest::Error, idempotent: bool) -> bool {
    error.is_connect() || (idempotent && (error.is_timeout() || error.is_request() || error.is_body()))
}

pub fn new_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let count = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("launch-{millis}-{count}")
}

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use reqwest::header::{HeaderMap, HeaderValue};

    use super::{
        new_request_id, next_backoff_ms, next_backoff_ms_with_jitter, parse_retry_after_ms,
        should_retry_status, truncate_for_error, RetryPolicy,
    };

    #[test]
    fn unit_retry_status_selection_matches_rate_limit_and_server_errors() {
        assert!(should_retry_status(429, true));
        assert!(should_retry_status(503, true));
        assert!(should_retry_status(408, true));
        assert!(!should_retry_status(400, true));
        assert!(!should_retry_status(404, true));
    }

    #[test]
    fn regression_creates_only_retry_rate_limits() {
        assert!(should_retry_status(429, false));
        assert!(!should_retry_status(409, false));
        assert!(!should_retry_status(409, true));
        assert!(!should_retry_status(503, false));
        assert!(!should_retry_status(408, false));
    }

    #[test]
    fn unit_backoff_doubles_per_attempt_and_caps() {
        assert_eq!(next_backoff_ms(0), 200);
        assert_eq!(next_backoff_ms(2), 800);
        assert_eq!(next_backoff_ms(40), next_backoff_ms(6));
    }

    #[test]
    fn functional_jittered_backoff_stays_within_bounds() {
        let base = next_backoff_ms(3);
        for _ in 0..64 {
            let value = next_backoff_ms_with_jitter(3, true);
            assert!(value >= base / 2 && value <= base, "unexpected {value}");
        }
    }

    #[test]
    fn unit_default_policy_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay_ms(0, 0, None), None);
    }

    #[test]
    fn regression_policy_honors_retry_after_floor_and_budget() {
        let policy = RetryPolicy {
            max_retries: 2,
            retry_budget_ms: 0,
            retry_jitter: false,
        };
        assert_eq!(policy.next_delay_ms(0, 0, None), Some(200));
        assert_eq!(policy.next_delay_ms(0, 0, Some(1_500)), Some(1_500));
        assert_eq!(policy.next_delay_ms(2, 0, None), None);

        let budgeted = RetryPolicy {
            retry_budget_ms: 250,
            ..policy
        };
        assert_eq!(budgeted.next_delay_ms(0, 100, None), None);
    }

    #[test]
    fn unit_parse_retry_after_accepts_seconds_and_http_dates() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        assert_eq!(parse_retry_after_ms(&headers), Some(3_000));

        let raw = (Utc::now() + Duration::seconds(2))
            .to_rfc2822()
            .replace("+0000", "GMT");
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&raw).expect("retry-after date"),
        );
        let delay = parse_retry_after_ms(&headers).expect("delay from date");
        assert!(delay <= 2_500);

        headers.insert("retry-after", HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after_ms(&headers), None);
    }

    #[test]
    fn unit_request_ids_are_unique_and_prefixed() {
        let first = new_request_id();
        assert_ne!(first, new_request_id());
        assert!(first.starts_with("launch-"));
    }

    #[test]
    fn regression_truncate_for_error_preserves_char_boundaries() {
        assert_eq!(truncate_for_error("héllo", 2), "hé...");
        assert_eq!(truncate_for_error("ok", 10), "ok");
    }
}
