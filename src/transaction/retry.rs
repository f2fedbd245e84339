use std::time::Duration;

use crate::dataplane::{ApiError, ConflictKind};
use crate::settings::RetrySettings;

/// 기본 최대 시도 횟수
pub const MAX_ATTEMPTS: u32 = 10;

/// 기본 재시도 간격. 지수 백오프나 지터는 없다.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 재시도 간격
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, Duration::from_secs(settings.interval))
    }
}

/// 작업 단위 오류가 동시성 충돌인지 알려주는 특성
pub trait Retryable {
    fn conflict(&self) -> Option<ConflictKind>;
}

impl Retryable for ApiError {
    fn conflict(&self) -> Option<ConflictKind> {
        ApiError::conflict(self)
    }
}

/// 재시도 여부 결정
pub fn is_retryable<E: Retryable + ?Sized>(error: &E) -> bool {
    error.conflict().is_some()
}

/// 메시지 문자열만으로 재시도 여부를 판정합니다.
pub fn is_retryable_message(message: &str) -> bool {
    ConflictKind::classify(message).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = RetrySettings {
            max_attempts: 3,
            interval: 1,
        };

        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_default_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_message_classifier() {
        assert!(is_retryable_message("transaction 3b1d is outdated"));
        assert!(is_retryable_message(
            "validation error: [ALERT] parsing [/etc/haproxy/haproxy.cfg:12] : error detected in defaults section"
        ));
        assert!(!is_retryable_message("invalid certificate path"));
    }

    #[test]
    fn test_transport_errors_are_not_retryable() {
        let error = ApiError::Transport {
            method: "POST".to_string(),
            path: "/v3/services/haproxy/transactions".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(!is_retryable(&error));
    }
}
