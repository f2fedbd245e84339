use std::time::Duration;

use crate::resource::ResourceKind;

/// 재시도로 흡수할 수 있는 동시성 충돌의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// 트랜잭션이 열린 뒤 설정 버전이 바뀜
    TransactionOutdated,
    /// 다른 커밋으로 트랜잭션이 무효화됨
    TransactionMissing,
    /// 요청한 버전이 원격 상태와 다름
    VersionMismatch,
    /// 부하 상황에서 원격 API가 돌려주는 잘못된 요청 응답
    VersionNotSpecified,
    /// 공유 defaults 섹션을 동시에 고칠 때 나타나는 일시적 검증 오류
    DefaultsValidation,
}

impl ConflictKind {
    /// 메시지 문자열만 있는 응답을 충돌 종류로 분류합니다.
    ///
    /// 대소문자를 구분하는 부분 문자열 비교이며, 이 함수 외에는 메시지를
    /// 해석하는 곳이 없습니다.
    pub fn classify(message: &str) -> Option<ConflictKind> {
        if message.contains("transaction") && message.contains("outdated") {
            Some(ConflictKind::TransactionOutdated)
        } else if message.contains("transaction") && message.contains("does not exist") {
            Some(ConflictKind::TransactionMissing)
        } else if message.contains("version mismatch") {
            Some(ConflictKind::VersionMismatch)
        } else if message.contains("version or transaction") && message.contains("not specified") {
            Some(ConflictKind::VersionNotSpecified)
        } else if message.contains("validation error") && message.contains("defaults section") {
            Some(ConflictKind::DefaultsValidation)
        } else {
            None
        }
    }
}

/// REST 게이트웨이 오류
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Data Plane API 연결 실패 ({method} {path}): {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },

    #[error("Data Plane API 요청 시간 초과 ({method} {path}, {timeout:?})")]
    Timeout {
        method: String,
        path: String,
        timeout: Duration,
    },

    #[error("Data Plane API 응답 오류 {status} ({method} {path}): {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
        conflict: Option<ConflictKind>,
    },

    #[error("응답 디코딩 실패 ({context}): {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("요청 페이로드 인코딩 실패: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} 리소스는 부모 {parent}에 연결할 수 없습니다")]
    InvalidParent { kind: ResourceKind, parent: String },

    #[error("{kind} 리소스의 식별자가 올바르지 않습니다: {locator}")]
    InvalidLocator { kind: ResourceKind, locator: String },

    #[error("유효하지 않은 이름: {name:?}")]
    InvalidName { name: String },

    #[error("잘못된 Data Plane API 주소 {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    /// 메시지로부터 충돌 종류를 판정해 상태 오류를 만듭니다.
    pub fn status(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        ApiError::Status {
            method: method.into(),
            path: path.into(),
            status,
            conflict: ConflictKind::classify(&message),
            message,
        }
    }

    /// 원격 API가 구조화된 충돌 코드를 준 경우
    pub fn conflict_status(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
        conflict: ConflictKind,
    ) -> Self {
        ApiError::Status {
            method: method.into(),
            path: path.into(),
            status,
            message: message.into(),
            conflict: Some(conflict),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn conflict(&self) -> Option<ConflictKind> {
        match self {
            ApiError::Status { conflict, .. } => *conflict,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_retryable_messages() {
        let cases = [
            ("transaction 9f2c is outdated", ConflictKind::TransactionOutdated),
            ("transaction outdated", ConflictKind::TransactionOutdated),
            ("transaction 12 does not exist", ConflictKind::TransactionMissing),
            ("10: version mismatch", ConflictKind::VersionMismatch),
            ("version or transaction not specified", ConflictKind::VersionNotSpecified),
            (
                "validation error: config error in defaults section 'unnamed_defaults_1'",
                ConflictKind::DefaultsValidation,
            ),
        ];

        for (message, expected) in cases {
            assert_eq!(ConflictKind::classify(message), Some(expected), "{}", message);
        }
    }

    #[test]
    fn test_classify_non_retryable_messages() {
        for message in [
            "invalid certificate path",
            "backend web does not exist",
            "validation error: unknown keyword 'balanc'",
            "Transaction Outdated",
            "object already exists",
        ] {
            assert_eq!(ConflictKind::classify(message), None, "{}", message);
        }
    }

    #[test]
    fn test_status_error_carries_conflict() {
        let error = ApiError::status("PUT", "/v3/services/haproxy/transactions/abc", 406, "transaction abc is outdated");
        assert_eq!(error.conflict(), Some(ConflictKind::TransactionOutdated));
        assert_eq!(error.status_code(), Some(406));

        let missing = ApiError::status("GET", "/x", 404, "object does not exist");
        assert!(missing.is_not_found());
        assert_eq!(missing.conflict(), None);
    }
}
