use std::error::Error as StdError;

use crate::dataplane::ApiError;
use crate::transaction::TransactionError;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("알 수 없는 리소스 타입: {0}")]
    UnknownResourceType(String),

    #[error("{type_name} 설정을 해석할 수 없습니다: {source}")]
    InvalidSnapshot {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{type_name} 가져오기 식별자가 올바르지 않습니다: {reason}")]
    InvalidImportId { type_name: String, reason: String },

    #[error("{type_name} 적용 실패: {source}")]
    Apply {
        type_name: String,
        attempts: u32,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{type_name} 작업이 취소되었습니다")]
    Cancelled { type_name: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProviderError {
    pub(crate) fn transaction<E>(type_name: &str, error: TransactionError<E>) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        match error {
            TransactionError::Cancelled { .. } => ProviderError::Cancelled {
                type_name: type_name.to_string(),
            },
            other => ProviderError::Apply {
                type_name: type_name.to_string(),
                attempts: other.attempts(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn snapshot(type_name: &str, source: serde_json::Error) -> Self {
        ProviderError::InvalidSnapshot {
            type_name: type_name.to_string(),
            source,
        }
    }

    /// 트랜잭션에 들어간 횟수. 트랜잭션 밖에서 실패했으면 `None`.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            ProviderError::Apply { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
