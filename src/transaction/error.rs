/// 트랜잭션 적용 실패
///
/// `E`는 작업 단위의 오류 타입입니다. 트랜잭션 열기와 커밋 실패도 같은 타입으로
/// 변환되어 전달됩니다.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E: std::error::Error + 'static> {
    #[error("재시도할 수 없는 오류로 트랜잭션 실패 ({attempts}회 시도): {source}")]
    NonRetryable {
        attempts: u32,
        #[source]
        source: E,
    },

    #[error("트랜잭션 재시도 한도 초과 ({attempts}회 시도): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    #[error("트랜잭션 적용이 취소됨 ({attempts}회 시도)")]
    Cancelled { attempts: u32 },
}

impl<E: std::error::Error + 'static> TransactionError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::NonRetryable { attempts, .. }
            | Self::RetriesExhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    /// 마지막 시도를 실패시킨 오류
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::NonRetryable { source, .. } | Self::RetriesExhausted { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
