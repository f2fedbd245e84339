use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::retry::{is_retryable, RetryPolicy, Retryable};
use super::TransactionError;
use crate::dataplane::{ApiError, DataPlaneClient, Transaction};

/// 하나의 트랜잭션 안에서 실행되는 변경 작업
///
/// 시도마다 새 트랜잭션으로 처음부터 다시 호출되므로, 이전 시도의 결과에
/// 의존하면 안 됩니다.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Output: Send;
    type Error: std::error::Error + Retryable + From<ApiError> + Send + Sync + 'static;

    /// 로그에 남길 작업 이름
    fn name(&self) -> String;

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<Self::Output, Self::Error>;
}

/// 트랜잭션 열기, 작업 실행, 커밋을 묶고 충돌 시 전체를 재시도합니다.
///
/// 아래 계층은 재시도하지 않습니다. 재시도 경계는 이 타입 하나뿐입니다.
#[derive(Clone)]
pub struct TransactionCoordinator {
    client: Arc<dyn DataPlaneClient>,
    policy: RetryPolicy,
}

impl TransactionCoordinator {
    pub fn new(client: Arc<dyn DataPlaneClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &Arc<dyn DataPlaneClient> {
        &self.client
    }

    /// 작업 단위를 전부 적용하거나 전혀 적용하지 않습니다.
    ///
    /// 취소되면 진행 중인 HTTP 호출을 버리고 더 이상 재시도하지 않습니다.
    /// 이때 열려 있던 트랜잭션은 롤백하지 않습니다.
    #[instrument(skip_all, fields(work = %work.name()))]
    pub async fn run_in_transaction<W: UnitOfWork>(
        &self,
        cancel: &CancellationToken,
        work: &W,
    ) -> Result<W::Output, TransactionError<W::Error>> {
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TransactionError::Cancelled { attempts });
            }
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempt = attempts, "트랜잭션 진행 중 취소됨");
                    return Err(TransactionError::Cancelled { attempts });
                }
                outcome = self.attempt(work) => outcome,
            };

            let error = match outcome {
                Ok(output) => {
                    info!(attempt = attempts, "트랜잭션 커밋 완료");
                    return Ok(output);
                }
                Err(error) => error,
            };

            if !is_retryable(&error) {
                warn!(error = %error, attempt = attempts, "재시도할 수 없는 오류");
                return Err(TransactionError::NonRetryable {
                    attempts,
                    source: error,
                });
            }

            if attempts >= self.policy.max_attempts {
                warn!(
                    error = %error,
                    attempt = attempts,
                    max_attempts = self.policy.max_attempts,
                    "재시도 한도 초과"
                );
                return Err(TransactionError::RetriesExhausted {
                    attempts,
                    source: error,
                });
            }

            warn!(
                error = %error,
                attempt = attempts,
                max_attempts = self.policy.max_attempts,
                "트랜잭션 충돌, 재시도 예정"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(TransactionError::Cancelled { attempts });
                }
                _ = sleep(self.policy.interval) => {}
            }
        }
    }

    /// 한 번의 시도: 열기, 실행, 커밋. 실패하면 열린 트랜잭션을 롤백합니다.
    async fn attempt<W: UnitOfWork>(&self, work: &W) -> Result<W::Output, W::Error> {
        let version = self.client.configuration_version().await?;
        let transaction = self.client.begin_transaction(version).await?;
        debug!(transaction_id = %transaction.id, version, "트랜잭션 시작");

        let error = match work.run(self.client.as_ref(), &transaction).await {
            Ok(output) => match self.client.commit_transaction(&transaction.id).await {
                Ok(()) => return Ok(output),
                Err(e) => W::Error::from(e),
            },
            Err(e) => e,
        };

        self.rollback(&transaction).await;
        Err(error)
    }

    // 롤백 실패는 원래 오류를 가리지 않는다
    async fn rollback(&self, transaction: &Transaction) {
        match self.client.rollback_transaction(&transaction.id).await {
            Ok(()) => debug!(transaction_id = %transaction.id, "트랜잭션 롤백 완료"),
            Err(e) => warn!(
                transaction_id = %transaction.id,
                error = %e,
                "트랜잭션 롤백 실패"
            ),
        }
    }
}
