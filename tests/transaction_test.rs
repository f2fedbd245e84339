mod common;

use async_trait::async_trait;
use common::{FakeDataPlane, Op};
use haproxy_dataplane_provider::dataplane::{ApiError, ConflictKind, DataPlaneClient, Transaction};
use haproxy_dataplane_provider::resource::{Locator, ResourceKind};
use haproxy_dataplane_provider::transaction::{RetryPolicy, TransactionCoordinator, TransactionError, UnitOfWork};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

struct CreateBackend {
    name: &'static str,
}

#[async_trait]
impl UnitOfWork for CreateBackend {
    type Output = ();
    type Error = ApiError;

    fn name(&self) -> String {
        format!("create backend {}", self.name)
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<(), ApiError> {
        let locator = Locator::named(ResourceKind::Backend, None, self.name);
        client.create(&locator, transaction, &json!({ "name": self.name })).await
    }
}

/// 처음 `failures`번은 구조화된 충돌 코드로 실패합니다.
struct StructuredConflict {
    attempts: AtomicU32,
    failures: u32,
}

#[async_trait]
impl UnitOfWork for StructuredConflict {
    type Output = u32;
    type Error = ApiError;

    fn name(&self) -> String {
        "structured conflict".to_string()
    }

    async fn run(&self, _client: &dyn DataPlaneClient, _transaction: &Transaction) -> Result<u32, ApiError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            Err(ApiError::conflict_status(
                "PUT",
                "/v3/services/haproxy/configuration/backends/api",
                409,
                "conflict",
                ConflictKind::VersionMismatch,
            ))
        } else {
            Ok(attempt)
        }
    }
}

// 멈춘 시계에서 잠든 시간만큼만 흘렀는지 확인
fn assert_waited(started: Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(100),
        "elapsed {:?}, expected {:?}",
        elapsed,
        expected
    );
}

fn setup(max_attempts: u32) -> (Arc<FakeDataPlane>, TransactionCoordinator) {
    let fake = Arc::new(FakeDataPlane::new());
    let coordinator = TransactionCoordinator::new(fake.clone(), RetryPolicy::new(max_attempts, Duration::from_secs(2)));
    (fake, coordinator)
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_retryable_failures() {
    let (fake, coordinator) = setup(10);
    // 처음 두 트랜잭션은 열린 직후 다른 클라이언트의 커밋으로 낡은 트랜잭션이 된다
    fake.concurrent_commits(2);

    let started = Instant::now();
    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    assert!(result.is_ok(), "{:?}", result.err());
    assert_eq!(fake.count("begin"), 3);
    assert_eq!(fake.count("commit"), 3);
    assert_eq!(fake.names(ResourceKind::Backend, None), vec!["api"]);
    // 초기 1 + 동시 커밋 2 + 우리 커밋 1
    assert_eq!(fake.version(), 4);
    assert_waited(started, Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_failure_stops_after_one_attempt() {
    let (fake, coordinator) = setup(10);
    fake.fail(Op::Create, 400, "invalid certificate path", 1);

    let started = Instant::now();
    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    match result {
        Err(TransactionError::NonRetryable { attempts, source }) => {
            assert_eq!(attempts, 1);
            assert_eq!(source.status_code(), Some(400));
            assert!(source.to_string().contains("invalid certificate path"));
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert_eq!(fake.count("begin"), 1);
    assert_eq!(fake.count("rollback"), 1);
    assert_eq!(fake.count("commit"), 0);
    assert_eq!(fake.open_transactions(), 0);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(fake.names(ResourceKind::Backend, None).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_always_retryable_exhausts_budget() {
    let (fake, coordinator) = setup(3);
    fake.fail(Op::Create, 406, "transaction is outdated", 100);

    let started = Instant::now();
    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    let error = result.unwrap_err();
    assert!(error.is_exhausted());
    assert_eq!(error.attempts(), 3);
    assert_eq!(error.last_error().and_then(ApiError::conflict), Some(ConflictKind::TransactionOutdated));

    assert_eq!(fake.count("begin"), 3);
    assert_eq!(fake.count("rollback"), 3);
    assert_eq!(fake.count("commit"), 0);
    // 마지막 시도 뒤에는 기다리지 않는다
    assert_waited(started, Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_rollback_failure_does_not_mask_original_error() {
    let (fake, coordinator) = setup(10);
    fake.fail(Op::Create, 400, "bad payload", 1);
    fake.fail(Op::Rollback, 500, "rollback exploded", 1);

    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    let error = result.unwrap_err();
    assert_eq!(error.attempts(), 1);
    let message = error.to_string();
    assert!(message.contains("bad payload"), "{}", message);
    assert!(!message.contains("rollback exploded"), "{}", message);
}

#[tokio::test(start_paused = true)]
async fn test_structured_conflict_is_retried() {
    let (fake, coordinator) = setup(10);
    let work = StructuredConflict {
        attempts: AtomicU32::new(0),
        failures: 2,
    };

    let result = coordinator.run_in_transaction(&CancellationToken::new(), &work).await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(fake.count("begin"), 3);
    assert_eq!(fake.count("rollback"), 2);
    assert_eq!(fake.count("commit"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_not_retried() {
    let (fake, coordinator) = setup(10);
    fake.fail_transport(Op::Version);

    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    assert!(matches!(
        result,
        Err(TransactionError::NonRetryable {
            attempts: 1,
            source: ApiError::Transport { .. }
        })
    ));
    // 트랜잭션이 열리지 않았으니 롤백할 것도 없다
    assert_eq!(fake.count("begin"), 0);
    assert_eq!(fake.count("rollback"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_commit_conflict_rolls_back_and_retries() {
    let (fake, coordinator) = setup(10);
    fake.fail(Op::Commit, 409, "10: version mismatch", 1);

    let result = coordinator
        .run_in_transaction(&CancellationToken::new(), &CreateBackend { name: "api" })
        .await;

    assert!(result.is_ok());
    assert_eq!(fake.calls_starting_with("commit"), vec!["commit t1", "commit t2"]);
    assert_eq!(fake.calls_starting_with("rollback"), vec!["rollback t1"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_in_flight_call_without_rollback() {
    let (fake, coordinator) = setup(10);
    fake.stall(Op::Create);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let result = coordinator
        .run_in_transaction(&cancel, &CreateBackend { name: "api" })
        .await;

    assert!(matches!(result, Err(TransactionError::Cancelled { attempts: 1 })));
    assert_eq!(fake.count("rollback"), 0);
    // 버려진 트랜잭션은 원격에 남는다
    assert_eq!(fake.open_transactions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_delay_skips_remaining_attempts() {
    let (fake, coordinator) = setup(10);
    fake.fail(Op::Create, 406, "transaction t1 is outdated", 10);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let result = coordinator
        .run_in_transaction(&cancel, &CreateBackend { name: "api" })
        .await;

    assert!(matches!(result, Err(TransactionError::Cancelled { attempts: 1 })));
    assert_eq!(fake.count("begin"), 1);
}

#[tokio::test]
async fn test_already_cancelled_makes_no_calls() {
    let (fake, coordinator) = setup(10);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = coordinator
        .run_in_transaction(&cancel, &CreateBackend { name: "api" })
        .await;

    assert!(matches!(result, Err(TransactionError::Cancelled { attempts: 0 })));
    assert!(fake.calls().is_empty());
}
