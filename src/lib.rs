//! HAProxy Data Plane API를 선언형 인프라 리소스로 다루는 프로바이더 계층입니다.
//!
//! # 주요 기능
//!
//! - 버전이 있는 설정 트랜잭션 열기, 커밋, 롤백과 충돌 시 재시도
//! - backend, server, frontend 묶음을 한 트랜잭션에서 의존 순서대로 생성
//! - ACL, 규칙, 헬스 체크처럼 순서가 있는 하위 목록 맞추기
//! - 프레임워크 모델과 Data Plane API 페이로드 사이의 변환
//!
//! # 재시도 판정
//!
//! ```
//! use haproxy_dataplane_provider::dataplane::ConflictKind;
//! use haproxy_dataplane_provider::transaction::is_retryable_message;
//!
//! assert_eq!(
//!     ConflictKind::classify("transaction 5f3a is outdated"),
//!     Some(ConflictKind::TransactionOutdated)
//! );
//! assert!(!is_retryable_message("backend web does not exist"));
//! ```
//!
//! # 리소스 묶음 적용
//!
//! ```no_run
//! use haproxy_dataplane_provider::bundle::{BundleApply, ResourceBundle, StackModel};
//! use haproxy_dataplane_provider::dataplane::HttpDataPlaneClient;
//! use haproxy_dataplane_provider::settings::Settings;
//! use haproxy_dataplane_provider::transaction::{RetryPolicy, TransactionCoordinator};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(stack: StackModel) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load().await?;
//! let client = HttpDataPlaneClient::new(&settings.dataplane)?;
//! let coordinator = TransactionCoordinator::new(Arc::new(client), RetryPolicy::from(&settings.retry));
//!
//! let work = BundleApply { bundle: ResourceBundle::from(&stack) };
//! coordinator.run_in_transaction(&CancellationToken::new(), &work).await?;
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod dataplane;
pub mod logging;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod settings;
pub mod transaction;
