use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;
use crate::resource::{Locator, ParentRef, ResourceKind};

/// 원격 API가 발급한 설정 트랜잭션
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// 트랜잭션이 열릴 때의 설정 버전
    #[serde(rename = "_version")]
    pub version: u64,
}

impl Transaction {
    pub fn new(id: impl Into<String>, version: u64) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }
}

/// Data Plane API 게이트웨이
///
/// 메서드는 HTTP 동사를 감싼 얇은 호출이며 재시도하지 않습니다.
/// 재시도 경계는 [`crate::transaction::TransactionCoordinator`] 하나뿐입니다.
#[async_trait]
pub trait DataPlaneClient: Send + Sync {
    /// 현재 설정 버전
    async fn configuration_version(&self) -> Result<u64, ApiError>;

    async fn begin_transaction(&self, version: u64) -> Result<Transaction, ApiError>;

    async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ApiError>;

    async fn rollback_transaction(&self, transaction_id: &str) -> Result<(), ApiError>;

    /// 부모 아래의 컬렉션을 원격 순서 그대로 조회합니다.
    async fn list(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: Option<&Transaction>,
    ) -> Result<Vec<Value>, ApiError>;

    async fn read(&self, locator: &Locator, transaction: Option<&Transaction>) -> Result<Value, ApiError>;

    /// 이름 기반 종류는 컬렉션에, 위치 기반 종류는 지정 위치에 삽입합니다.
    async fn create(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError>;

    async fn update(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError>;

    async fn delete(&self, locator: &Locator, transaction: &Transaction) -> Result<(), ApiError>;

    /// 컬렉션 전체를 주어진 목록으로 교체합니다.
    async fn replace_all(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: &Transaction,
        payloads: &[Value],
    ) -> Result<(), ApiError>;
}
