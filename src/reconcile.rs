//! 순서가 있는 하위 컬렉션 맞추기
//!
//! ACL, 규칙, 체크처럼 부모 안의 위치로 식별되는 목록을 원하는 목록과
//! 같게 만듭니다. 전략은 종류마다 [`ResourceKind::reconcile_strategy`]가 정합니다.
//!
//! - [`ReconcileStrategy::ReplaceAll`]: 기존 항목을 뒤에서부터 모두 지우고
//!   원하는 목록을 한 번에 교체합니다.
//! - [`ReconcileStrategy::Diff`]: 내용 키로 양쪽을 맞춰 필요한 위치만 고칩니다.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

use crate::dataplane::{ApiError, ConflictKind, DataPlaneClient, Transaction};
use crate::provider::Attribute;
use crate::resource::{Locator, ParentRef, ResourceKind};
use crate::transaction::{Retryable, UnitOfWork};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStrategy {
    ReplaceAll,
    Diff,
}

/// 순서 있는 컬렉션의 한 항목
///
/// 모델과 원격 페이로드가 같은 모양이라 그대로 직렬화합니다.
pub trait OrderedChild: Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const KIND: ResourceKind;
    /// 컬렉션 리소스 타입 이름
    const TYPE_NAME: &'static str;

    /// 위치와 무관한 항목의 정체성. 주석 같은 부가 필드는 빠집니다.
    fn content_key(&self) -> String;

    fn item_schema() -> Vec<Attribute>;
}

/// 중복 키가 발견된 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSide {
    Desired,
    Existing,
}

impl fmt::Display for ListSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListSide::Desired => f.write_str("원하는 목록"),
            ListSide::Existing => f.write_str("원격 목록"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{kind} {side}에 같은 내용의 항목이 두 번 이상 있습니다: {key}")]
    DuplicateContentKey {
        kind: ResourceKind,
        side: ListSide,
        key: String,
    },
}

impl Retryable for ReconcileError {
    fn conflict(&self) -> Option<ConflictKind> {
        match self {
            ReconcileError::Api(e) => e.conflict(),
            ReconcileError::DuplicateContentKey { .. } => None,
        }
    }
}

/// 맞추기 중에 보낸 호출의 위치 목록 (호출 순서 그대로)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub deleted: Vec<usize>,
    pub updated: Vec<usize>,
    pub created: Vec<usize>,
    /// 일괄 교체로 보낸 항목 수
    pub replaced: Option<usize>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.updated.is_empty() && self.created.is_empty() && self.replaced.is_none()
    }
}

/// 부모 아래의 현재 목록을 원격 순서대로 읽습니다.
pub async fn list_children<T: OrderedChild>(
    client: &dyn DataPlaneClient,
    parent: &ParentRef,
    transaction: Option<&Transaction>,
) -> Result<Vec<T>, ApiError> {
    client
        .list(T::KIND, Some(parent), transaction)
        .await?
        .into_iter()
        .map(|value| crate::resource::from_wire(value, T::KIND.as_str()))
        .collect()
}

/// 부모 아래의 목록을 `desired`와 같게 만듭니다.
///
/// 호출하는 쪽이 연 트랜잭션 안에서만 동작하며, 재시도하지 않습니다.
pub async fn reconcile_children<T: OrderedChild>(
    client: &dyn DataPlaneClient,
    transaction: &Transaction,
    parent: &ParentRef,
    desired: &[T],
    strategy: ReconcileStrategy,
) -> Result<ReconcileReport, ReconcileError> {
    let existing = list_children::<T>(client, parent, Some(transaction)).await?;
    debug!(
        kind = %T::KIND,
        parent = %parent,
        existing = existing.len(),
        desired = desired.len(),
        ?strategy,
        "하위 목록 맞추기 시작"
    );

    let report = match strategy {
        ReconcileStrategy::ReplaceAll => replace_all(client, transaction, parent, existing.len(), desired).await?,
        ReconcileStrategy::Diff => diff(client, transaction, parent, &existing, desired).await?,
    };

    info!(
        kind = %T::KIND,
        parent = %parent,
        deleted = report.deleted.len(),
        updated = report.updated.len(),
        created = report.created.len(),
        "하위 목록 맞추기 완료"
    );
    Ok(report)
}

async fn replace_all<T: OrderedChild>(
    client: &dyn DataPlaneClient,
    transaction: &Transaction,
    parent: &ParentRef,
    existing: usize,
    desired: &[T],
) -> Result<ReconcileReport, ReconcileError> {
    let mut report = ReconcileReport::default();

    for index in (0..existing).rev() {
        client
            .delete(&Locator::indexed(T::KIND, parent.clone(), index), transaction)
            .await?;
        report.deleted.push(index);
    }

    if !desired.is_empty() {
        let payloads = desired
            .iter()
            .map(crate::resource::to_wire)
            .collect::<Result<Vec<_>, _>>()?;
        client.replace_all(T::KIND, Some(parent), transaction, &payloads).await?;
        report.replaced = Some(payloads.len());
    }

    Ok(report)
}

async fn diff<T: OrderedChild>(
    client: &dyn DataPlaneClient,
    transaction: &Transaction,
    parent: &ParentRef,
    existing: &[T],
    desired: &[T],
) -> Result<ReconcileReport, ReconcileError> {
    let desired_keys = unique_keys(desired)?;

    let mut existing_positions: HashMap<String, Vec<usize>> = HashMap::new();
    for (index, child) in existing.iter().enumerate() {
        existing_positions.entry(child.content_key()).or_default().push(index);
    }
    // 원하는 목록에 없는 중복은 어차피 모두 지워지므로 문제가 되지 않는다
    if let Some(key) = existing_positions
        .iter()
        .find(|(key, positions)| positions.len() > 1 && desired_keys.contains(*key))
        .map(|(key, _)| key.clone())
    {
        return Err(ReconcileError::DuplicateContentKey {
            kind: T::KIND,
            side: ListSide::Existing,
            key,
        });
    }

    let mut report = ReconcileReport::default();

    let keys: Vec<String> = existing.iter().map(T::content_key).collect();
    for index in (0..existing.len()).rev() {
        if !desired_keys.contains(&keys[index]) {
            client
                .delete(&Locator::indexed(T::KIND, parent.clone(), index), transaction)
                .await?;
            report.deleted.push(index);
        }
    }

    // 삭제 후 원격 목록의 모습. 아래 루프는 앞에서부터 이 목록을 desired로 바꿔 나간다.
    let mut current: Vec<T> = existing
        .iter()
        .zip(&keys)
        .filter(|(_, key)| desired_keys.contains(*key))
        .map(|(child, _)| child.clone())
        .collect();
    let kept: HashSet<String> = keys.iter().filter(|key| desired_keys.contains(*key)).cloned().collect();

    for (index, child) in desired.iter().enumerate() {
        let locator = Locator::indexed(T::KIND, parent.clone(), index);

        if kept.contains(&child.content_key()) {
            if current[index] != *child {
                client
                    .update(&locator, transaction, &crate::resource::to_wire(child)?)
                    .await?;
                current[index] = child.clone();
                report.updated.push(index);
            }
        } else {
            client
                .create(&locator, transaction, &crate::resource::to_wire(child)?)
                .await?;
            current.insert(index, child.clone());
            report.created.push(index);
        }
    }

    Ok(report)
}

fn unique_keys<T: OrderedChild>(children: &[T]) -> Result<HashSet<String>, ReconcileError> {
    let mut keys = HashSet::with_capacity(children.len());
    for child in children {
        let key = child.content_key();
        if !keys.insert(key.clone()) {
            return Err(ReconcileError::DuplicateContentKey {
                kind: T::KIND,
                side: ListSide::Desired,
                key,
            });
        }
    }
    Ok(keys)
}

/// 하나의 부모 아래 목록을 맞추는 트랜잭션 작업
pub struct ReconcileChildren<T> {
    pub parent: ParentRef,
    pub desired: Vec<T>,
    pub strategy: ReconcileStrategy,
}

impl<T: OrderedChild> ReconcileChildren<T> {
    /// 종류에 정해진 전략을 씁니다.
    pub fn new(parent: ParentRef, desired: Vec<T>) -> Self {
        Self {
            parent,
            desired,
            strategy: T::KIND.reconcile_strategy().unwrap_or(ReconcileStrategy::ReplaceAll),
        }
    }
}

#[async_trait]
impl<T: OrderedChild> UnitOfWork for ReconcileChildren<T> {
    type Output = ReconcileReport;
    type Error = ReconcileError;

    fn name(&self) -> String {
        format!("reconcile {} {}", self.parent, T::KIND)
    }

    async fn run(&self, client: &dyn DataPlaneClient, transaction: &Transaction) -> Result<ReconcileReport, ReconcileError> {
        reconcile_children(client, transaction, &self.parent, &self.desired, self.strategy).await
    }
}
