#![allow(dead_code)]

use async_trait::async_trait;
use haproxy_dataplane_provider::dataplane::{paths, ApiError, DataPlaneClient, Transaction};
use haproxy_dataplane_provider::resource::{Identity, Locator, ParentRef, ResourceId, ResourceKind};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

// 컬렉션 경로 -> 원격 순서대로 저장된 객체
type Store = BTreeMap<String, Vec<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Version,
    Begin,
    Commit,
    Rollback,
    List,
    Read,
    Create,
    Update,
    Delete,
    ReplaceAll,
}

enum Failure {
    Status { status: u16, message: String },
    Transport,
}

struct OpenTransaction {
    version: u64,
    store: Store,
}

#[derive(Default)]
struct State {
    version: u64,
    committed: Store,
    transactions: HashMap<String, OpenTransaction>,
    next_transaction: u64,
    calls: Vec<String>,
    failures: HashMap<Op, VecDeque<Failure>>,
    // 다음 N번의 트랜잭션이 열린 직후 다른 클라이언트가 커밋한 것처럼 버전을 올린다
    concurrent_commits: u32,
    stalled: Option<Op>,
}

/// 트랜잭션과 버전을 흉내 내는 메모리 기반 Data Plane API
pub struct FakeDataPlane {
    state: Mutex<State>,
}

impl FakeDataPlane {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                version: 1,
                ..Default::default()
            }),
        }
    }

    /// 커밋된 설정에 객체를 직접 넣습니다.
    pub fn seed(&self, kind: ResourceKind, parent: Option<&ParentRef>, object: Value) {
        let key = paths::collection(kind, parent).unwrap();
        self.state.lock().unwrap().committed.entry(key).or_default().push(object);
    }

    pub fn objects(&self, kind: ResourceKind, parent: Option<&ParentRef>) -> Vec<Value> {
        let key = paths::collection(kind, parent).unwrap();
        self.state.lock().unwrap().committed.get(&key).cloned().unwrap_or_default()
    }

    pub fn names(&self, kind: ResourceKind, parent: Option<&ParentRef>) -> Vec<String> {
        self.objects(kind, parent)
            .iter()
            .filter_map(|o| o["name"].as_str().map(str::to_string))
            .collect()
    }

    pub fn version(&self) -> u64 {
        self.state.lock().unwrap().version
    }

    /// 다른 클라이언트의 커밋
    pub fn bump_version(&self) {
        self.state.lock().unwrap().version += 1;
    }

    pub fn concurrent_commits(&self, times: u32) {
        self.state.lock().unwrap().concurrent_commits = times;
    }

    pub fn fail(&self, op: Op, status: u16, message: &str, times: usize) {
        let mut state = self.state.lock().unwrap();
        let queue = state.failures.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(Failure::Status {
                status,
                message: message.to_string(),
            });
        }
    }

    pub fn fail_transport(&self, op: Op) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(Failure::Transport);
    }

    /// 해당 호출이 영원히 끝나지 않게 합니다.
    pub fn stall(&self, op: Op) {
        self.state.lock().unwrap().stalled = Some(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls().into_iter().filter(|c| c.starts_with(prefix)).collect()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls_starting_with(prefix).len()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn open_transactions(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    /// 호출을 기록하고 주입된 실패를 꺼냅니다.
    async fn enter(&self, op: Op, call: String) -> Result<(), ApiError> {
        let stalled = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call.clone());
            if let Some(failure) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
                return Err(match failure {
                    Failure::Status { status, message } => ApiError::status("FAKE", call, status, message),
                    Failure::Transport => ApiError::Transport {
                        method: "FAKE".to_string(),
                        path: call,
                        message: "connection refused".to_string(),
                    },
                });
            }
            state.stalled == Some(op)
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn with_store<T>(
        &self,
        transaction: Option<&Transaction>,
        f: impl FnOnce(&mut Store) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut state = self.state.lock().unwrap();
        match transaction {
            Some(t) => match state.transactions.get_mut(&t.id) {
                Some(open) => f(&mut open.store),
                None => Err(ApiError::status(
                    "FAKE",
                    paths::transaction(&t.id),
                    404,
                    format!("transaction {} does not exist", t.id),
                )),
            },
            None => f(&mut state.committed),
        }
    }
}

fn not_found(what: impl std::fmt::Display) -> ApiError {
    ApiError::status("FAKE", what.to_string(), 404, format!("{} does not exist", what))
}

fn require_parent(store: &Store, parent: Option<&ParentRef>) -> Result<(), ApiError> {
    let Some(parent) = parent else {
        return Ok(());
    };
    let key = paths::collection(parent.kind.resource_kind(), None)?;
    let exists = store
        .get(&key)
        .is_some_and(|objects| objects.iter().any(|o| o["name"] == json!(parent.name)));
    if exists {
        Ok(())
    } else {
        Err(not_found(parent))
    }
}

fn position(objects: &[Value], id: &Option<ResourceId>) -> Option<usize> {
    match id {
        Some(ResourceId::Name(name)) => objects.iter().position(|o| o["name"] == json!(name)),
        Some(ResourceId::Index(index)) if *index < objects.len() => Some(*index),
        _ => None,
    }
}

#[async_trait]
impl DataPlaneClient for FakeDataPlane {
    async fn configuration_version(&self) -> Result<u64, ApiError> {
        self.enter(Op::Version, "version".to_string()).await?;
        Ok(self.state.lock().unwrap().version)
    }

    async fn begin_transaction(&self, version: u64) -> Result<Transaction, ApiError> {
        self.enter(Op::Begin, format!("begin {}", version)).await?;

        let mut state = self.state.lock().unwrap();
        if version != state.version {
            return Err(ApiError::status("FAKE", paths::transactions(), 409, "version mismatch"));
        }

        state.next_transaction += 1;
        let id = format!("t{}", state.next_transaction);
        let store = state.committed.clone();
        state.transactions.insert(id.clone(), OpenTransaction { version, store });

        if state.concurrent_commits > 0 {
            state.concurrent_commits -= 1;
            state.version += 1;
        }
        Ok(Transaction::new(id, version))
    }

    async fn commit_transaction(&self, transaction_id: &str) -> Result<(), ApiError> {
        self.enter(Op::Commit, format!("commit {}", transaction_id)).await?;

        let mut state = self.state.lock().unwrap();
        let Some(open) = state.transactions.remove(transaction_id) else {
            return Err(not_found(format!("transaction {}", transaction_id)));
        };
        if open.version != state.version {
            return Err(ApiError::status(
                "FAKE",
                paths::transaction(transaction_id),
                406,
                format!("transaction {} is outdated and cannot be committed", transaction_id),
            ));
        }

        state.committed = open.store;
        state.version += 1;
        Ok(())
    }

    async fn rollback_transaction(&self, transaction_id: &str) -> Result<(), ApiError> {
        self.enter(Op::Rollback, format!("rollback {}", transaction_id)).await?;

        match self.state.lock().unwrap().transactions.remove(transaction_id) {
            Some(_) => Ok(()),
            None => Err(not_found(format!("transaction {}", transaction_id))),
        }
    }

    async fn list(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: Option<&Transaction>,
    ) -> Result<Vec<Value>, ApiError> {
        let key = paths::collection(kind, parent)?;
        self.enter(Op::List, format!("list {}", key)).await?;

        self.with_store(transaction, |store| {
            require_parent(store, parent)?;
            Ok(store.get(&key).cloned().unwrap_or_default())
        })
    }

    async fn read(&self, locator: &Locator, transaction: Option<&Transaction>) -> Result<Value, ApiError> {
        let key = paths::collection(locator.kind, locator.parent.as_ref())?;
        self.enter(Op::Read, format!("read {}", locator)).await?;

        self.with_store(transaction, |store| {
            require_parent(store, locator.parent.as_ref())?;
            let objects = store.get(&key).cloned().unwrap_or_default();
            if locator.kind.identity() == Identity::Singleton {
                return Ok(objects.into_iter().next().unwrap_or_else(|| json!({})));
            }
            position(&objects, &locator.id)
                .map(|i| objects[i].clone())
                .ok_or_else(|| not_found(locator))
        })
    }

    async fn create(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError> {
        let key = paths::collection(locator.kind, locator.parent.as_ref())?;
        self.enter(Op::Create, format!("create {}", locator)).await?;

        self.with_store(Some(transaction), |store| {
            require_parent(store, locator.parent.as_ref())?;
            let objects = store.entry(key).or_default();
            match (locator.kind.identity(), &locator.id) {
                (Identity::Singleton, _) => *objects = vec![payload.clone()],
                (Identity::Indexed, Some(ResourceId::Index(index))) => {
                    if *index > objects.len() {
                        return Err(ApiError::status("FAKE", locator.to_string(), 400, "index out of range"));
                    }
                    objects.insert(*index, payload.clone());
                }
                _ => {
                    if position(objects, &locator.id).is_some() {
                        return Err(ApiError::status("FAKE", locator.to_string(), 409, "object already exists"));
                    }
                    objects.push(payload.clone());
                }
            }
            Ok(())
        })
    }

    async fn update(&self, locator: &Locator, transaction: &Transaction, payload: &Value) -> Result<(), ApiError> {
        let key = paths::collection(locator.kind, locator.parent.as_ref())?;
        self.enter(Op::Update, format!("update {}", locator)).await?;

        self.with_store(Some(transaction), |store| {
            require_parent(store, locator.parent.as_ref())?;
            let objects = store.entry(key).or_default();
            if locator.kind.identity() == Identity::Singleton {
                *objects = vec![payload.clone()];
                return Ok(());
            }
            let index = position(objects, &locator.id).ok_or_else(|| not_found(locator))?;
            objects[index] = payload.clone();
            Ok(())
        })
    }

    async fn delete(&self, locator: &Locator, transaction: &Transaction) -> Result<(), ApiError> {
        let key = paths::collection(locator.kind, locator.parent.as_ref())?;
        let item = paths::item(locator)?;
        self.enter(Op::Delete, format!("delete {}", locator)).await?;

        self.with_store(Some(transaction), |store| {
            require_parent(store, locator.parent.as_ref())?;
            let objects = store.entry(key).or_default();
            let index = position(objects, &locator.id).ok_or_else(|| not_found(locator))?;
            objects.remove(index);

            // 섹션을 지우면 그 아래 하위 객체도 함께 사라진다
            let children = format!("{}/", item);
            store.retain(|path, _| !path.starts_with(&children));
            Ok(())
        })
    }

    async fn replace_all(
        &self,
        kind: ResourceKind,
        parent: Option<&ParentRef>,
        transaction: &Transaction,
        payloads: &[Value],
    ) -> Result<(), ApiError> {
        let key = paths::collection(kind, parent)?;
        self.enter(Op::ReplaceAll, format!("replace_all {} ({})", key, payloads.len()))
            .await?;

        self.with_store(Some(transaction), |store| {
            require_parent(store, parent)?;
            store.insert(key, payloads.to_vec());
            Ok(())
        })
    }
}
