use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::mutation::ResourceMutation;
use super::{ProviderError, ResourceSchema};
use crate::dataplane::{paths, ApiError, DataPlaneClient};
use crate::resource::{from_wire, to_wire, Identity, Locator, RemoteResource};
use crate::transaction::{TransactionCoordinator, TransactionError, UnitOfWork};

/// 핸들러 호출 하나가 쓰는 조정자와 취소 토큰
pub struct Context<'a> {
    pub coordinator: &'a TransactionCoordinator,
    pub cancel: &'a CancellationToken,
}

impl<'a> Context<'a> {
    pub fn new(coordinator: &'a TransactionCoordinator, cancel: &'a CancellationToken) -> Self {
        Self { coordinator, cancel }
    }

    pub fn client(&self) -> &dyn DataPlaneClient {
        self.coordinator.client().as_ref()
    }

    pub async fn run<W: UnitOfWork>(&self, work: &W) -> Result<W::Output, TransactionError<W::Error>> {
        self.coordinator.run_in_transaction(self.cancel, work).await
    }

    /// 트랜잭션 밖의 요청을 취소 신호와 경주시킵니다. 취소되면 진행 중인 요청은 버립니다.
    pub async fn request<T>(
        &self,
        type_name: &str,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ProviderError> {
        Ok(self.race(type_name, request).await??)
    }

    /// `request`와 같지만 404는 `None`으로 돌려줍니다.
    pub async fn lookup<T>(
        &self,
        type_name: &str,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<Option<T>, ProviderError> {
        Ok(found(self.race(type_name, request).await?)?)
    }

    async fn race<T>(
        &self,
        type_name: &str,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<Result<T, ApiError>, ProviderError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(resource_type = type_name, "원격 조회 중 취소됨");
                Err(ProviderError::Cancelled {
                    type_name: type_name.to_string(),
                })
            }
            result = request => Ok(result),
        }
    }
}

/// 호스트 프레임워크가 리소스 타입마다 부르는 수명 주기 함수
///
/// 스냅샷은 모두 JSON 값이며 `read`와 `import`가 `None`을 돌려주면
/// 원격에 객체가 없다는 뜻입니다.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    async fn create(&self, ctx: &Context<'_>, plan: Value) -> Result<Value, ProviderError>;

    async fn read(&self, ctx: &Context<'_>, state: Value) -> Result<Option<Value>, ProviderError>;

    async fn update(&self, ctx: &Context<'_>, prior: Value, plan: Value) -> Result<Value, ProviderError>;

    async fn delete(&self, ctx: &Context<'_>, state: Value) -> Result<(), ProviderError>;

    async fn import(&self, ctx: &Context<'_>, id: &str) -> Result<Option<Value>, ProviderError>;
}

pub(crate) fn decode<T: DeserializeOwned>(type_name: &str, snapshot: Value) -> Result<T, ProviderError> {
    serde_json::from_value(snapshot).map_err(|e| ProviderError::snapshot(type_name, e))
}

pub(crate) fn encode<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(to_wire(model)?)
}

/// 404는 객체 없음으로 바꿉니다.
fn found<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// 트랜잭션 밖에서 원격 객체를 읽어 프레임워크 모델로 바꿉니다.
pub(crate) async fn fetch_model<R: RemoteResource>(
    ctx: &Context<'_>,
    locator: &Locator,
) -> Result<Option<R::Model>, ProviderError> {
    let Some(value) = ctx.lookup(R::TYPE_NAME, ctx.client().read(locator, None)).await? else {
        return Ok(None);
    };
    let payload: R::Payload = from_wire(value, R::TYPE_NAME)?;
    Ok(Some(R::from_payload(payload, locator.parent.as_ref())))
}

/// 이름 또는 싱글턴으로 식별되는 리소스의 공통 핸들러
pub struct NamedResourceHandler<R>(PhantomData<R>);

impl<R: RemoteResource> NamedResourceHandler<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    async fn fetch(&self, ctx: &Context<'_>, locator: &Locator) -> Result<Option<R::Model>, ProviderError> {
        fetch_model::<R>(ctx, locator).await
    }

    /// 변경 후 원격 상태를 다시 읽어 상태로 씁니다. 읽을 수 없으면 계획을 그대로 씁니다.
    async fn refreshed(&self, ctx: &Context<'_>, locator: &Locator, planned: &R::Model) -> Result<Value, ProviderError> {
        match self.fetch(ctx, locator).await? {
            Some(model) => encode(&model),
            None => encode(planned),
        }
    }

    fn prepare(&self, plan: Value) -> Result<(R::Model, Locator, Value), ProviderError> {
        let model: R::Model = decode(R::TYPE_NAME, plan)?;
        let locator = R::locator(&model);
        paths::check(&locator)?;
        let payload = to_wire(&R::to_payload(&model))?;
        Ok((model, locator, payload))
    }
}

impl<R: RemoteResource> Default for NamedResourceHandler<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: RemoteResource> ResourceHandler for NamedResourceHandler<R> {
    fn type_name(&self) -> &'static str {
        R::TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        R::schema()
    }

    async fn create(&self, ctx: &Context<'_>, plan: Value) -> Result<Value, ProviderError> {
        let (model, locator, payload) = self.prepare(plan)?;

        ctx.run(&ResourceMutation::create(locator.clone(), payload))
            .await
            .map_err(|e| ProviderError::transaction(R::TYPE_NAME, e))?;
        info!(resource = %locator, "리소스 생성");

        self.refreshed(ctx, &locator, &model).await
    }

    async fn read(&self, ctx: &Context<'_>, state: Value) -> Result<Option<Value>, ProviderError> {
        let model: R::Model = decode(R::TYPE_NAME, state)?;
        let locator = R::locator(&model);
        paths::check(&locator)?;

        match self.fetch(ctx, &locator).await? {
            Some(model) => Ok(Some(encode(&model)?)),
            None => {
                warn!(resource = %locator, "원격에서 사라진 리소스를 상태에서 제거");
                Ok(None)
            }
        }
    }

    async fn update(&self, ctx: &Context<'_>, _prior: Value, plan: Value) -> Result<Value, ProviderError> {
        let (model, locator, payload) = self.prepare(plan)?;

        ctx.run(&ResourceMutation::update(locator.clone(), payload))
            .await
            .map_err(|e| ProviderError::transaction(R::TYPE_NAME, e))?;
        info!(resource = %locator, "리소스 갱신");

        self.refreshed(ctx, &locator, &model).await
    }

    async fn delete(&self, ctx: &Context<'_>, state: Value) -> Result<(), ProviderError> {
        let model: R::Model = decode(R::TYPE_NAME, state)?;
        let locator = R::locator(&model);

        // 전역 섹션은 지울 수 없으므로 상태에서만 뺀다
        if R::KIND.identity() == Identity::Singleton {
            warn!(resource = %locator, "싱글턴 리소스는 원격에 그대로 남습니다");
            return Ok(());
        }
        paths::check(&locator)?;

        match ctx.run(&ResourceMutation::delete(locator.clone())).await {
            Ok(()) => {
                info!(resource = %locator, "리소스 삭제");
                Ok(())
            }
            Err(e) if e.last_error().is_some_and(ApiError::is_not_found) => {
                warn!(resource = %locator, "이미 삭제된 리소스");
                Ok(())
            }
            Err(e) => Err(ProviderError::transaction(R::TYPE_NAME, e)),
        }
    }

    async fn import(&self, ctx: &Context<'_>, id: &str) -> Result<Option<Value>, ProviderError> {
        let locator = R::import_locator(id).map_err(|reason| ProviderError::InvalidImportId {
            type_name: R::TYPE_NAME.to_string(),
            reason,
        })?;
        paths::check(&locator)?;

        match self.fetch(ctx, &locator).await? {
            Some(model) => Ok(Some(encode(&model)?)),
            None => Ok(None),
        }
    }
}
